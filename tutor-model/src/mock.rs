//! Mock language model for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{ModelError, Result};
use crate::llm::{GenerateRequest, Llm, TokenStream};

/// A scriptable [`Llm`] for tests.
///
/// By default it returns a canned reply. It can also echo the submitted
/// prompt back (useful for asserting on prompt contents), fail outright,
/// or fail partway through a streamed generation.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_model::{GenerateRequest, Llm, MockLlm};
///
/// let llm = MockLlm::new("the answer");
/// let reply = llm.generate(&GenerateRequest::new("question")).await?;
/// assert_eq!(reply, "the answer");
/// ```
pub struct MockLlm {
    reply: String,
    echo: bool,
    fail: bool,
    fail_stream_after: Option<usize>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Create a mock that always returns `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            echo: false,
            fail: false,
            fail_stream_after: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that echoes the submitted prompt back as its answer.
    pub fn echo() -> Self {
        let mut mock = Self::new("");
        mock.echo = true;
        mock
    }

    /// Make every call fail with a backend error.
    pub fn failing() -> Self {
        let mut mock = Self::new("");
        mock.fail = true;
        mock
    }

    /// Make streamed generations fail after yielding `tokens` tokens.
    pub fn with_stream_failure_after(mut self, tokens: usize) -> Self {
        self.fail_stream_after = Some(tokens);
        self
    }

    /// The prompts submitted to this mock so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }

    fn record(&self, request: &GenerateRequest) {
        self.prompts.lock().expect("prompt log poisoned").push(request.prompt.clone());
    }

    fn reply_for(&self, request: &GenerateRequest) -> String {
        if self.echo { request.prompt.clone() } else { self.reply.clone() }
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.record(request);
        if self.fail {
            return Err(ModelError::Backend {
                provider: "mock".into(),
                message: "scripted failure".into(),
            });
        }
        Ok(self.reply_for(request))
    }

    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TokenStream> {
        self.record(request);
        if self.fail {
            return Err(ModelError::Backend {
                provider: "mock".into(),
                message: "scripted failure".into(),
            });
        }

        let reply = self.reply_for(request);
        let mut items: Vec<Result<String>> = reply
            .split_inclusive(' ')
            .map(|token| Ok(token.to_string()))
            .collect();

        if let Some(after) = self.fail_stream_after {
            items.truncate(after);
            items.push(Err(ModelError::Stream("scripted mid-stream failure".into())));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_reply_and_prompt_log() {
        let llm = MockLlm::new("hello");
        let reply = llm.generate(&GenerateRequest::new("question one")).await.unwrap();
        assert_eq!(reply, "hello");
        assert_eq!(llm.prompts(), vec!["question one".to_string()]);
    }

    #[tokio::test]
    async fn stream_yields_tokens_in_order() {
        let llm = MockLlm::new("one two three");
        let mut stream = llm.generate_stream(&GenerateRequest::new("q")).await.unwrap();

        let mut collected = String::new();
        while let Some(token) = stream.next().await {
            collected.push_str(&token.unwrap());
        }
        assert_eq!(collected, "one two three");
    }

    #[tokio::test]
    async fn stream_failure_surfaces_as_err_item() {
        let llm = MockLlm::new("one two three").with_stream_failure_after(1);
        let mut stream = llm.generate_stream(&GenerateRequest::new("q")).await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "one ");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
