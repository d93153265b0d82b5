//! Answer service: prompt construction, generation, and source
//! attribution.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use tutor_model::{GenerateRequest, Llm};

use crate::config::RagConfig;
use crate::document::{QueryResponse, SearchResult, SourceAttribution};
use crate::error::Result;
use crate::retrieval::{RetrievalOutcome, RetrievalService, source_file};
use crate::session::Session;
use crate::vectorstore::MetadataFilter;

/// The fixed answer returned when retrieval finds nothing relevant. The
/// model is never invoked without grounding context.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information in the indexed study \
     materials. Try rephrasing your question or adding more documents.";

/// Inline token appended when a streamed generation fails partway; the
/// stream ends afterwards instead of raising past delivered output.
pub const STREAM_ERROR_TOKEN: &str = "\n[answer interrupted: generation failed]";

/// Character budget for source previews.
const PREVIEW_BUDGET: usize = 200;

const SYSTEM_PROMPT: &str = "You are an AI study tutor helping students understand their course \
     material.\n\
     \n\
     Your task:\n\
     1. Carefully analyze the provided context from the study materials\n\
     2. Give clear, structured, understandable answers\n\
     3. Use only information from the provided context\n\
     4. If the context does not contain the answer, say so honestly\n\
     5. Give examples and explanations to aid understanding\n\
     \n\
     Rules:\n\
     - Always ground the answer in the provided context\n\
     - Be precise and specific\n\
     - Use plain, simple language\n\
     - Structure the answer for readability";

/// Per-query options: an optional `top_k` override and an optional
/// metadata filter narrowing retrieval.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Override the configured number of search candidates.
    pub top_k: Option<usize>,
    /// Restrict retrieval to fragments matching this filter.
    pub filter: Option<MetadataFilter>,
}

impl QueryOptions {
    /// Derive options from an explicit session: the session's topic, if
    /// set, narrows retrieval to matching material.
    pub fn for_session(session: &Session) -> Self {
        Self { top_k: None, filter: session.filter() }
    }
}

/// A streamed answer: attribution is known up front, the text arrives
/// incrementally.
pub struct StreamingAnswer {
    /// Attributed sources in final rank order.
    pub sources: Vec<SourceAttribution>,
    /// Mean similarity of the sources used.
    pub confidence: f32,
    /// Text increments in generation order. Dropping the stream cancels
    /// the generation.
    pub stream: Pin<Box<dyn Stream<Item = String> + Send>>,
}

/// Builds prompts from retrieved context, invokes the language model, and
/// packages answers with per-source attribution and a confidence score.
pub struct AnswerService {
    retrieval: RetrievalService,
    llm: Arc<dyn Llm>,
    config: RagConfig,
}

impl AnswerService {
    /// Create a new answer service on top of a retrieval service.
    pub fn new(retrieval: RetrievalService, llm: Arc<dyn Llm>) -> Self {
        let config = retrieval.config().clone();
        Self { retrieval, llm, config }
    }

    /// The underlying retrieval service.
    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    /// Answer a query: retrieve context, generate, attribute sources.
    ///
    /// When retrieval finds nothing relevant the fixed
    /// [`NO_CONTEXT_ANSWER`] is returned with no sources and confidence
    /// `0.0`; the model is never called without grounding.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Llm`](crate::RagError::Llm) when the model
    /// backend fails; callers translate it via
    /// [`RagError::user_message`](crate::RagError::user_message) instead
    /// of exposing it.
    pub async fn answer(&self, query: &str, options: &QueryOptions) -> Result<QueryResponse> {
        let outcome =
            self.retrieval.retrieve(query, options.top_k, options.filter.as_ref()).await?;

        let retrieved = match outcome {
            RetrievalOutcome::NoRelevantContext => {
                return Ok(QueryResponse {
                    answer: NO_CONTEXT_ANSWER.to_string(),
                    sources: Vec::new(),
                    confidence: 0.0,
                });
            }
            RetrievalOutcome::Found(retrieved) => retrieved,
        };

        let request = self.generate_request(query, &retrieved.context);
        let answer = self.llm.generate(&request).await.inspect_err(|e| {
            error!(error = %e, "answer generation failed");
        })?;

        let (sources, confidence) = attribute_sources(&retrieved.results);
        info!(source_count = sources.len(), confidence, "answer generated");

        Ok(QueryResponse { answer, sources, confidence })
    }

    /// Answer a query as a token stream.
    ///
    /// The same prompt as [`answer`](Self::answer) is submitted for
    /// incremental delivery; tokens arrive in generation order. A failure
    /// mid-stream yields [`STREAM_ERROR_TOKEN`] inline and ends the
    /// stream. With no relevant context, the stream yields the fixed
    /// fallback once.
    pub async fn answer_stream(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<StreamingAnswer> {
        let outcome =
            self.retrieval.retrieve(query, options.top_k, options.filter.as_ref()).await?;

        let retrieved = match outcome {
            RetrievalOutcome::NoRelevantContext => {
                return Ok(StreamingAnswer {
                    sources: Vec::new(),
                    confidence: 0.0,
                    stream: futures::stream::iter(vec![NO_CONTEXT_ANSWER.to_string()]).boxed(),
                });
            }
            RetrievalOutcome::Found(retrieved) => retrieved,
        };

        let request = self.generate_request(query, &retrieved.context);
        let mut tokens = self.llm.generate_stream(&request).await.inspect_err(|e| {
            error!(error = %e, "streamed answer generation failed to start");
        })?;

        let (sources, confidence) = attribute_sources(&retrieved.results);

        let stream = stream! {
            while let Some(token) = tokens.next().await {
                match token {
                    Ok(text) => yield text,
                    Err(e) => {
                        error!(error = %e, "stream failed mid-generation");
                        yield STREAM_ERROR_TOKEN.to_string();
                        break;
                    }
                }
            }
        };

        Ok(StreamingAnswer { sources, confidence, stream: Box::pin(stream) })
    }

    /// Propose up to three follow-up questions for a given answer.
    ///
    /// Best effort: any backend or parse failure degrades to an empty
    /// list.
    pub async fn followup_questions(&self, query: &str, answer: &str) -> Vec<String> {
        let prompt = format!(
            "Based on this question and answer:\n\n\
             Question: {query}\n\
             Answer: {answer}\n\n\
             Suggest 3 follow-up questions that would deepen the student's understanding \
             of the topic. Number them 1-3, one per line."
        );

        let request = GenerateRequest::new(prompt)
            .with_system("You help formulate study questions.")
            .with_temperature(0.7)
            .with_max_tokens(300);

        match self.llm.generate(&request).await {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| line.chars().next().is_some_and(|c| c.is_ascii_digit()))
                .map(|line| {
                    line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                        .trim()
                        .to_string()
                })
                .filter(|q| !q.is_empty())
                .take(3)
                .collect(),
            Err(e) => {
                warn!(error = %e, "follow-up question generation failed");
                Vec::new()
            }
        }
    }

    fn generate_request(&self, query: &str, context: &str) -> GenerateRequest {
        let prompt = format!(
            "Context from the study materials:\n{context}\n\n\
             Student's question: {query}\n\n\
             Give a thorough answer to the question using the information from the context \
             above."
        );

        GenerateRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(self.config.llm_temperature)
            .with_max_tokens(self.config.max_tokens)
    }
}

/// Build the attribution list and aggregate confidence from the results
/// actually used.
fn attribute_sources(results: &[SearchResult]) -> (Vec<SourceAttribution>, f32) {
    let sources: Vec<SourceAttribution> = results
        .iter()
        .map(|result| SourceAttribution {
            file: source_file(result),
            similarity: result.similarity.unwrap_or(0.0),
            preview: preview(&result.chunk.text),
        })
        .collect();

    let confidence = if sources.is_empty() {
        0.0
    } else {
        sources.iter().map(|s| s.similarity).sum::<f32>() / sources.len() as f32
    };

    (sources, confidence)
}

/// Truncate text to the preview budget, marking the cut.
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_BUDGET) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(text: &str, similarity: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: "c1".to_string(),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: "d1".to_string(),
                chunk_index: 0,
            },
            similarity: Some(similarity),
            rank: 0,
        }
    }

    #[test]
    fn confidence_is_mean_of_similarities() {
        let (sources, confidence) =
            attribute_sources(&[result("a", 0.8), result("b", 0.4)]);
        assert_eq!(sources.len(), 2);
        assert!((confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn no_sources_means_zero_confidence() {
        let (sources, confidence) = attribute_sources(&[]);
        assert!(sources.is_empty());
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn long_previews_are_truncated_with_marker() {
        let text = "x".repeat(500);
        let p = preview(&text);
        assert_eq!(p.chars().count(), 203);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn short_previews_are_untouched() {
        assert_eq!(preview("short text"), "short text");
    }
}
