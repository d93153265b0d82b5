//! # tutor-model
//!
//! Language model backends for the tutor RAG pipeline.
//!
//! This crate defines the [`Llm`] capability trait (single-shot and
//! streaming text generation) and ships two implementations:
//!
//! - [`OpenAiChatModel`]: any OpenAI-compatible chat completions API,
//!   including local servers such as Ollama and vLLM (feature `openai`).
//! - [`MockLlm`]: a scriptable model for tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tutor_model::{GenerateRequest, Llm, OpenAiChatModel};
//!
//! let model = OpenAiChatModel::compatible("http://localhost:11434/v1", "llama3.2")?;
//! let request = GenerateRequest::new("Explain cosine similarity.")
//!     .with_temperature(0.5);
//! let answer = model.generate(&request).await?;
//! ```
//!
//! Streaming uses the same request and yields tokens in generation order:
//!
//! ```rust,ignore
//! use futures::StreamExt;
//!
//! let mut stream = model.generate_stream(&request).await?;
//! while let Some(token) = stream.next().await {
//!     print!("{}", token?);
//! }
//! ```

pub mod error;
pub mod llm;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use error::{ModelError, Result};
pub use llm::{GenerateRequest, Llm, TokenStream};
pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::OpenAiChatModel;
