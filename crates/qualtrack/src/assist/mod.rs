//! Thin question-answering helper backed by an external language-model API.

mod client;

use async_trait::async_trait;

pub use client::HttpAnswerGateway;

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// Distinct, user-visible condition: the feature is present but no
    /// credential has been configured.
    #[error("no API credential is configured for the Q&A helper")]
    MissingCredential,
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },
    #[error("provider response carried no answer text")]
    EmptyAnswer,
}

/// Boundary trait for the external Q&A provider.
#[async_trait]
pub trait AnswerGateway: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, AssistError>;
}
