//! Outbound email delivery.
//!
//! The registration workflow only sees [`EmailSender`]. Production wiring puts
//! an [`HttpEmailSender`] (or [`LogEmailSender`] when no provider is configured)
//! behind a [`QueuedEmailSender`] so requests never wait on the provider.

pub mod http;
pub mod queue;

use async_trait::async_trait;

pub use http::HttpEmailSender;
pub use queue::{EmailRetryPolicy, QueuedEmailSender};

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected message (status={status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Email queue is closed")]
    QueueClosed,
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        tracing::info!(to = address, subject, "Email delivery not configured, logging message");
        tracing::debug!(to = address, "{}", body);
        Ok(())
    }
}
