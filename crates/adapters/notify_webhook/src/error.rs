//! Webhook-specific error type wrapping reqwest errors.

use shems_domain::error::ShemsError;

/// Errors originating from the webhook notifier.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The HTTP client could not be configured.
    #[error("cannot build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or timed out.
    #[error("webhook request failed")]
    Request(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("webhook responded with HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
}

impl From<WebhookError> for ShemsError {
    fn from(err: WebhookError) -> Self {
        Self::Notify(Box::new(err))
    }
}
