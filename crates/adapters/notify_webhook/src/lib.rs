//! # shems-adapter-notify-webhook
//!
//! Delivers appliance condition changes by POSTing a JSON message to an
//! HTTP endpoint (typically a mail relay).
//!
//! ## Dependency rule
//! Depends on `shems-app` (for the `Notifier` port) and `shems-domain`.

mod error;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;

use shems_app::ports::Notifier;
use shems_domain::error::ShemsError;
use shems_domain::transition::TransitionEvent;

pub use error::WebhookError;

/// Configuration for the webhook notifier.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint receiving one POST per transition.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Config {
    /// Build a [`WebhookNotifier`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Client`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<WebhookNotifier, WebhookError> {
        WebhookNotifier::new(self)
    }
}

/// Message posted for every transition.
#[derive(Debug, Serialize)]
struct Message<'a> {
    to: Option<&'a str>,
    subject: String,
    body: String,
    event: &'a TransitionEvent,
}

impl<'a> From<&'a TransitionEvent> for Message<'a> {
    fn from(event: &'a TransitionEvent) -> Self {
        Self {
            to: event.recipient.as_deref(),
            subject: event.subject(),
            body: format!(
                "Your appliance condition has been updated. {} at {}.",
                event.summary(),
                event.occurred_at.to_rfc3339()
            ),
            event,
        }
    }
}

/// [`Notifier`] that POSTs each transition as JSON.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    fn new(config: Config) -> Result<Self, WebhookError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("shems/", env!("CARGO_PKG_VERSION"))),
        );
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(WebhookError::Client)?;
        Ok(Self {
            client,
            url: config.url,
        })
    }

    async fn post(&self, event: &TransitionEvent) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Message::from(event))
            .send()
            .await
            .map_err(WebhookError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    #[tracing::instrument(skip(self, event), fields(transition_id = %event.id))]
    async fn notify(&self, event: TransitionEvent) -> Result<(), ShemsError> {
        self.post(&event).await?;
        tracing::debug!(recipient = ?event.recipient, "webhook accepted notification");
        Ok(())
    }
}
