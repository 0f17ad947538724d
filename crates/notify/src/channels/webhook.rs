//! Slack-compatible webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::Notification;
use crate::NotifyChannel;

/// Webhook notification channel.
pub struct WebhookChannel {
    webhook_url: Option<String>,
    profile_base: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// Create a webhook channel.
    ///
    /// `profile_base` is the URL prefix used to turn a click context into a
    /// profile link.
    #[must_use]
    pub fn new(webhook_url: Option<String>, profile_base: impl Into<String>) -> Self {
        if webhook_url.is_some() {
            debug!("Webhook notifications enabled");
        } else {
            debug!("Webhook notifications disabled (no webhook URL)");
        }

        Self {
            webhook_url,
            profile_base: profile_base.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Format a notification as a webhook payload.
    fn format_payload(&self, notification: &Notification) -> WebhookPayload {
        let attachment = Attachment {
            fallback: format!("{}: {}", notification.title, notification.body),
            color: notification.priority.color().to_string(),
            author_name: Some(notification.category.as_str().to_string()),
            title: notification.title.clone(),
            title_link: Some(notification.click_url(&self.profile_base)),
            text: notification.body.clone(),
            footer: notification.sticky.then(|| "sticky".to_string()),
        };

        WebhookPayload {
            attachments: vec![attachment],
        }
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("notify.webhook_url".to_string()))?;

        let payload = self.format_payload(notification);

        debug!(channel = "webhook", title = %notification.title, "Sending notification");

        let response = self.client.post(webhook_url).json(&payload).send().await?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "webhook", "Notification sent successfully");
            return Ok(());
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        let body = response.text().await.unwrap_or_default();

        warn!(
            channel = "webhook",
            status = %status,
            body = %body,
            "Webhook request failed"
        );

        Err(ChannelError::Other(format!("Webhook returned {status}: {body}")))
    }
}

// =============================================================================
// Webhook payload types
// =============================================================================

#[derive(Debug, Serialize)]
struct WebhookPayload {
    attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
struct Attachment {
    fallback: String,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title_link: Option<String>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
}
