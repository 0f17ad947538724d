//! Notification sinks for chirp.
//!
//! This crate turns a [`Notification`] into a desktop bubble, a chat webhook
//! post, or anything else implementing [`NotifyChannel`].
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use notify::{Category, DesktopChannel, Notification, Notifier, Priority};
//!
//! # async fn demo() {
//! let notifier = Notifier::new(vec![Arc::new(DesktopChannel::default())]);
//!
//! for (channel, result) in notifier
//!     .deliver(&Notification {
//!         category: Category::Timeline,
//!         title: "alice".to_string(),
//!         body: "hello world".to_string(),
//!         click_context: "alice".to_string(),
//!         sticky: false,
//!         priority: Priority::Normal,
//!         icon: None,
//!     })
//!     .await
//! {
//!     if let Err(e) = result {
//!         eprintln!("{channel}: {e}");
//!     }
//! }
//! # }
//! ```
//!
//! # Configuration
//!
//! - `NOTIFY_DISABLED`: Set to "true" to disable all notifications
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`DesktopChannel`] runs a `notify-send` style command
//! - [`WebhookChannel`] posts Slack-compatible webhook payloads
//! - [`Notifier`] dispatches notifications to all enabled channels

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::desktop::DesktopChannel;
pub use channels::webhook::WebhookChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::{Category, Notification, Priority};

use std::sync::Arc;
use tracing::{debug, info, warn};

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Outcome of delivering one notification to one channel.
pub type ChannelResult = (&'static str, Result<(), ChannelError>);

/// Central notification dispatcher.
///
/// The `Notifier` holds the configured channels and sends each notification
/// to every enabled one in turn.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a notifier from a set of channels.
    ///
    /// Disabled channels are dropped; `NOTIFY_DISABLED` turns everything off.
    #[must_use]
    pub fn new(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        let disabled = std::env::var(ENV_NOTIFY_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let channels: Vec<_> = channels.into_iter().filter(|c| c.enabled()).collect();

        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            let names: Vec<_> = channels.iter().map(|c| c.name()).collect();
            info!(channels = ?names, "Notification system initialized");
        }

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a notifier with specific channels, ignoring the environment.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Send a notification to every enabled channel and wait for each.
    ///
    /// Channels are tried in order; one failing channel does not stop the
    /// others. Results are returned per channel for the caller to log.
    pub async fn deliver(&self, notification: &Notification) -> Vec<ChannelResult> {
        if self.disabled || self.channels.is_empty() {
            debug!("No channels available, skipping notification");
            return vec![];
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            if !channel.enabled() {
                debug!(channel = channel.name(), "Channel disabled, skipping");
                continue;
            }
            let result = channel.send(notification).await;
            results.push((channel.name(), result));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChannel {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl NotifyChannel for CountingChannel {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn send(&self, _notification: &Notification) -> Result<(), ChannelError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::Other("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn sample() -> Notification {
        Notification {
            category: Category::Timeline,
            title: "alice".to_string(),
            body: "hi".to_string(),
            click_context: "alice".to_string(),
            sticky: false,
            priority: Priority::Normal,
            icon: None,
        }
    }

    #[test]
    fn test_disabled_notifier() {
        let notifier = Notifier::disabled();
        assert!(!notifier.has_channels());
        assert_eq!(notifier.channel_count(), 0);
    }

    #[test]
    fn test_priority_urgency() {
        assert_eq!(Priority::Normal.urgency(), "normal");
        assert_eq!(Priority::High.urgency(), "critical");
    }

    #[test]
    fn test_click_url() {
        let n = sample();
        assert_eq!(n.click_url("https://twitter.com/"), "https://twitter.com/alice");
    }

    #[tokio::test]
    async fn test_deliver_continues_after_failure() {
        let failing = Arc::new(CountingChannel {
            sent: AtomicUsize::new(0),
            fail: true,
        });
        let working = Arc::new(CountingChannel {
            sent: AtomicUsize::new(0),
            fail: false,
        });
        let channels: Vec<Arc<dyn NotifyChannel>> = vec![failing.clone(), working.clone()];
        let notifier = Notifier::with_channels(channels);

        let results = notifier.deliver(&sample()).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert_eq!(working.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_notifier_delivers_nothing() {
        let results = Notifier::disabled().deliver(&sample()).await;
        assert!(results.is_empty());
    }
}
