//! Desktop notification channel backed by a notifier command.
//!
//! The command is invoked with freedesktop `notify-send` style arguments:
//! `-a <category> -u <urgency> [-t 0] [-i <icon>] <title> <body>`.

use async_trait::async_trait;
use std::ffi::OsString;
use tokio::process::Command;
use tracing::debug;

use crate::error::ChannelError;
use crate::events::Notification;
use crate::NotifyChannel;

/// Default notifier command.
pub const DEFAULT_COMMAND: &str = "notify-send";

/// Desktop notification channel.
pub struct DesktopChannel {
    program: Option<String>,
}

impl DesktopChannel {
    /// Create a channel that runs `program` for each notification.
    ///
    /// An empty program name disables the channel.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let program = if program.trim().is_empty() {
            debug!("Desktop notifications disabled (no command configured)");
            None
        } else {
            Some(program)
        };
        Self { program }
    }

    /// Build the argument list for a notification.
    #[must_use]
    pub fn build_args(notification: &Notification) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-a".into(),
            notification.category.as_str().into(),
            "-u".into(),
            notification.priority.urgency().into(),
        ];

        // Zero expiry keeps the bubble on screen until dismissed.
        if notification.sticky {
            args.push("-t".into());
            args.push("0".into());
        }

        if let Some(icon) = &notification.icon {
            args.push("-i".into());
            args.push(icon.clone().into_os_string());
        }

        // Title and body may start with a dash.
        args.push("--".into());
        args.push(notification.title.clone().into());
        args.push(notification.body.clone().into());
        args
    }
}

impl Default for DesktopChannel {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

#[async_trait]
impl NotifyChannel for DesktopChannel {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn enabled(&self) -> bool {
        self.program.is_some()
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let program = self
            .program
            .as_deref()
            .ok_or_else(|| ChannelError::NotConfigured("notify.command".to_string()))?;

        debug!(
            channel = "desktop",
            program,
            title = %notification.title,
            sticky = notification.sticky,
            "Sending notification"
        );

        let output = Command::new(program)
            .args(Self::build_args(notification))
            .output()
            .await
            .map_err(|source| ChannelError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ChannelError::CommandFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
