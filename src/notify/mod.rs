pub mod email;
pub mod formatters;
pub mod telegram;

pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::claims::ReconcileReport;
use crate::config::Config;
use crate::error::Result;

/// What the host hears about after a batch with accepted claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimNotice {
    /// "item: name" lines
    pub accepted: Vec<String>,
    /// Items that were already taken
    pub rejected: Vec<String>,
}

impl ClaimNotice {
    pub fn from_report(report: &ReconcileReport) -> Self {
        Self {
            accepted: report.accepted_lines(),
            rejected: report.rejected.clone(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;

    /// Check the channel is usable; called once at startup
    async fn verify(&self) -> Result<()> {
        Ok(())
    }

    async fn notify(&self, notice: &ClaimNotice) -> Result<()>;
}

/// Fan-out over every configured channel. Delivery runs in its own task and
/// failures stay inside it.
#[derive(Clone, Default)]
pub struct NotificationHub {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotificationHub {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();

        match config.email.as_ref() {
            Some(email) if email.enabled => channels.push(Arc::new(EmailNotifier::new(email)?)),
            Some(_) => info!("Email notifications are disabled in config"),
            None => warn!("No email configured; the host will not be notified by email"),
        }

        if let Some(telegram) = config.telegram.as_ref().filter(|t| t.enabled) {
            channels.push(Arc::new(TelegramNotifier::new(telegram)));
        }

        Ok(Self::new(channels))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.channels.iter().map(|c| c.channel())
    }

    /// Check every channel that asks for it; problems are logged, never fatal
    pub async fn verify(&self) {
        for channel in &self.channels {
            if let Err(e) = channel.verify().await {
                error!("{} notifications misconfigured: {}", channel.channel(), e);
            }
        }
    }

    /// Send `notice` on every channel and wait for all of them
    pub async fn deliver(&self, notice: &ClaimNotice) {
        let results = join_all(self.channels.iter().map(|c| c.notify(notice))).await;

        for (channel, result) in self.channels.iter().zip(results) {
            match result {
                Ok(()) => info!("Claim notification delivered via {}", channel.channel()),
                Err(e) => error!("Failed to send {} notification: {}", channel.channel(), e),
            }
        }
    }

    /// Fire-and-forget delivery; the caller never waits on it
    pub fn dispatch(&self, notice: ClaimNotice) -> Option<JoinHandle<()>> {
        if self.channels.is_empty() {
            return None;
        }
        let hub = self.clone();
        Some(tokio::spawn(async move {
            hub.deliver(&notice).await;
        }))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FailingNotifier, RecordingNotifier};
    use super::*;

    fn notice() -> ClaimNotice {
        ClaimNotice {
            accepted: vec!["Crib: Ana".to_string()],
            rejected: vec!["Stroller".to_string()],
        }
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let recorder = RecordingNotifier::new();
        let hub = NotificationHub::new(vec![Arc::new(FailingNotifier), recorder.clone().into_arc()]);

        let handle = hub.dispatch(notice()).unwrap();
        handle.await.unwrap();

        assert_eq!(recorder.notices(), vec![notice()]);
    }

    #[tokio::test]
    async fn test_disabled_hub_dispatches_nothing() {
        let hub = NotificationHub::disabled();
        assert!(hub.is_empty());
        assert!(hub.dispatch(notice()).is_none());
    }

    #[test]
    fn test_from_config_without_channels() {
        let hub = NotificationHub::from_config(&Config::default()).unwrap();
        assert!(hub.is_empty());
    }
}
