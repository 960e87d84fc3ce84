//! Notifier port

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::NotifyError;

/// One-way operational notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message. Callers normally go through [`dispatch`] instead.
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!("{}", message);
        Ok(())
    }
}

/// Send a notification without waiting for it.
///
/// The send runs on its own task; failures are logged and dropped. Must be
/// called from within a Tokio runtime.
pub fn dispatch(notifier: Arc<dyn Notifier>, message: impl Into<String>) {
    let message = message.into();
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&message).await {
            warn!("Failed to deliver notification: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelNotifier(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn notify(&self, message: &str) -> Result<(), NotifyError> {
            let _ = self.0.send(message.to_string());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Rejected {
                status: 500,
                message: "down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch(Arc::new(ChannelNotifier(tx)), "hello");

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        // Must return immediately and never panic the caller
        dispatch(Arc::new(FailingNotifier), "lost");
        tokio::task::yield_now().await;
    }
}
