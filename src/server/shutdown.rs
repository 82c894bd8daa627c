//! Shutdown signalling
//!
//! One trigger, observed by the accept loop between sessions and by every
//! blocking step inside a session.

use std::future::Future;
use tokio::sync::watch;

/// Fires the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

/// Observes the shutdown signal. Cheap to clone, one per session.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, Shutdown { receiver })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // No receivers left means nothing is running to stop
        let _ = self.sender.send(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been triggered. Never resolves if the
    /// trigger is dropped without firing.
    pub async fn triggered(&mut self) {
        if self.receiver.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Runs `step` unless shutdown fires first, in which case `None` is returned
    /// and `step` is dropped.
    pub async fn guard<F, T>(&mut self, step: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.triggered() => None,
            value = step => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guard_passes_value_through() {
        let (_trigger, mut shutdown) = channel();
        assert_eq!(shutdown.guard(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_guard_cancels_pending_step() {
        let (trigger, mut shutdown) = channel();
        let observer = shutdown.clone();

        let waiter = tokio::spawn(async move {
            shutdown
                .guard(tokio::time::sleep(Duration::from_secs(60)))
                .await
        });
        trigger.trigger();

        assert_eq!(waiter.await.unwrap(), None);
        assert!(observer.is_triggered());
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_fires() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);

        let step = tokio::time::sleep(Duration::from_millis(20));
        assert_eq!(shutdown.guard(step).await, Some(()));
        assert!(!shutdown.is_triggered());
    }
}
