//! Single-use handoff from the callback handler to the waiting flow.
//!
//! A bounded channel of capacity one plus a publish-once flag: the first
//! result wins, later ones are dropped. Dropping every sender (the callback
//! server does this on `stop`) wakes the waiter with [`WaitError::Cancelled`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

/// What the browser redirect delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Code { code: String, state: String },
    Error(String),
}

/// Why [`RendezvousReceiver::wait`] returned without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("timed out waiting for the authorization callback")]
    TimedOut,
    #[error("authentication was interrupted by application shutdown")]
    Cancelled,
}

/// Create a connected sender/receiver pair.
pub fn rendezvous() -> (RendezvousSender, RendezvousReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (RendezvousSender { tx, published: Arc::new(AtomicBool::new(false)) }, RendezvousReceiver { rx })
}

/// Producing end. Clones share the publish-once flag.
#[derive(Debug, Clone)]
pub struct RendezvousSender {
    tx: mpsc::Sender<AuthResult>,
    published: Arc<AtomicBool>,
}

impl RendezvousSender {
    /// Publish without waiting. Returns whether the result was accepted.
    pub fn publish(&self, result: AuthResult) -> bool {
        if self.published.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tx.try_send(result).is_ok()
    }

    /// Publish, waiting at most `deadline` for channel capacity.
    pub async fn publish_within(&self, result: AuthResult, deadline: Duration) -> bool {
        if self.published.swap(true, Ordering::SeqCst) {
            return false;
        }
        matches!(tokio::time::timeout(deadline, self.tx.send(result)).await, Ok(Ok(())))
    }

    /// Whether the receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming end, held by the authorization flow.
#[derive(Debug)]
pub struct RendezvousReceiver {
    rx: mpsc::Receiver<AuthResult>,
}

impl RendezvousReceiver {
    /// Wait for the result.
    ///
    /// # Errors
    /// [`WaitError::TimedOut`] once `timeout` elapses, [`WaitError::Cancelled`]
    /// if every sender is dropped before anything was published.
    pub async fn wait(mut self, timeout: Duration) -> Result<AuthResult, WaitError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(result)) => Ok(result),
            Ok(None) => Err(WaitError::Cancelled),
            Err(_) => Err(WaitError::TimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn code(value: &str) -> AuthResult {
        AuthResult::Code { code: value.to_string(), state: "s".to_string() }
    }

    #[tokio::test]
    async fn first_publish_wins() {
        let (tx, rx) = rendezvous();

        assert!(tx.publish(code("first")));
        assert!(!tx.publish(code("second")));
        assert!(!tx.clone().publish(AuthResult::Error("late".into())));

        assert_eq!(rx.wait(Duration::from_secs(1)).await, Ok(code("first")));
    }

    #[tokio::test]
    async fn publish_within_delivers() {
        let (tx, rx) = rendezvous();
        let sender = tx.clone();
        tokio::spawn(async move {
            sender.publish_within(AuthResult::Error("denied".into()), Duration::from_secs(1)).await
        });

        assert_eq!(rx.wait(Duration::from_secs(1)).await, Ok(AuthResult::Error("denied".into())));
        assert!(!tx.publish(code("after")));
    }

    #[tokio::test]
    async fn dropping_senders_cancels_waiter() {
        let (tx, rx) = rendezvous();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(tx);
        });

        assert_eq!(rx.wait(Duration::from_secs(5)).await, Err(WaitError::Cancelled));
    }

    #[tokio::test]
    async fn wait_times_out() {
        let (_tx, rx) = rendezvous();
        let started = Instant::now();

        assert_eq!(rx.wait(Duration::from_millis(100)).await, Err(WaitError::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn publish_after_receiver_dropped_is_rejected() {
        let (tx, rx) = rendezvous();
        drop(rx);

        assert!(tx.is_closed());
        assert!(!tx.publish(code("orphan")));
    }
}
