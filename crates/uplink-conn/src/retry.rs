//! Advisory cancellation for automatic-retry attempts.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation handle for one automatic-retry attempt on one link.
///
/// The coordinator hands out a token whenever a link enters the retrying
/// state, and fires it the moment the link leaves that state again, from
/// any cause. Cancellation is advisory and cooperative: nothing is
/// interrupted preemptively, the retry loop is expected to observe the
/// token between steps and stop promptly.
///
/// Clones share the attempt's signal, so the coordinator and the retry
/// loop can each hold one. Cancelling is idempotent, a token never resets,
/// and every re-entry into the retrying state yields a fresh token.
#[derive(Debug, Clone)]
pub struct RetryToken {
    signal: Arc<watch::Sender<bool>>,
}

impl RetryToken {
    pub(crate) fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Requests cancellation of the attempt. Idempotent; racing calls from
    /// several holders are fine.
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }

    /// Non-blocking cancellation check, for synchronous retry loops that
    /// poll between attempts.
    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves once cancellation has been requested. Resolves immediately
    /// on a token that is already cancelled.
    pub async fn cancelled(&self) {
        let mut signal = self.signal.subscribe();
        loop {
            if *signal.borrow() {
                return;
            }
            if signal.changed().await.is_err() {
                return;
            }
        }
    }

    /// Runs a future until it completes or this token is cancelled,
    /// whichever happens first. Returns `None` when cancellation won.
    pub async fn run_until_cancelled<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            () = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}
