//! Cancellation signaling between the host (ctrl-c, watch mode) and the
//! execution backend.
//!
//! The controller treats the token as opaque: it is created by the caller,
//! threaded through to the backend, and never interpreted along the way.

use tokio::sync::watch;

/// Sender half. Dropping it without cancelling leaves the token uncancelled
/// forever.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cheaply clonable receiver half, one clone per worker.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// A token that can never fire, for runs with no cancellation source.
    pub fn never() -> Self {
        let (handle, token) = cancel_pair();
        // Leak the sender so `cancelled()` pends instead of observing a
        // closed channel.
        std::mem::forget(handle);
        token
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}
