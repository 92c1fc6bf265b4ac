//! Shutdown coordination for the bridge.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Future that resolves once `trigger` is called.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `fut` to completion or give up after `deadline`.
///
/// Returns `false` when the deadline was hit.
pub async fn with_deadline<F: Future<Output = ()>>(fut: F, deadline: Duration) -> bool {
    match tokio::time::timeout(deadline, fut).await {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(deadline_secs = deadline.as_secs(), "Shutdown deadline exceeded, forcing exit");
            false
        }
    }
}
