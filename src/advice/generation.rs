use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Issued when a refresh starts. Only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Generation counter for the single "last advice" cache.
///
/// Every refresh takes a ticket regardless of its date. A refresh that was
/// overtaken by a newer one never writes, even if it resolves last.
#[derive(Default)]
pub struct GenerationGuard {
    latest: AtomicU64,
    publishing: Mutex<()>,
}

impl GenerationGuard {
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Runs `write` only if `ticket` is still the newest. The check and the
    /// write happen under one lock, so publishes never interleave.
    pub async fn publish<F, T>(&self, ticket: Ticket, write: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _held = self.publishing.lock().await;
        if !self.is_current(ticket) {
            return None;
        }
        Some(write.await)
    }
}
