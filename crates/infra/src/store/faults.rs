use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use keyward_auth::StoreError;

/// Switchable failure modes for an in-memory adapter, so callers can exercise
/// outage and deadline handling.
#[derive(Debug, Default)]
pub struct Faults {
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
}

impl Faults {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    pub(crate) async fn gate(&self, store: &str) -> Result<(), StoreError> {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{store} is offline")));
        }
        Ok(())
    }
}
