// libs/appointment-cell/src/services/locks.rs
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// One async mutex per doctor. Whoever holds a doctor's guard has exclusive
/// use of that doctor's calendar until the guard drops.
#[derive(Default)]
pub struct BookingLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, doctor_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(doctor_id).or_default().clone()
        };

        let guard = lock.lock_owned().await;
        debug!("Acquired booking lock for doctor {}", doctor_id);
        guard
    }
}
