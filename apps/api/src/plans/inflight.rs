//! At most one plan generation per user at a time.
//!
//! The marker set lives in this process only. With several API instances the
//! same user can run one generation per instance; the shared Redis quota is
//! what bounds them across instances.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InFlight {
    users: Arc<Mutex<HashSet<Uuid>>>,
}

/// Held for the duration of a generation; releases the user on drop, which
/// also covers a client disconnect dropping the handler future.
pub struct InFlightGuard {
    users: Arc<Mutex<HashSet<Uuid>>>,
    user_id: Uuid,
}

impl InFlight {
    /// Marks `user_id` busy, or returns `None` if a generation is already running.
    pub fn try_begin(&self, user_id: Uuid) -> Option<InFlightGuard> {
        if !lock(&self.users).insert(user_id) {
            return None;
        }
        Some(InFlightGuard {
            users: Arc::clone(&self.users),
            user_id,
        })
    }

    #[cfg(test)]
    pub fn is_busy(&self, user_id: Uuid) -> bool {
        lock(&self.users).contains(&user_id)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.users).remove(&self.user_id);
    }
}

// The set stays consistent even if a holder panicked mid-insert, so poisoning is ignored.
fn lock(users: &Mutex<HashSet<Uuid>>) -> MutexGuard<'_, HashSet<Uuid>> {
    users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
