//! At-most-one-concurrent-synthesis guard.
//!
//! Confirmation events for the same pair can be dispatched concurrently
//! (both authors commenting near-simultaneously, or a replayed webhook
//! delivery). Synthesis must never run twice in parallel for one pair,
//! or duplicate merged issues get created. The guard hands out leased
//! claims keyed by the pairing token's canonical identity; a claim is
//! released when dropped, so completion and failure paths both release.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Claim registry for in-flight synthesis runs.
#[derive(Debug, Default)]
pub struct PairLock {
    claims: Mutex<HashSet<String>>,
}

impl PairLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Try to claim a pair. Returns `None` when a synthesis for the same
    /// key is already in flight.
    pub fn try_claim(self: &Arc<Self>, key: &str) -> Option<PairClaim> {
        let mut claims = self.claims.lock().expect("pair lock poisoned");
        if claims.insert(key.to_string()) {
            Some(PairClaim {
                lock: Arc::clone(self),
                key: key.to_string(),
            })
        } else {
            None
        }
    }

    /// Whether a synthesis for this key is currently in flight.
    pub fn is_claimed(&self, key: &str) -> bool {
        self.claims.lock().expect("pair lock poisoned").contains(key)
    }
}

/// A held claim; dropping it releases the pair.
#[derive(Debug)]
pub struct PairClaim {
    lock: Arc<PairLock>,
    key: String,
}

impl Drop for PairClaim {
    fn drop(&mut self) {
        self.lock
            .claims
            .lock()
            .expect("pair lock poisoned")
            .remove(&self.key);
    }
}
