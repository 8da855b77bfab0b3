//! # Peer Pool
//!
//! Registry of live sessions behind one coarse lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::IteratorRandom;

use super::session::PeerSession;

/// Thread-safe set of live sessions.
#[derive(Default)]
pub struct PeerPool {
    sessions: Mutex<HashMap<u64, Arc<PeerSession>>>,
}

impl PeerPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session.
    pub fn add(&self, session: Arc<PeerSession>) {
        self.sessions.lock().insert(session.id(), session);
    }

    /// Remove a session; returns `true` if it was present.
    pub fn remove(&self, id: u64) -> bool {
        self.sessions.lock().remove(&id).is_some()
    }

    /// Uniformly random live session, `None` if the pool is empty.
    pub fn random_peer(&self) -> Option<Arc<PeerSession>> {
        let sessions = self.sessions.lock();
        sessions.values().choose(&mut rand::thread_rng()).cloned()
    }

    /// `true` if a session dialed on `addr` is live.
    pub fn contains_addr(&self, addr: &str) -> bool {
        self.sessions.lock().values().any(|s| s.addr() == addr)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// `true` if no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Addresses of live sessions.
    pub fn addrs(&self) -> Vec<String> {
        self.sessions
            .lock()
            .values()
            .map(|s| s.addr().to_string())
            .collect()
    }
}
