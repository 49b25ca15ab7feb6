//! In-memory wizard session store, keyed by Telegram user id.
//!
//! Sessions are ephemeral: publish, cancel, and the periodic sweep all
//! remove them; a process restart loses everything in flight.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::wizard::SetupSession;

struct Entry {
    session: SetupSession,
    last_activity: Instant,
}

#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<u64, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, user_id: u64, session: SetupSession) {
        let mut map = self.inner.lock().unwrap();
        map.insert(
            user_id,
            Entry {
                session,
                last_activity: Instant::now(),
            },
        );
    }

    /// Run `f` against the user's session, refreshing its activity stamp.
    /// Returns `None` when the user has no session.
    pub fn with<R>(&self, user_id: u64, f: impl FnOnce(&mut SetupSession) -> R) -> Option<R> {
        let mut map = self.inner.lock().unwrap();
        let entry = map.get_mut(&user_id)?;
        entry.last_activity = Instant::now();
        Some(f(&mut entry.session))
    }

    pub fn get(&self, user_id: u64) -> Option<SetupSession> {
        self.with(user_id, |session| session.clone())
    }

    pub fn remove(&self, user_id: u64) -> Option<SetupSession> {
        let mut map = self.inner.lock().unwrap();
        map.remove(&user_id).map(|entry| entry.session)
    }

    /// Drop sessions idle longer than `ttl`. Returns how many were evicted.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        let mut map = self.inner.lock().unwrap();
        let before = map.len();
        map.retain(|_, entry| entry.last_activity.elapsed() <= ttl);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
