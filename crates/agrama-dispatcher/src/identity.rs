//! Agent/session identity assignment (spec §4.G "Agent identity").

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub struct Identity {
    pub agent_id: String,
    pub session_id: String,
}

/// Assigns an agent id (client name + random suffix) on the first
/// request, and a fresh session id on every `initialize` cycle.
pub struct IdentityRegistry {
    current: Mutex<Option<Identity>>,
    sequence: AtomicU64,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        IdentityRegistry {
            current: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    /// Start a new session for `client_name`, assigning a fresh agent id
    /// if this is the first `initialize` or the client's name changed.
    pub fn initialize(&self, client_name: &str) -> Identity {
        let mut current = self.current.lock();
        let agent_id = match current.as_ref() {
            Some(identity) if identity.agent_id.starts_with(client_name) => identity.agent_id.clone(),
            _ => format!("{client_name}-{}", short_suffix()),
        };
        let identity = Identity {
            agent_id,
            session_id: format!("session-{}", short_suffix()),
        };
        *current = Some(identity.clone());
        identity
    }

    /// The active identity, if `initialize` has completed at least once.
    pub fn current(&self) -> Option<Identity> {
        self.current.lock().clone()
    }

    /// Next monotonic per-agent sequence number, used for response
    /// ordering (spec §5: "the dispatcher tags each request with a
    /// monotonic sequence per agent").
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn short_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
