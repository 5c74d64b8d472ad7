//! Live map of connection → session for one room.

use std::collections::HashMap;

use crate::domain::foundation::ConnectionId;
use crate::domain::session::{Peers, Session};

/// One session per connection, keyed by connection id.
///
/// Owned by exactly one coordinator; never shared across tasks.
#[derive(Debug)]
pub struct SessionRegistry<D> {
    sessions: HashMap<ConnectionId, Session<D>>,
}

impl<D> Default for SessionRegistry<D> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }
}

impl<D> SessionRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session. Returns it back if its connection already has one.
    pub fn insert(&mut self, session: Session<D>) -> Result<(), Session<D>> {
        use std::collections::hash_map::Entry;

        match self.sessions.entry(session.id()) {
            Entry::Occupied(_) => Err(session),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Session<D>> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Session<D>> {
        self.sessions.get_mut(&id)
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Session<D>> {
        self.sessions.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.sessions.keys().copied()
    }

    /// Point-in-time snapshot of every connection handle, for fan-out.
    pub fn peers(&self) -> Peers {
        Peers::new(self.sessions.values().map(|s| s.handle().clone()).collect())
    }
}
