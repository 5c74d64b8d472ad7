//! In-Memory Attachment Store Adapter
//!
//! Keeps attachments in a shared map. Clones share the same map, so a room
//! torn down and rebuilt in the same process still finds its attachments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::ConnectionId;
use crate::ports::{AttachmentError, AttachmentStore};

/// In-memory storage for connection attachments
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttachmentStore {
    attachments: Arc<RwLock<HashMap<ConnectionId, Vec<u8>>>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored attachments
    pub fn len(&self) -> usize {
        self.attachments.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> AttachmentError {
    AttachmentError::Unavailable("attachment map lock poisoned".to_string())
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn persist(&self, connection_id: ConnectionId, bytes: Vec<u8>) -> Result<(), AttachmentError> {
        self.attachments
            .write()
            .map_err(poisoned)?
            .insert(connection_id, bytes);
        Ok(())
    }

    fn load(&self, connection_id: ConnectionId) -> Result<Option<Vec<u8>>, AttachmentError> {
        Ok(self
            .attachments
            .read()
            .map_err(poisoned)?
            .get(&connection_id)
            .cloned())
    }

    fn clear(&self, connection_id: ConnectionId) -> Result<(), AttachmentError> {
        self.attachments
            .write()
            .map_err(poisoned)?
            .remove(&connection_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_is_none() {
        let store = InMemoryAttachmentStore::new();
        assert_eq!(store.load(ConnectionId::new()).unwrap(), None);
    }

    #[test]
    fn persist_replaces_previous_value() {
        let store = InMemoryAttachmentStore::new();
        let id = ConnectionId::new();

        store.persist(id, b"one".to_vec()).unwrap();
        store.persist(id, b"two".to_vec()).unwrap();

        assert_eq!(store.load(id).unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = InMemoryAttachmentStore::new();
        let id = ConnectionId::new();
        store.persist(id, b"x".to_vec()).unwrap();

        store.clear(id).unwrap();
        store.clear(id).unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let store = InMemoryAttachmentStore::new();
        let other = store.clone();
        let id = ConnectionId::new();

        store.persist(id, b"shared".to_vec()).unwrap();

        assert_eq!(other.load(id).unwrap(), Some(b"shared".to_vec()));
    }
}
