//! File-based Attachment Store Adapter
//!
//! Stores each attachment as `<base>/<connection-id>.bin`. Writes go to a
//! temporary file first and are renamed into place, so a crash mid-write
//! never leaves a torn attachment behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::foundation::ConnectionId;
use crate::ports::{AttachmentError, AttachmentStore};

/// File-based storage for connection attachments
#[derive(Debug, Clone)]
pub struct FileAttachmentStore {
    base_path: PathBuf,
}

impl FileAttachmentStore {
    /// Create a store rooted at `base_path`. The directory is created on
    /// first write.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn attachment_path(&self, connection_id: ConnectionId) -> PathBuf {
        self.base_path.join(format!("{connection_id}.bin"))
    }

    fn ensure_dir(&self) -> Result<(), AttachmentError> {
        fs::create_dir_all(&self.base_path).map_err(|e| AttachmentError::IoError(e.to_string()))
    }
}

impl AttachmentStore for FileAttachmentStore {
    fn persist(&self, connection_id: ConnectionId, bytes: Vec<u8>) -> Result<(), AttachmentError> {
        self.ensure_dir()?;

        let path = self.attachment_path(connection_id);
        let staging = path.with_extension("tmp");
        fs::write(&staging, bytes).map_err(|e| AttachmentError::IoError(e.to_string()))?;
        fs::rename(&staging, &path).map_err(|e| AttachmentError::IoError(e.to_string()))?;

        Ok(())
    }

    fn load(&self, connection_id: ConnectionId) -> Result<Option<Vec<u8>>, AttachmentError> {
        match fs::read(self.attachment_path(connection_id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AttachmentError::IoError(e.to_string())),
        }
    }

    fn clear(&self, connection_id: ConnectionId) -> Result<(), AttachmentError> {
        match fs::remove_file(self.attachment_path(connection_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AttachmentError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (FileAttachmentStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (FileAttachmentStore::new(dir.path().join("attachments")), dir)
    }

    #[test]
    fn persist_creates_directory_and_file() {
        let (store, _dir) = store();
        let id = ConnectionId::new();

        store.persist(id, b"{\"n\":1}".to_vec()).unwrap();

        assert!(store.base_path().is_dir());
        assert!(store.attachment_path(id).is_file());
        assert!(!store.attachment_path(id).with_extension("tmp").exists());
    }

    #[test]
    fn load_round_trips_bytes() {
        let (store, _dir) = store();
        let id = ConnectionId::new();

        store.persist(id, vec![0, 159, 146, 150]).unwrap();

        assert_eq!(store.load(id).unwrap(), Some(vec![0, 159, 146, 150]));
    }

    #[test]
    fn load_missing_is_none_even_without_directory() {
        let (store, _dir) = store();
        assert_eq!(store.load(ConnectionId::new()).unwrap(), None);
    }

    #[test]
    fn clear_removes_file_and_tolerates_missing() {
        let (store, _dir) = store();
        let id = ConnectionId::new();
        store.persist(id, b"x".to_vec()).unwrap();

        store.clear(id).unwrap();
        store.clear(id).unwrap();

        assert_eq!(store.load(id).unwrap(), None);
    }

    #[test]
    fn survives_a_new_store_instance() {
        let (store, _dir) = store();
        let id = ConnectionId::new();
        store.persist(id, b"kept".to_vec()).unwrap();

        let reopened = FileAttachmentStore::new(store.base_path());

        assert_eq!(reopened.load(id).unwrap(), Some(b"kept".to_vec()));
    }
}
