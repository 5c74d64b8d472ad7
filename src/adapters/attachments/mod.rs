//! Attachment Store Adapters
//!
//! Implementations of the `AttachmentStore` port.
//!
//! ## Available Adapters
//!
//! - **FileAttachmentStore** - One file per connection id on disk; survives
//!   process restarts
//! - **InMemoryAttachmentStore** - A shared map; survives room hibernation
//!   but not the process (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::attachments::{FileAttachmentStore, InMemoryAttachmentStore};
//!
//! let store = FileAttachmentStore::new("./data/attachments");
//! let store = InMemoryAttachmentStore::new();
//! ```

mod file;
mod in_memory;

pub use file::FileAttachmentStore;
pub use in_memory::InMemoryAttachmentStore;
