//! Local project persistence
//!
//! Projects are stored as whole records keyed by id. Saves from the UI go
//! through [`writer::PersistenceWriter`], which serializes writes per id on a
//! background runtime so the editor never blocks on disk.

pub mod file_store;
pub mod memory;
pub mod writer;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::model::Project;

pub use file_store::JsonFileStore;
pub use memory::MemoryStore;
pub use writer::{PersistenceEvent, PersistenceWriter};

/// Errors raised by a project store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode project {id}: {source}")]
    Encode {
        id: String,
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Keyed, last-write-wins store of whole projects
pub trait ProjectStore: Send + Sync {
    /// Insert or replace the record with `project.id`
    fn put(&self, project: &Project) -> Result<(), StoreError>;

    /// Every stored project, ordered by id
    fn get_all(&self) -> Result<Vec<Project>, StoreError>;

    /// Remove a record; removing a missing id is not an error
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Remove every record
    fn clear(&self) -> Result<(), StoreError>;
}
