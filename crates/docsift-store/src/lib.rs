//! Store backends for docsift.
//!
//! Ships the in-memory reference implementation of
//! [`docsift_core::VectorStore`] and the backend factory. Persistent
//! backends are external collaborators supplied by the caller.

pub mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use docsift_core::{StoreBackend, StoreError, VectorStore};

/// Open a store for the given backend. `External` backends must be
/// constructed by the caller and injected directly; the factory only knows
/// how to build what lives in this workspace.
pub fn open_store(backend: &StoreBackend) -> Result<Arc<dyn VectorStore>, StoreError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::External { endpoint } => Err(StoreError::Init(format!(
            "external store at {endpoint} must be supplied by the caller"
        ))),
    }
}
