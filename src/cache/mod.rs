//! Descriptor cache.
//!
//! Holds the current descriptor per document plus a side table with the
//! descriptor that was current before the latest edit. Keys are
//! slash-normalized so one document is never tracked under two spellings.
//!
//! Descriptors are stored behind `Arc` and replaced wholesale, so a reader
//! always sees either the old or the new snapshot.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;

use crate::core::Descriptor;
use crate::error::PluginError;
use crate::utils::path::slash;

#[derive(Debug, Default)]
pub struct DescriptorCache {
    current: DashMap<String, Arc<Descriptor>>,
    previous: DashMap<String, Arc<Descriptor>>,
}

#[inline]
fn key(path: &str) -> String {
    slash(Path::new(path))
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the current descriptor for `path`.
    pub fn store(&self, path: &str, descriptor: Arc<Descriptor>) {
        self.current.insert(key(path), descriptor);
    }

    /// Current descriptor; a miss is an internal inconsistency.
    pub fn get(&self, path: &str) -> Result<Arc<Descriptor>, PluginError> {
        self.try_get(path)
            .ok_or_else(|| PluginError::MissingDescriptor(path.to_string()))
    }

    /// Current descriptor, `None` when the document was never parsed.
    pub fn try_get(&self, path: &str) -> Option<Arc<Descriptor>> {
        self.current.get(&key(path)).map(|d| Arc::clone(&d))
    }

    /// Remember the pre-edit descriptor for the running hot update.
    pub fn set_previous(&self, path: &str, descriptor: Arc<Descriptor>) {
        self.previous.insert(key(path), descriptor);
    }

    pub fn get_previous(&self, path: &str) -> Option<Arc<Descriptor>> {
        self.previous.get(&key(path)).map(|d| Arc::clone(&d))
    }

    /// Number of documents with a current descriptor.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}
