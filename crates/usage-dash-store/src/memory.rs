//! In-memory record source.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::RecordSource;

/// A record source backed by a `Vec` of documents.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: RwLock<Vec<Value>>,
}

impl MemorySource {
    /// Create a source holding the given documents.
    #[must_use]
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Append a document.
    pub fn push(&self, document: Value) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document);
    }

    /// Replace the whole collection.
    pub fn replace(&self, documents: Vec<Value>) {
        *self.documents.write().unwrap_or_else(PoisonError::into_inner) = documents;
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_all(&self) -> Result<Vec<Value>> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
