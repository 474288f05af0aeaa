pub mod dropbox;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Res;

// Traits.

/// Generic document store trait that clients must implement.
///
/// The bot only ever reads a handful of small files by path, so this is the
/// whole contract.
#[async_trait]
pub trait GenericDocumentStore: Send + Sync + 'static {
    /// Download the raw bytes of the document at `path`.
    async fn download(&self, path: &str) -> Res<Vec<u8>>;
}

// Structs.

/// Document store client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DocumentClient {
    inner: Arc<dyn GenericDocumentStore>,
}

impl Deref for DocumentClient {
    type Target = dyn GenericDocumentStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DocumentClient {
    pub fn new(inner: Arc<dyn GenericDocumentStore>) -> Self {
        Self { inner }
    }
}
