//! Cached knowledge bundle backed by the document store.
//!
//! The bundle is fetched on first use and kept for the lifetime of the
//! process. Loading is single-flight: concurrent first callers wait on the
//! same fetch, and nobody ever observes a partially populated bundle.

pub mod catalog;

use std::{ops::Deref, sync::Arc};

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::{
    base::{config::Config, types::KnowledgeBundle},
    service::documents::DocumentClient,
};

/// Paths of the named documents that make up the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgePaths {
    pub catalog: String,
    pub company_info: String,
    pub specs: String,
}

impl KnowledgePaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: config.catalog_path.clone(),
            company_info: config.company_info_path.clone(),
            specs: config.specs_path.clone(),
        }
    }
}

/// Knowledge store for the application.
///
/// This is trivially cloneable; clones share the same cache slot.
#[derive(Clone)]
pub struct KnowledgeStore {
    inner: Arc<KnowledgeStoreInner>,
}

impl Deref for KnowledgeStore {
    type Target = KnowledgeStoreInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Shared state behind a [`KnowledgeStore`].
///
/// Only reachable through the store; the fields stay private so the cache
/// slot can't be touched outside `load` and `refresh`.
pub struct KnowledgeStoreInner {
    documents: DocumentClient,
    paths: KnowledgePaths,
    slot: Mutex<Option<Arc<KnowledgeBundle>>>,
}

impl KnowledgeStore {
    pub fn new(documents: DocumentClient, paths: KnowledgePaths) -> Self {
        Self {
            inner: Arc::new(KnowledgeStoreInner {
                documents,
                paths,
                slot: Mutex::new(None),
            }),
        }
    }

    /// Return the cached bundle, fetching it on the first call.
    #[instrument(name = "KnowledgeStore::load", skip_all)]
    pub async fn load(&self) -> Arc<KnowledgeBundle> {
        let mut slot = self.slot.lock().await;

        if let Some(bundle) = slot.as_ref() {
            return bundle.clone();
        }

        let bundle = Arc::new(self.fetch().await);
        *slot = Some(bundle.clone());

        bundle
    }

    /// Re-fetch every document and replace the cached bundle.
    ///
    /// The service never calls this on its own: a running bot keeps serving
    /// the bundle it loaded first until it is restarted or an embedder calls
    /// `refresh` explicitly. Loads issued while a refresh is in flight wait
    /// for it and then see the new bundle.
    #[instrument(name = "KnowledgeStore::refresh", skip_all)]
    pub async fn refresh(&self) -> Arc<KnowledgeBundle> {
        let mut slot = self.slot.lock().await;

        let bundle = Arc::new(self.fetch().await);
        *slot = Some(bundle.clone());

        bundle
    }

    async fn fetch(&self) -> KnowledgeBundle {
        let (catalog, company_info, specs) = tokio::join!(
            self.fetch_document(&self.paths.catalog),
            self.fetch_document(&self.paths.company_info),
            self.fetch_document(&self.paths.specs),
        );

        let bundle = KnowledgeBundle {
            product_catalog: catalog::parse_catalog(&catalog),
            company_info: String::from_utf8_lossy(&company_info).into_owned(),
            specs_blob: String::from_utf8_lossy(&specs).into_owned(),
        };

        info!(products = bundle.product_catalog.len(), company_info = bundle.company_info.len(), specs = bundle.specs_blob.len(), "Knowledge bundle loaded");

        bundle
    }

    /// Download one document; any failure degrades to empty content.
    async fn fetch_document(&self, path: &str) -> Vec<u8> {
        match self.documents.download(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to fetch `{path}`, using empty content: {err}");
                Vec::new()
            }
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use mockall::mock;
    use tokio::sync::Barrier;

    use super::*;
    use crate::{
        base::types::{ProductRecord, Res},
        service::documents::GenericDocumentStore,
    };

    mock! {
        pub Documents {}

        #[async_trait]
        impl GenericDocumentStore for Documents {
            async fn download(&self, path: &str) -> Res<Vec<u8>>;
        }
    }

    fn paths() -> KnowledgePaths {
        KnowledgePaths {
            catalog: "/products.json".to_string(),
            company_info: "/company.txt".to_string(),
            specs: "/specs.csv".to_string(),
        }
    }

    fn expect_all(mock: &mut MockDocuments, times: usize) {
        mock.expect_download()
            .withf(|path| path == "/products.json")
            .times(times)
            .returning(|_| Ok(br#"[{"name": "A", "description": "a"}]"#.to_vec()));
        mock.expect_download().withf(|path| path == "/company.txt").times(times).returning(|_| Ok("会社情報".as_bytes().to_vec()));
        mock.expect_download().withf(|path| path == "/specs.csv").times(times).returning(|_| Ok(b"name,weight\nA,1kg".to_vec()));
    }

    #[tokio::test]
    async fn test_load_fetches_each_document_once() {
        let mut mock = MockDocuments::new();
        expect_all(&mut mock, 1);

        let store = KnowledgeStore::new(DocumentClient::new(Arc::new(mock)), paths());

        let first = store.load().await;
        let second = store.load().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(
            first.product_catalog,
            vec![ProductRecord {
                name: "A".to_string(),
                description: "a".to_string()
            }]
        );
        assert_eq!(first.company_info, "会社情報");
        assert_eq!(first.specs_blob, "name,weight\nA,1kg");
    }

    /// Document store that takes a while to answer and counts downloads per path.
    #[derive(Default)]
    struct SlowDocuments {
        downloads: std::sync::Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl SlowDocuments {
        fn downloads(&self, path: &str) -> usize {
            self.downloads.lock().unwrap().get(path).copied().unwrap_or_default()
        }
    }

    #[async_trait]
    impl GenericDocumentStore for SlowDocuments {
        async fn download(&self, path: &str) -> Res<Vec<u8>> {
            *self.downloads.lock().unwrap().entry(path.to_string()).or_default() += 1;

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(100)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(match path {
                "/products.json" => br#"[{"name": "A", "description": "a"}]"#.to_vec(),
                "/company.txt" => "会社情報".as_bytes().to_vec(),
                _ => b"name,weight\nA,1kg".to_vec(),
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_are_single_flight() {
        let documents = Arc::new(SlowDocuments::default());
        let store = KnowledgeStore::new(DocumentClient::new(documents.clone()), paths());

        let barrier = Arc::new(Barrier::new(16));
        let handles = (0..16)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    store.load().await
                })
            })
            .collect::<Vec<_>>();

        let mut bundles = Vec::new();
        for handle in handles {
            bundles.push(handle.await.unwrap());
        }

        assert!(bundles.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(bundles[0].product_catalog.len(), 1);
        assert_eq!(documents.downloads("/products.json"), 1);
        assert_eq!(documents.downloads("/company.txt"), 1);
        assert_eq!(documents.downloads("/specs.csv"), 1);
    }

    #[tokio::test]
    async fn test_documents_are_fetched_concurrently() {
        let documents = Arc::new(SlowDocuments::default());
        let store = KnowledgeStore::new(DocumentClient::new(documents.clone()), paths());

        store.load().await;

        assert_eq!(documents.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_empty() {
        let mut mock = MockDocuments::new();
        mock.expect_download().withf(|path| path == "/products.json").times(1).returning(|_| Err(anyhow::anyhow!("not found")));
        mock.expect_download().withf(|path| path == "/company.txt").times(1).returning(|_| Ok("info".as_bytes().to_vec()));
        mock.expect_download().withf(|path| path == "/specs.csv").times(1).returning(|_| Err(anyhow::anyhow!("timeout")));

        let store = KnowledgeStore::new(DocumentClient::new(Arc::new(mock)), paths());
        let bundle = store.load().await;

        assert!(bundle.product_catalog.is_empty());
        assert_eq!(bundle.company_info, "info");
        assert!(bundle.specs_blob.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_refetches() {
        let mut mock = MockDocuments::new();
        expect_all(&mut mock, 2);

        let store = KnowledgeStore::new(DocumentClient::new(Arc::new(mock)), paths());

        let first = store.load().await;
        let refreshed = store.refresh().await;
        let after = store.load().await;

        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert!(Arc::ptr_eq(&refreshed, &after));
        assert_eq!(first, refreshed);
    }
}
