//! Dropbox file download integration.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::base::{config::Config, types::Res};

use super::{DocumentClient, GenericDocumentStore};

// Extra methods on `DocumentClient` applied by the Dropbox implementation.

impl DocumentClient {
    /// Creates a new Dropbox document client.
    pub fn dropbox(config: &Config) -> Res<Self> {
        let client = DropboxDocumentStore::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

/// Dropbox document store implementation.
#[derive(Clone)]
struct DropboxDocumentStore {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl DropboxDocumentStore {
    #[instrument(name = "DropboxDocumentStore::new", skip_all)]
    fn new(config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint: config.dropbox_download_endpoint.clone(),
            access_token: config.dropbox_access_token.clone(),
        })
    }
}

#[async_trait]
impl GenericDocumentStore for DropboxDocumentStore {
    #[instrument(name = "DropboxDocumentStore::download", skip(self))]
    async fn download(&self, path: &str) -> Res<Vec<u8>> {
        let arg = serde_json::json!({ "path": path }).to_string();

        let response = self.client.post(&self.endpoint).bearer_auth(&self.access_token).header("Dropbox-API-Arg", arg).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Dropbox download of `{path}` failed ({status}): {detail}"));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes.", bytes.len());

        Ok(bytes.to_vec())
    }
}

// Tests.
