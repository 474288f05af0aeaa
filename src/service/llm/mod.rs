pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::{error, instrument};

use crate::base::types::{CompletionRequest, CompletionResult, Res};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the single operation the reply pipeline needs from a
/// large language model: turn an assembled request into generated text.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Make exactly one completion call and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }

    /// Run one completion, folding any error into [`CompletionResult::Failure`].
    #[instrument(name = "LlmClient::generate", skip_all)]
    pub async fn generate(&self, request: &CompletionRequest) -> CompletionResult {
        match self.complete(request).await {
            Ok(text) => CompletionResult::Success { text },
            Err(err) => {
                error!("Error communicating with the completion API: {err}");
                CompletionResult::Failure { reason: err.to_string() }
            }
        }
    }
}
