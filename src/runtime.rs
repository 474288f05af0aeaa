//! Runtime services and shared state for the bot.

use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::webhook,
    service::{
        chat::ChatClient,
        documents::DocumentClient,
        knowledge::{KnowledgePaths, KnowledgeStore},
        llm::LlmClient,
    },
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the knowledge store, the LLM and chat clients, and
/// configuration. It is designed to be trivially cloneable, allowing it to be
/// passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The cached knowledge bundle.
    pub knowledge: KnowledgeStore,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the document store and the knowledge cache on top of it.
        let documents = DocumentClient::dropbox(&config)?;
        let knowledge = KnowledgeStore::new(documents, KnowledgePaths::from_config(&config));

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the LINE client.
        let chat = ChatClient::line(&config)?;

        Ok(Self { config, knowledge, llm, chat })
    }

    /// Bind the listen address and serve the webhook until shutdown.
    pub async fn start(&self) -> Void {
        let listener = tokio::net::TcpListener::bind(&self.config.listen_address).await?;

        info!("Listening on {} ...", listener.local_addr()?);

        axum::serve(listener, webhook::router(self.clone())).with_graceful_shutdown(shutdown_signal()).await?;

        Ok(())
    }
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down ..."),
        Err(err) => {
            warn!("Unable to listen for Ctrl-C, serving until killed: {err}");
            std::future::pending::<()>().await;
        }
    }
}
