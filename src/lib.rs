//! Library root for `line-rag-bot`.
//!
//! Line-rag-bot is an OpenAI-powered assistant for a LINE official account designed to:
//! - Answer product questions from a small product catalog
//! - Answer questions about the company from a company profile
//! - Keep answers grounded in that knowledge, with a consistent closing
//!
//! The bot integrates with LINE for chat, Dropbox for its knowledge documents,
//! and OpenAI for the replies. The architecture is built around extensible
//! traits that allow for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::{info, warn};

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with knowledge, LLM, and chat clients
/// - Serves the webhook until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting line-rag-bot ...");

    // Start the crypto provider.
    if crypto::ring::default_provider().install_default().is_err() {
        warn!("A crypto provider was already installed.");
    }

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
