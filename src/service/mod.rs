//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the bot:
//! - Chat services (e.g., LINE)
//! - Document stores (e.g., Dropbox)
//! - The knowledge cache built on the document store
//! - LLM services (e.g., OpenAI)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod documents;
pub mod knowledge;
pub mod llm;
