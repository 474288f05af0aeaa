//! Event handling and user interactions.
//!
//! This module provides functionality for handling inbound platform events:
//! - Serving the webhook and liveness endpoints
//! - Decoding event batches and routing message events
//! - Coordinating the reply pipeline between services (knowledge, LLM, chat)

pub mod message_event;
pub mod webhook;
