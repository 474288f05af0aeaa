//! The reply pipeline for inbound message events.
//!
//! Every message event walks the same stages, in order: retrieve context from
//! the knowledge bundle, build the completion request, complete, format, and
//! dispatch. None of the stages can fail the event: errors are folded into
//! fallbacks so that each message event results in exactly one reply attempt.

use serde_json::Value;
use tracing::{Instrument, debug, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        prompts,
        types::{CompletionResult, InboundEvent, KnowledgeBundle},
    },
    runtime::Runtime,
    service::knowledge::catalog,
};

/// Handles a webhook batch, one event at a time.
///
/// Malformed events are skipped. Returns the number of reply attempts made.
#[instrument(skip_all, fields(events = events.len()))]
pub async fn handle_events(runtime: &Runtime, events: &[Value]) -> usize {
    let mut replies = 0;

    for (index, raw) in events.iter().enumerate() {
        let event = match InboundEvent::decode(raw) {
            Ok(event) => event,
            Err(err) => {
                warn!(index, "Skipping malformed event: {err}");
                continue;
            }
        };

        match event {
            InboundEvent::Message { reply_token, text } => {
                handle_message_event(runtime, &reply_token, &text).in_current_span().await;
                replies += 1;
            }
            InboundEvent::Other { kind } => debug!(index, kind = %kind, "Ignoring non-message event."),
        }
    }

    replies
}

/// Runs the full pipeline for a single text message.
#[instrument(skip_all)]
pub async fn handle_message_event(runtime: &Runtime, reply_token: &str, text: &str) {
    info!("Received message event ...");

    // Retrieve.

    let bundle = runtime.knowledge.load().await;
    let context = select_context(&runtime.config, &bundle, text);

    // Build.

    let request = prompts::build_completion_request(&runtime.config, text, Some(context));

    // Complete, then format.

    let reply = match runtime.llm.generate(&request).await {
        CompletionResult::Success { text } => runtime.config.formatter().format(&text),
        CompletionResult::Failure { reason } => {
            warn!("Completion failed, sending fallback reply: {reason}");
            runtime.config.fallback_reply.clone()
        }
    };

    // Dispatch.

    runtime.chat.dispatch(reply_token, &reply).await;
}

/// Chooses the context for a message.
///
/// A message containing the company trigger gets the company info. Anything
/// else is treated as a product name and looked up in the catalog, with the
/// specs blob appended when there is one.
pub fn select_context(config: &Config, bundle: &KnowledgeBundle, text: &str) -> String {
    if !config.company_trigger.is_empty() && text.contains(config.company_trigger.as_str()) {
        debug!("Routing to company info.");
        return bundle.company_info.clone();
    }

    debug!("Routing to product lookup.");

    let product = catalog::find_product(text, &bundle.product_catalog, &config.not_found_template);

    if bundle.specs_blob.trim().is_empty() {
        product
    } else {
        format!("{product}\n\n## 製品仕様\n\n{}", bundle.specs_blob.trim())
    }
}

// Tests.
