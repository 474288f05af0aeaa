//! Integration with the OpenAI chat completions API.
//!
//! This module provides a thin wrapper around `async-openai` that maps a
//! provider-neutral [`CompletionRequest`] onto a chat completion call.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use crate::base::{
    config::Config,
    types::{CompletionRequest, PromptRole, Res},
};

use super::{GenericLlmClient, LlmClient};

/// Upper bound on a single completion call.
const TIMEOUT: u64 = 60;

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let mut cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        if let Some(base) = &config.openai_api_base {
            cfg = cfg.with_api_base(base.clone());
        }

        // A single attempt per event: the client's built-in retry is disabled.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };

        Self {
            client: Client::with_config(cfg).with_backoff(backoff),
            model: config.openai_model.clone(),
        }
    }

    /// Build the chat completion request.
    #[instrument(name = "OpenAiLlmClient::build_request", skip_all)]
    fn build_request(&self, request: &CompletionRequest) -> Res<CreateChatCompletionRequest> {
        let messages = request
            .messages()
            .into_iter()
            .map(|message| -> Res<ChatCompletionRequestMessage> {
                Ok(match message.role {
                    PromptRole::System => ChatCompletionRequestSystemMessageArgs::default().content(message.content).build()?.into(),
                    PromptRole::User => ChatCompletionRequestUserMessageArgs::default().content(message.content).build()?.into(),
                    PromptRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default().content(message.content).build()?.into(),
                })
            })
            .collect::<Res<Vec<_>>>()?;

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()?;

        Ok(request)
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip_all)]
    async fn complete(&self, request: &CompletionRequest) -> Res<String> {
        let request = self.build_request(request)?;

        debug!(model = %self.model, messages = request.messages.len(), "Sending completion request");

        let response = timeout(Duration::from_secs(TIMEOUT), self.client.chat().create(request))
            .await
            .map_err(|_| anyhow::anyhow!("OpenAI API call timed out after {TIMEOUT} seconds"))??;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no message content."))?;

        info!("Received {} characters from LLM", content.chars().count());

        Ok(content.trim().to_string())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    use super::*;
    use crate::base::{
        config::ConfigInner,
        types::{CompletionResult, ContextPlacement},
    };

    #[derive(Clone, Default)]
    struct Captured {
        hits: Arc<AtomicUsize>,
        body: Arc<Mutex<Option<Value>>>,
    }

    async fn serve(status: StatusCode, response: Value) -> (String, Captured) {
        let captured = Captured::default();

        let app = Router::new()
            .route(
                "/chat/completions",
                post(move |State(captured): State<Captured>, Json(body): Json<Value>| {
                    let response = response.clone();
                    async move {
                        captured.hits.fetch_add(1, Ordering::SeqCst);
                        *captured.body.lock().unwrap() = Some(body);
                        (status, Json(response))
                    }
                }),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{addr}"), captured)
    }

    fn create_test_config(api_base: String) -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                openai_api_key: "sk-test".to_string(),
                openai_api_base: Some(api_base),
                openai_model: "gpt-test".to_string(),
                ..Default::default()
            }),
        }
    }

    fn create_test_request() -> CompletionRequest {
        CompletionRequest {
            system_instructions: "Be brief.".to_string(),
            user_text: "製品A".to_string(),
            context_text: Some("製品Aは軽量です。".to_string()),
            placement: ContextPlacement::Assistant,
            temperature: 0.3,
            max_tokens: 120,
        }
    }

    fn completion_body(text: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_one_request() {
        let (base, captured) = serve(StatusCode::OK, completion_body("  軽量な製品です。 \n")).await;
        let client = LlmClient::openai(&create_test_config(base));

        let text = client.complete(&create_test_request()).await.unwrap();

        assert_eq!(text, "軽量な製品です。");
        assert_eq!(captured.hits.load(Ordering::SeqCst), 1);

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["max_tokens"], 120);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "製品Aは軽量です。");
    }

    #[tokio::test]
    async fn test_generate_folds_api_error_into_failure() {
        let error = json!({"error": {"message": "bad request", "type": "invalid_request_error", "param": null, "code": null}});
        let (base, captured) = serve(StatusCode::BAD_REQUEST, error).await;
        let client = LlmClient::openai(&create_test_config(base));

        let result = client.generate(&create_test_request()).await;

        assert!(matches!(result, CompletionResult::Failure { .. }));
        assert_eq!(captured.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_server_error_is_not_retried() {
        let error = json!({"error": {"message": "boom", "type": "server_error", "param": null, "code": null}});
        let (base, captured) = serve(StatusCode::INTERNAL_SERVER_ERROR, error).await;
        let client = LlmClient::openai(&create_test_config(base));

        let result = client.generate(&create_test_request()).await;

        assert!(matches!(result, CompletionResult::Failure { .. }));
        assert_eq!(captured.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_unreachable_host_is_failure() {
        let client = LlmClient::openai(&create_test_config("http://127.0.0.1:1".to_string()));

        let result = client.generate(&create_test_request()).await;

        assert!(matches!(result, CompletionResult::Failure { .. }));
    }
}
