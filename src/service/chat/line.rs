//! LINE Messaging API reply integration.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the LINE implementation.

impl ChatClient {
    /// Creates a new LINE chat client.
    pub fn line(config: &Config) -> Res<Self> {
        let client = LineChatClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

// Structs.

/// LINE client implementation.
#[derive(Clone)]
struct LineChatClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl LineChatClient {
    #[instrument(name = "LineChatClient::new", skip_all)]
    fn new(config: &Config) -> Res<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint: config.line_reply_endpoint.clone(),
            access_token: config.line_channel_access_token.clone(),
        })
    }
}

#[async_trait]
impl GenericChatClient for LineChatClient {
    #[instrument(name = "LineChatClient::reply", skip(self, text))]
    async fn reply(&self, reply_token: &str, text: &str) -> Void {
        let body = ReplyRequest {
            reply_token,
            messages: [TextMessage { kind: "text", text }],
        };

        debug!("Posting reply to LINE ...");

        let response = self.client.post(&self.endpoint).bearer_auth(&self.access_token).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Error sending message to LINE ({status}): {detail}"));
        }

        Ok(())
    }
}

// Tests.
