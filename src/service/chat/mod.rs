pub mod line;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::base::types::Void;

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the write path into a messaging platform. Implementing
/// this trait allows different chat services to be used with the bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Reply to the conversation identified by `reply_token` with a single text message.
    async fn reply(&self, reply_token: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }

    /// Best-effort reply: failures are logged and dropped.
    #[instrument(name = "ChatClient::dispatch", skip(self, text))]
    pub async fn dispatch(&self, reply_token: &str, text: &str) {
        match self.reply(reply_token, text).await {
            Ok(()) => info!("Reply sent."),
            Err(err) => error!("Error sending reply: {err}"),
        }
    }
}
