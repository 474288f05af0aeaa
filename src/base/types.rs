use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Inbound events.

/// A single platform notification, decoded from the webhook batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A text message that must be answered through its reply token.
    Message { reply_token: String, text: String },
    /// Anything else (follows, stickers, postbacks, ...).
    Other { kind: String },
}

/// Raw wire shape of a LINE webhook event.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "replyToken")]
    reply_token: Option<String>,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    text: Option<String>,
}

impl InboundEvent {
    /// Decode one element of the `events` array.
    ///
    /// A message event without text is treated as `Other`. A message event with
    /// text but no reply token is malformed and yields an error.
    pub fn decode(value: &Value) -> Res<Self> {
        let raw: RawEvent = serde_json::from_value(value.clone())?;

        let text = raw.message.and_then(|m| m.text);

        match (raw.kind.as_str(), text) {
            ("message", Some(text)) => {
                let reply_token = raw.reply_token.filter(|t| !t.is_empty()).ok_or_else(|| anyhow::anyhow!("Message event is missing a reply token."))?;
                Ok(InboundEvent::Message { reply_token, text })
            }
            _ => Ok(InboundEvent::Other { kind: raw.kind }),
        }
    }
}

// Knowledge.

/// One entry of the product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
}

/// The cached set of reference documents used to ground replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBundle {
    pub product_catalog: Vec<ProductRecord>,
    pub company_info: String,
    pub specs_blob: String,
}

// Completions.

/// Where the retrieved context is placed in the message sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPlacement {
    /// Folded into the system message.
    #[default]
    System,
    /// Sent as a separate assistant-role message after the user message.
    Assistant,
}

/// Role of a single prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// A role-tagged prompt message, independent of any provider's wire types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

/// A fully assembled completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instructions: String,
    pub user_text: String,
    pub context_text: Option<String>,
    pub placement: ContextPlacement,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// The ordered, role-tagged messages sent to the model.
    pub fn messages(&self) -> Vec<PromptMessage> {
        let context = self.context_text.as_deref().filter(|c| !c.is_empty());

        match (self.placement, context) {
            (ContextPlacement::System, Some(context)) => vec![
                PromptMessage {
                    role: PromptRole::System,
                    content: format!("{}\n\n## 参考情報\n\n{}", self.system_instructions, context),
                },
                PromptMessage {
                    role: PromptRole::User,
                    content: self.user_text.clone(),
                },
            ],
            (ContextPlacement::Assistant, Some(context)) => vec![
                PromptMessage {
                    role: PromptRole::System,
                    content: self.system_instructions.clone(),
                },
                PromptMessage {
                    role: PromptRole::User,
                    content: self.user_text.clone(),
                },
                PromptMessage {
                    role: PromptRole::Assistant,
                    content: context.to_string(),
                },
            ],
            (_, None) => vec![
                PromptMessage {
                    role: PromptRole::System,
                    content: self.system_instructions.clone(),
                },
                PromptMessage {
                    role: PromptRole::User,
                    content: self.user_text.clone(),
                },
            ],
        }
    }
}

/// Outcome of a single completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Success { text: String },
    Failure { reason: String },
}

// Tests.
