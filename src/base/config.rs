//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::{format::ResponseFormatter, prompts, types::ContextPlacement};

use super::types::{Res, Void};

/// Default OpenAI model to use.
fn default_openai_model() -> String {
    "gpt-4".to_string()
}

/// Default sampling temperature.
fn default_openai_temperature() -> f32 {
    0.7
}

/// Default max output tokens.
fn default_openai_max_tokens() -> u32 {
    500
}

fn default_line_reply_endpoint() -> String {
    "https://api.line.me/v2/bot/message/reply".to_string()
}

fn default_dropbox_download_endpoint() -> String {
    "https://content.dropboxapi.com/2/files/download".to_string()
}

fn default_catalog_path() -> String {
    "/knowledge/products.json".to_string()
}

fn default_company_info_path() -> String {
    "/knowledge/company_info.txt".to_string()
}

fn default_specs_path() -> String {
    "/knowledge/specs.csv".to_string()
}

fn default_listen_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_system_directive() -> String {
    prompts::SYSTEM_DIRECTIVE.to_string()
}

fn default_company_trigger() -> String {
    prompts::COMPANY_TRIGGER.to_string()
}

fn default_trailing_phrase() -> String {
    prompts::TRAILING_PHRASE.to_string()
}

fn default_closing_phrase() -> String {
    prompts::CLOSING_PHRASE.to_string()
}

fn default_append_closing_phrase() -> bool {
    true
}

fn default_fallback_reply() -> String {
    prompts::FALLBACK_REPLY.to_string()
}

fn default_not_found_template() -> String {
    prompts::NOT_FOUND_TEMPLATE.to_string()
}

/// Configuration for the bot.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// Optional OpenAI-compatible API base URL (`OPENAI_API_BASE`).
    #[serde(default)]
    pub openai_api_base: Option<String>,
    /// Model identifier (`OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Sampling temperature between 0 and 1 (`OPENAI_TEMPERATURE`).
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Max output tokens (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// LINE channel access token (`LINE_CHANNEL_ACCESS_TOKEN`).
    pub line_channel_access_token: String,
    /// LINE channel secret (`LINE_CHANNEL_SECRET`).
    /// When set, inbound webhook signatures are verified.
    #[serde(default)]
    pub line_channel_secret: Option<String>,
    /// LINE reply endpoint (`LINE_REPLY_ENDPOINT`).
    #[serde(default = "default_line_reply_endpoint")]
    pub line_reply_endpoint: String,
    /// Dropbox access token (`DROPBOX_ACCESS_TOKEN`).
    pub dropbox_access_token: String,
    /// Dropbox download endpoint (`DROPBOX_DOWNLOAD_ENDPOINT`).
    #[serde(default = "default_dropbox_download_endpoint")]
    pub dropbox_download_endpoint: String,
    /// Path of the JSON product catalog (`CATALOG_PATH`).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    /// Path of the plain-text company info (`COMPANY_INFO_PATH`).
    #[serde(default = "default_company_info_path")]
    pub company_info_path: String,
    /// Path of the specs blob (`SPECS_PATH`).
    #[serde(default = "default_specs_path")]
    pub specs_path: String,
    /// Address the webhook server binds to (`LISTEN_ADDRESS`).
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// System directive override (`SYSTEM_DIRECTIVE`).
    #[serde(default = "default_system_directive")]
    pub system_directive: String,
    /// Where retrieved context goes in the prompt: `system` or `assistant` (`CONTEXT_PLACEMENT`).
    #[serde(default)]
    pub context_placement: ContextPlacement,
    /// Substring that routes a message to the company info (`COMPANY_TRIGGER`).
    #[serde(default = "default_company_trigger")]
    pub company_trigger: String,
    /// Phrase stripped from the end of replies (`TRAILING_PHRASE`).
    #[serde(default = "default_trailing_phrase")]
    pub trailing_phrase: String,
    /// Phrase appended to replies (`CLOSING_PHRASE`).
    #[serde(default = "default_closing_phrase")]
    pub closing_phrase: String,
    /// Whether to append the closing phrase (`APPEND_CLOSING_PHRASE`).
    #[serde(default = "default_append_closing_phrase")]
    pub append_closing_phrase: bool,
    /// Reply sent when the completion fails (`FALLBACK_REPLY`).
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
    /// Context used for unknown products; `{name}` is substituted (`NOT_FOUND_TEMPLATE`).
    #[serde(default = "default_not_found_template")]
    pub not_found_template: String,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_api_base: None,
            openai_model: default_openai_model(),
            openai_temperature: default_openai_temperature(),
            openai_max_tokens: default_openai_max_tokens(),
            line_channel_access_token: String::new(),
            line_channel_secret: None,
            line_reply_endpoint: default_line_reply_endpoint(),
            dropbox_access_token: String::new(),
            dropbox_download_endpoint: default_dropbox_download_endpoint(),
            catalog_path: default_catalog_path(),
            company_info_path: default_company_info_path(),
            specs_path: default_specs_path(),
            listen_address: default_listen_address(),
            system_directive: default_system_directive(),
            context_placement: ContextPlacement::default(),
            company_trigger: default_company_trigger(),
            trailing_phrase: default_trailing_phrase(),
            closing_phrase: default_closing_phrase(),
            append_closing_phrase: default_append_closing_phrase(),
            fallback_reply: default_fallback_reply(),
            not_found_template: default_not_found_template(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("LINE_RAG_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges and required credentials.
    pub fn validate(&self) -> Void {
        if !(0.0..=1.0).contains(&self.openai_temperature) {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 1."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.openai_api_key.is_empty() {
            return Err(anyhow::anyhow!("OpenAI API key must be set."));
        }

        if self.line_channel_access_token.is_empty() {
            return Err(anyhow::anyhow!("LINE channel access token must be set."));
        }

        if self.dropbox_access_token.is_empty() {
            return Err(anyhow::anyhow!("Dropbox access token must be set."));
        }

        Ok(())
    }

    /// The reply formatter described by this configuration.
    pub fn formatter(&self) -> ResponseFormatter {
        ResponseFormatter {
            trailing_phrase: self.trailing_phrase.clone(),
            closing_phrase: self.closing_phrase.clone(),
            append_closing_phrase: self.append_closing_phrase,
        }
    }
}

// Tests.
