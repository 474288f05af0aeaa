//! Prompt templates, localized fixed strings, and prompt assembly.

use crate::base::{config::Config, types::CompletionRequest};

/// System directive.
pub const SYSTEM_DIRECTIVE: &str = r#####"
# 基本方針

あなたは当社の公式LINEアカウントで顧客対応を行うアシスタントです。

- 丁寧語(です・ます調)で、親しみやすく簡潔に回答してください。
- 回答は100文字から300文字程度にまとめてください。
- 回答は「参考情報」として与えられた内容のみに基づいてください。参考情報に無いことは推測せず、分からない旨を伝えてください。
- 箇条書きやMarkdownの装飾は使わず、LINEのトーク画面で読みやすいプレーンテキストで回答してください。
"#####;

/// Substring that routes a message to the company-info context.
pub const COMPANY_TRIGGER: &str = "社長";

/// Phrase the model tends to append, stripped from every reply.
pub const TRAILING_PHRASE: &str = "何か他にご質問があれば、お気軽にお尋ねください。";

/// Closing phrase appended to every reply.
pub const CLOSING_PHRASE: &str = "その他ご不明な点がございましたら、お気軽にお問い合わせください。";

/// Reply sent when the completion call fails.
pub const FALLBACK_REPLY: &str = "申し訳ありません。現在メッセージを処理できませんでした。しばらくしてから再度お試しください。";

/// Context used when a product is not in the catalog. `{name}` is replaced by the queried name.
pub const NOT_FOUND_TEMPLATE: &str = "「{name}」に関する製品情報は見つかりませんでした。";

/// Render the not-found message for `name`.
pub fn not_found_message(template: &str, name: &str) -> String {
    template.replace("{name}", name)
}

/// Assemble the completion request for one user message.
pub fn build_completion_request(config: &Config, user_text: &str, context_text: Option<String>) -> CompletionRequest {
    CompletionRequest {
        system_instructions: config.system_directive.trim().to_string(),
        user_text: user_text.to_string(),
        context_text,
        placement: config.context_placement,
        temperature: config.openai_temperature,
        max_tokens: config.openai_max_tokens,
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{
        config::ConfigInner,
        types::{ContextPlacement, PromptRole},
    };

    #[test]
    fn not_found_message_contains_name() {
        let message = not_found_message(NOT_FOUND_TEMPLATE, "ウィジェットZ");

        assert!(message.contains("ウィジェットZ"));
        assert!(!message.contains("{name}"));
    }

    #[test]
    fn build_uses_config_values() {
        let config = Config {
            inner: Arc::new(ConfigInner {
                openai_temperature: 0.2,
                openai_max_tokens: 321,
                context_placement: ContextPlacement::Assistant,
                ..Default::default()
            }),
        };

        let request = build_completion_request(&config, "製品A", Some("説明".to_string()));

        assert_eq!(request.system_instructions, SYSTEM_DIRECTIVE.trim());
        assert_eq!(request.user_text, "製品A");
        assert_eq!(request.context_text.as_deref(), Some("説明"));
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 321);

        let roles = request.messages().iter().map(|m| m.role).collect::<Vec<_>>();
        assert_eq!(roles, vec![PromptRole::System, PromptRole::User, PromptRole::Assistant]);
    }
}
