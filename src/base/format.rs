//! Deterministic post-processing of generated replies.

/// Text transforms applied to every generated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFormatter {
    pub trailing_phrase: String,
    pub closing_phrase: String,
    pub append_closing_phrase: bool,
}

impl ResponseFormatter {
    /// Strip the trailing phrase (every repetition of it), then append the
    /// closing phrase unless the text already ends with it.
    pub fn format(&self, text: &str) -> String {
        let mut result = text.trim_end();

        if !self.trailing_phrase.is_empty() {
            while let Some(stripped) = result.strip_suffix(self.trailing_phrase.as_str()) {
                result = stripped.trim_end();
            }
        }

        let mut result = result.to_string();

        if self.append_closing_phrase && !self.closing_phrase.is_empty() && !result.ends_with(self.closing_phrase.as_str()) {
            if !result.is_empty() {
                result.push_str("\n\n");
            }
            result.push_str(&self.closing_phrase);
        }

        result
    }
}

// Tests.
