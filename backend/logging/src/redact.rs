//! Log Redaction Layer
//!
//! Scrubs API keys and bearer tokens from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "401 from api: Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9 rejected";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn test_openai_key() {
        let clean = redact_sensitive_data("Incorrect API key provided: sk-proj-abcdefghijklmnopqrstuvwx");
        assert_eq!(clean, "Incorrect API key provided: [REDACTED_TOKEN]");
    }

    #[test]
    fn test_mineral_text_untouched() {
        let text = "| Bicarbonato | 80 mg/L |\n| Cálcio | 30 mg/L |";
        assert_eq!(redact_sensitive_data(text), text);
    }
}
