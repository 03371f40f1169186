//! Config redaction: produce safe-to-share config snapshots by masking sensitive fields.

use serde_json::Value;

/// Keys whose string values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "apikey",
    "accessToken",
    "access_token",
    "token",
    "secret",
    "password",
];

/// Redact a config JSON value, replacing all sensitive fields with a `"sk-1***"` hint.
///
/// The resulting value is safe to log or print from `aqualabel config show`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    // Preserve a short prefix hint: first 4 chars + ***
    let hint = if s.chars().count() > 4 {
        format!("{}***", s.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    };
    Value::String(hint)
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

/// Collect all field paths that would be redacted (for diagnostics).
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => {
            let key = path.rsplit('.').next().unwrap_or("");
            if is_sensitive_key(key) {
                out.push(path.to_string());
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, &child_path, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_api_key() {
        let v = json!({ "inference": { "provider": "openai", "apiKey": "sk-abcdef123456" } });
        let redacted = redact(&v);
        let key = redacted["inference"]["apiKey"].as_str().unwrap();
        assert_eq!(key, "sk-a***");
        assert_eq!(redacted["inference"]["provider"], "openai");
    }

    #[test]
    fn short_secret_fully_masked() {
        let v = json!({ "inference": { "apiKey": "abc" } });
        assert_eq!(redact(&v)["inference"]["apiKey"], "***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "logging": { "level": "debug" }, "labels": [{"field": "calcium"}] });
        assert_eq!(redact(&v), v);
    }

    #[test]
    fn collects_paths() {
        let v = json!({ "inference": { "apiKey": "sk-xyz12345", "model": "gpt-4o" } });
        assert_eq!(collect_redacted_paths(&v), vec!["inference.apiKey".to_string()]);
    }
}
