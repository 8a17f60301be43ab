//! Configuration validation with unknown field detection.

use serde_json::Value;
use std::collections::HashSet;

use crate::config::Config;
use crate::redact::HashAlgorithm;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &[
    "eightbyeight",
    "redaction",
    "session",
    "formatter",
    "cognigy",
    "server",
    "logging",
];

/// Known fields for each section.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    ("eightbyeight", &["api_key", "sub_account_id", "base_url"]),
    (
        "redaction",
        &["hide_user_id", "hide_session_id", "hash_algorithm"],
    ),
    ("session", &["timeout_secs", "backend", "path"]),
    ("formatter", &["strict", "default_prompt"]),
    ("cognigy", &["endpoint_url"]),
    (
        "server",
        &["bind_address", "port", "path", "mode", "auth_token"],
    ),
    ("logging", &["format", "level", "file"]),
];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate() {
        *val = j;
    }

    for (i, ca) in a.chars().enumerate() {
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(matrix[i][j + 1] + 1, matrix[i + 1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }
    matrix[a_len][b_len]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn unknown_field(path: String, key: &str, known: &[&str]) -> Diagnostic {
    let message = match suggest_field(key, known) {
        Some(suggestion) => format!("Unknown field '{}' ({})", key, suggestion),
        None => format!("Unknown field '{}'", key),
    };
    Diagnostic::new(DiagnosticLevel::Error, path, message)
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "",
                "Config must be a JSON object",
            ));
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic::new(DiagnosticLevel::Ok, "", "Valid JSON"));

    let known_set: HashSet<&str> = KNOWN_TOP_LEVEL.iter().copied().collect();
    let mut has_unknown = false;
    for key in obj.keys() {
        if !known_set.contains(key.as_str()) {
            has_unknown = true;
            diagnostics.push(unknown_field(key.clone(), key, KNOWN_TOP_LEVEL));
        }
    }

    for (section, fields) in KNOWN_SECTIONS {
        let Some(section_obj) = obj.get(*section).and_then(Value::as_object) else {
            continue;
        };
        let known_set: HashSet<&str> = fields.iter().copied().collect();
        for key in section_obj.keys() {
            if !known_set.contains(key.as_str()) {
                has_unknown = true;
                diagnostics.push(unknown_field(format!("{}.{}", section, key), key, fields));
            }
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Ok,
            "",
            "All fields recognized",
        ));
    }

    diagnostics
}

/// Check a loaded config for values the bridge cannot run with.
pub fn validate_semantics(config: &Config) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if config.eightbyeight.api_key.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "eightbyeight.api_key",
            "must be set",
        ));
    }
    if config.eightbyeight.sub_account_id.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "eightbyeight.sub_account_id",
            "must be set",
        ));
    }
    if !config.eightbyeight.base_url.starts_with("http://")
        && !config.eightbyeight.base_url.starts_with("https://")
    {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "eightbyeight.base_url",
            "must be an http(s) URL",
        ));
    }
    if let Err(e) = config.redaction.hash_algorithm.parse::<HashAlgorithm>() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "redaction.hash_algorithm",
            e.to_string(),
        ));
    }
    if !config.redaction.hide_user_id || !config.redaction.hide_session_id {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "redaction",
            "clear identifiers will be sent to the AI platform",
        ));
    }
    if config.cognigy.endpoint_url.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "cognigy.endpoint_url",
            "must be set",
        ));
    }
    if !config.server.path.starts_with('/') {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "server.path",
            "must start with '/'",
        ));
    }
    if config.server.auth_token.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "server.auth_token",
            "unset; anyone who can reach the gateway can post webhooks",
        ));
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn runnable_config() -> Config {
        let mut config = Config::default();
        config.eightbyeight.api_key = "key".to_string();
        config.eightbyeight.sub_account_id = "sub".to_string();
        config.cognigy.endpoint_url = "https://endpoint.example/abc".to_string();
        config.server.auth_token = Some("secret".to_string());
        config
    }

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("hello", "helo"), 1);
    }

    #[test]
    fn test_suggest_field_match() {
        let result = suggest_field("redacton", KNOWN_TOP_LEVEL);
        assert!(result.unwrap().contains("redaction"));
    }

    #[test]
    fn test_suggest_field_no_match() {
        assert!(suggest_field("xyzabcdef", KNOWN_TOP_LEVEL).is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let raw = json!({
            "eightbyeight": {"api_key": "k", "sub_account_id": "s"},
            "server": {"port": 9000, "mode": "webhook"}
        });
        let diags = validate_config(&raw);
        assert!(diags.iter().all(|d| d.level != DiagnosticLevel::Error));
        assert!(diags.iter().any(|d| d.message == "All fields recognized"));
    }

    #[test]
    fn test_validate_unknown_top_level() {
        let diags = validate_config(&json!({"servre": {}}));
        let err = diags
            .iter()
            .find(|d| d.level == DiagnosticLevel::Error)
            .unwrap();
        assert_eq!(err.path, "servre");
        assert!(err.message.contains("did you mean 'server'"));
    }

    #[test]
    fn test_validate_unknown_section_field() {
        let diags = validate_config(&json!({"redaction": {"hash_algo": "sha256"}}));
        assert!(diags
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error && d.path == "redaction.hash_algo"));
    }

    #[test]
    fn test_validate_not_an_object() {
        let diags = validate_config(&json!("not an object"));
        assert!(diags.iter().any(|d| {
            d.level == DiagnosticLevel::Error && d.message.contains("must be a JSON object")
        }));
    }

    #[test]
    fn test_semantics_default_config_has_errors() {
        let diags = validate_semantics(&Config::default());
        let paths: Vec<&str> = diags
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert!(paths.contains(&"eightbyeight.api_key"));
        assert!(paths.contains(&"eightbyeight.sub_account_id"));
        assert!(paths.contains(&"cognigy.endpoint_url"));
    }

    #[test]
    fn test_semantics_runnable_config_is_clean() {
        let diags = validate_semantics(&runnable_config());
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_semantics_unknown_hash_algorithm() {
        let mut config = runnable_config();
        config.redaction.hash_algorithm = "md5".to_string();
        let diags = validate_semantics(&config);
        assert!(diags
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error && d.path == "redaction.hash_algorithm"));
    }

    #[test]
    fn test_semantics_warns_on_clear_identifiers() {
        let mut config = runnable_config();
        config.redaction.hide_user_id = false;
        let diags = validate_semantics(&config);
        assert!(diags
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warn && d.path == "redaction"));
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(DiagnosticLevel::Warn, "server.auth_token", "unset");
        assert_eq!(d.to_string(), "[WARN] server.auth_token: unset");
    }
}
