//! Helpers shared by the HTTP adapters.

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::error::ConfigurationError;

/// Builds a client with a per-request timeout.
pub(crate) fn build_client(
    backend_name: &str,
    timeout: Duration,
) -> Result<reqwest::Client, ConfigurationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigurationError::InvalidConnection {
            backend_name: backend_name.to_string(),
            message: e.to_string(),
        })
}

/// Parses a base URL that path segments can be appended to.
pub(crate) fn parse_base_url(backend_name: &str, url: &str) -> Result<Url, ConfigurationError> {
    let invalid = |message: String| ConfigurationError::InvalidConnection {
        backend_name: backend_name.to_string(),
        message,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(format!("invalid url '{}': {}", url, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(invalid(format!("'{}' cannot be used as a base url", url)));
    }
    Ok(parsed)
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Extracts a readable message from an error response body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ["message", "details", "hint"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_encodes_segments() {
        let base = parse_base_url("test", "http://localhost:8108/").unwrap();
        let url = join(&base, &["collections", "a b", "documents"]);
        assert_eq!(url.as_str(), "http://localhost:8108/collections/a%20b/documents");
    }

    #[test]
    fn test_rejects_non_base_urls() {
        assert!(parse_base_url("test", "mailto:ops@example.com").is_err());
        assert!(parse_base_url("test", "not a url").is_err());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message": "Not Found"}"#), "Not Found");
        assert_eq!(error_message("bad gateway\n"), "bad gateway");
    }
}
