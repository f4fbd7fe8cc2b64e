//! LLM error types.

use thiserror::Error;

/// Check an HTTP response for rate-limit errors, returning `RateLimit` for 429.
pub fn check_response_error(response: &reqwest::Response) -> Option<LLMError> {
    if response.status().is_success() {
        return None;
    }
    if response.status().as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        return Some(LLMError::RateLimit { retry_after });
    }
    None
}

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited (429)
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimit { retry_after: Option<u64> },
}

impl LLMError {
    /// Whether the failure looks like a rejected credential.
    ///
    /// Upstreams are inconsistent about status codes, so the error text is
    /// checked as well.
    pub fn is_auth_failure(&self) -> bool {
        if let LLMError::Api { status, .. } = self
            && matches!(*status, 401 | 403)
        {
            return true;
        }
        let text = self.to_string().to_lowercase();
        text.contains("unauthorized") || text.contains("invalid api key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> LLMError {
        LLMError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn auth_failure_by_status() {
        assert!(api(401, "nope").is_auth_failure());
        assert!(api(403, "forbidden").is_auth_failure());
    }

    #[test]
    fn auth_failure_by_text() {
        assert!(api(400, r#"{"error":"Invalid API key provided"}"#).is_auth_failure());
        assert!(api(500, "Unauthorized").is_auth_failure());
    }

    #[test]
    fn other_errors_are_not_auth_failures() {
        assert!(!api(500, "internal error").is_auth_failure());
        assert!(!api(404, "model not found").is_auth_failure());
        assert!(!LLMError::RateLimit { retry_after: Some(3) }.is_auth_failure());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            api(502, "bad gateway").to_string(),
            "api error (status 502): bad gateway"
        );
    }
}
