//! Unit tests for error handling
//!
//! Tests error classification, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::DsaCoachError;
    use crate::errors::ErrorKind;

    fn upstream(status: u16, message: &str) -> DsaCoachError {
        DsaCoachError::Upstream {
            service: "gemini",
            status,
            message: message.to_string(),
        }
    }

    // ====== Classification Tests ======

    #[test]
    fn test_503_is_transient() {
        let error = upstream(503, "The model is overloaded. Please try again later.");
        assert!(error.is_transient());
        assert_eq!(error.kind(), ErrorKind::TransientUpstream);
    }

    #[test]
    fn test_403_is_configuration() {
        let error = upstream(403, "Permission denied");
        assert!(!error.is_transient());
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_429_is_quota() {
        let error = upstream(429, "Too many requests");
        assert_eq!(error.kind(), ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_message_match_for_credentials() {
        let error = upstream(400, "API key not valid. Please pass a valid API key.");
        assert_eq!(error.kind(), ErrorKind::Configuration);

        let error = DsaCoachError::LlmError("missing credentials".to_string());
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_message_match_for_quota() {
        let error = DsaCoachError::LlmError("You exceeded your current quota".to_string());
        assert_eq!(error.kind(), ErrorKind::QuotaExceeded);

        let error = upstream(400, "RESOURCE_EXHAUSTED");
        assert_eq!(error.kind(), ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_config_error_is_configuration() {
        let error = DsaCoachError::ConfigError("llm.api_key is empty".to_string());
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_other_errors_are_request_failed() {
        let error = upstream(500, "Internal error");
        assert_eq!(error.kind(), ErrorKind::RequestFailed);
        assert_eq!(
            DsaCoachError::RetryExhausted.kind(),
            ErrorKind::RequestFailed
        );
    }

    // ====== Formatting & Conversion Tests ======

    #[test]
    fn test_upstream_display() {
        let error = upstream(503, "overloaded");
        assert_eq!(format!("{error}"), "gemini API error (503): overloaded");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: DsaCoachError = io_err.into();

        assert!(matches!(err, DsaCoachError::Io(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DsaCoachError = json_err.into();

        assert!(matches!(err, DsaCoachError::Serialization(_)));
    }
}
