//! Error type for the Document Intelligence PDF decoder.
//!
//! A single [`DecodeError`] covers the whole adapter. Variants are grouped by
//! the stage that produces them so callers can tell a misconfigured decoder
//! apart from a failed remote call, and either of those apart from a decode
//! that was stopped on request.
//!
//! Nothing here is retried locally: every variant reaches the caller as-is.

use thiserror::Error;

/// All errors returned by the decoder, its client, and its credentials.
#[derive(Debug, Error)]
pub enum DecodeError {
    // ── Configuration errors ─────────────────────────────────────────────
    /// `ApiKey` authentication was selected but no key was supplied.
    #[error("Azure AI Document Intelligence API key is empty")]
    MissingApiKey,

    /// The authentication mode is missing or not one the decoder supports.
    #[error("Azure AI Document Intelligence authentication type '{mode}' undefined or not supported")]
    UnsupportedAuthMode { mode: String },

    /// Builder or environment validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ─────────────────────────────────────────────────────
    /// The document could not be opened or read.
    #[error("Failed to read document: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    // ── Credential errors ────────────────────────────────────────────────
    /// No credential in the ambient chain could produce a token.
    #[error("Credential unavailable: {0}")]
    Credential(String),

    // ── Transport / service errors ───────────────────────────────────────
    /// The HTTP request itself failed (DNS, TLS, connection reset, timeout).
    #[error("Request to Document Intelligence failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("Document Intelligence returned HTTP {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// The analyze operation finished in the `failed` or `canceled` state.
    #[error("Document analysis failed ({code}): {message}")]
    AnalysisFailed { code: String, message: String },

    /// The service answered, but not with anything we can interpret.
    #[error("Malformed response from Document Intelligence: {0}")]
    MalformedResponse(String),

    // ── Cancellation ─────────────────────────────────────────────────────
    /// The caller's cancellation token fired before the decode completed.
    #[error("Decode cancelled")]
    Cancelled,
}

impl DecodeError {
    /// True for errors raised while constructing a decoder from its config.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DecodeError::MissingApiKey
                | DecodeError::UnsupportedAuthMode { .. }
                | DecodeError::InvalidConfig(_)
        )
    }

    /// True when the decode stopped because the caller asked it to.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DecodeError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_auth_display_names_mode() {
        let e = DecodeError::UnsupportedAuthMode {
            mode: "Kerberos".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'Kerberos'"), "got: {msg}");
        assert!(e.is_configuration());
    }

    #[test]
    fn service_display() {
        let e = DecodeError::Service {
            status: 401,
            code: "Unauthorized".into(),
            message: "Access denied".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 401"), "got: {msg}");
        assert!(msg.contains("Access denied"));
        assert!(!e.is_configuration());
        assert!(!e.is_cancelled());
    }

    #[test]
    fn cancelled_is_distinct() {
        assert!(DecodeError::Cancelled.is_cancelled());
        assert!(!DecodeError::Cancelled.is_configuration());
        assert!(!DecodeError::MalformedResponse("x".into()).is_cancelled());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: DecodeError = io.into();
        assert!(matches!(e, DecodeError::Io { .. }));
        assert!(e.to_string().contains("gone"));
    }
}
