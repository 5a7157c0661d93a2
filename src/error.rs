//! Error types
//!
//! A small closed set of error kinds so callers can branch on what went
//! wrong (configuration, authentication, transport, HTTP status, decoding)
//! instead of matching on message text.

use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of bytes of a response body kept inside an error
const MAX_ERROR_BODY_LENGTH: usize = 512;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Bad, missing or conflicting connection settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("either token or service_account_key_file must be set in connection config")]
    MissingCredentials,

    #[error("only one of token or service_account_key_file should be set, not both")]
    ConflictingCredentials,

    #[error("timeout must be >= 0, got {0}")]
    NegativeTimeout(i64),

    #[error("retry must be >= 1, got {0}")]
    InvalidRetry(i64),

    #[error("folder_id must be provided")]
    MissingFolderId,

    #[error("failed to load connection config {path}: {message}")]
    Load { path: PathBuf, message: String },
}

/// Failures while resolving a bearer token
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid connection config: {0}")]
    Config(#[from] ConfigError),

    #[error("token or service_account_key_file must be set in connection config")]
    MissingKeyFile,

    #[error("read key file {path}: {source}")]
    ReadKeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse key json: {0}")]
    ParseKeyFile(#[source] serde_json::Error),

    #[error("invalid PEM in private_key")]
    InvalidPem,

    #[error("parse pkcs8 key: {0}")]
    ParsePkcs8(String),

    #[error("key is not RSA")]
    NotRsa,

    #[error("sign jwt: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("iam request to {url}: {source}")]
    Exchange {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("iam http error {status}: {body}")]
    ExchangeStatus { status: u16, body: String },

    #[error("decode iam response: {0}")]
    ExchangeDecode(#[source] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Crate-wide error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("giving up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: Box<Error> },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("bearer token is not a valid header value")]
    InvalidToken,

    #[error("invalid qualifier {pair:?}: {reason}")]
    InvalidQualifier { pair: String, reason: String },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("row sink rejected item: {0}")]
    Sink(String),
}

impl Error {
    /// HTTP status behind this error, looking through retry exhaustion
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Auth(AuthError::ExchangeStatus { status, .. }) => Some(*status),
            Error::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Number of attempts made before this error surfaced
    pub fn attempts(&self) -> u32 {
        match self {
            Error::Exhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}

/// Cut `body` to at most `max_len` bytes on a char boundary, noting the
/// original size when anything was dropped
pub(crate) fn truncate_with_note(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
}

/// Truncate a response body for storage in an error value
pub(crate) fn truncate_body(body: &str) -> String {
    truncate_with_note(body, MAX_ERROR_BODY_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_looks_through_exhausted() {
        let err = Error::Exhausted {
            attempts: 5,
            last: Box::new(Error::Status {
                url: "https://compute.api.cloud.yandex.net/compute/v1/instances".into(),
                status: 503,
                body: "unavailable".into(),
            }),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.attempts(), 5);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_truncate_with_note() {
        // 'ж' is two bytes; a 3-byte cut lands inside the second one
        assert_eq!(truncate_with_note("жжж", 3), "ж... [truncated, 6 bytes total]");
        assert_eq!(truncate_with_note("жжж", 6), "жжж");
        assert_eq!(truncate_with_note("abcdef", 2), "ab... [truncated, 6 bytes total]");
    }

    #[test]
    fn test_truncate_body_keeps_char_boundary() {
        let body = "ж".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = truncate_body(&body);
        assert!(truncated.contains("truncated"));
        assert!(truncate_body("short").eq("short"));
    }
}
