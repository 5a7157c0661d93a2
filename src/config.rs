//! Connection Configuration
//!
//! The per-connection settings handed over by the host: credentials,
//! tenant scoping, request policy and logging verbosity.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Per-attempt timeout used when none (or zero) is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Attempts per request when retry is not configured
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Page size requested by table listings
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_newtype!(
    /// Static OAuth or IAM token
    Token
);
string_newtype!(CloudId);
string_newtype!(FolderId);
string_newtype!(UserAgent);
string_newtype!(
    /// Scheme and host substituted into every outgoing request
    EndpointOverride
);

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Token(\"\")")
        } else {
            f.write_str("Token(***)")
        }
    }
}

macro_rules! debug_as_str {
    ($($name:ident),*) => {
        $(impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        })*
    };
}

debug_as_str!(CloudId, FolderId, UserAgent, EndpointOverride);

/// Plugin log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    #[default]
    Error,
    Info,
    Debug,
}

impl LogLevel {
    /// Parse a level name; anything unrecognized falls back to `error`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            _ => Self::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
        }
    }
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<LogLevel> for String {
    fn from(value: LogLevel) -> Self {
        value.as_str().to_string()
    }
}

/// Effective timeout and retry policy for API calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSettings {
    pub timeout_secs: u64,
    pub retry: u32,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: DEFAULT_RETRY_COUNT,
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub token: Option<Token>,
    #[serde(default)]
    pub service_account_key_file: Option<PathBuf>,
    #[serde(default)]
    pub cloud_id: Option<CloudId>,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    /// Seconds per attempt
    #[serde(default)]
    pub timeout: Option<i64>,
    /// Attempts per request
    #[serde(default)]
    pub retry: Option<i64>,
    #[serde(default)]
    pub user_agent: Option<UserAgent>,
    #[serde(default)]
    pub endpoint_override: Option<EndpointOverride>,
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

impl ConnectionConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ycsource").join("connection.yaml"))
    }

    /// Load configuration from a YAML (or JSON) file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from the default location, or an empty config if there is none
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Check required and conflicting parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.token(), self.key_file()) {
            (None, None) => return Err(ConfigError::MissingCredentials),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingCredentials),
            _ => {},
        }
        if let Some(timeout) = self.timeout {
            if timeout < 0 {
                return Err(ConfigError::NegativeTimeout(timeout));
            }
        }
        if let Some(retry) = self.retry {
            if retry < 1 {
                return Err(ConfigError::InvalidRetry(retry));
            }
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(self.token.as_ref().map(Token::as_str))
    }

    pub fn key_file(&self) -> Option<&Path> {
        self.service_account_key_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn cloud_id(&self) -> Option<&str> {
        non_empty(self.cloud_id.as_ref().map(CloudId::as_str))
    }

    pub fn folder_id(&self) -> Option<&str> {
        non_empty(self.folder_id.as_ref().map(FolderId::as_str))
    }

    pub fn user_agent(&self) -> Option<&str> {
        non_empty(self.user_agent.as_ref().map(UserAgent::as_str))
    }

    pub fn endpoint_override(&self) -> Option<&str> {
        non_empty(self.endpoint_override.as_ref().map(EndpointOverride::as_str))
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }

    /// Timeout and retry with defaults applied
    pub fn settings(&self) -> RequestSettings {
        let timeout_secs = match self.timeout {
            Some(t) if t > 0 => t as u64,
            _ => DEFAULT_TIMEOUT_SECS,
        };
        let retry = match self.retry {
            Some(r) if r > 0 => u32::try_from(r).unwrap_or(u32::MAX),
            _ => DEFAULT_RETRY_COUNT,
        };
        RequestSettings { timeout_secs, retry }
    }
}
