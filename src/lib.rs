//! Yandex Cloud resources as queryable tables
//!
//! Authenticates against Yandex Cloud (static token or service-account key
//! exchanged for an IAM token), fetches compute, VPC and billing resources
//! with bounded retries and pagination, and maps them onto table rows for a
//! host query engine.

pub mod config;
pub mod error;
pub mod host;
pub mod resource;
pub mod yc;

pub use config::{ConnectionConfig, LogLevel, RequestSettings};
pub use error::{AuthError, ConfigError, Error, Result};
pub use host::{QualMap, Qualifiers, Row, RowSink};
pub use yc::{Caches, YcClient};
