//! Yandex Cloud API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Static tokens and service-account IAM token exchange
//! - [`client`] - Per-connection client for making API requests
//! - [`http`] - Retrying executor, request options and client cache
//!
//! # Example
//!
//! ```ignore
//! use ycsource::yc::{auth::Caches, client::{Api, YcClient}};
//!
//! async fn example(config: ycsource::ConnectionConfig) -> ycsource::Result<()> {
//!     let client = YcClient::new(config, &Caches::new())?;
//!     let zones = client.get_json(Api::Compute.url("zones", None)?).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

pub use auth::{Caches, TokenProvider};
pub use client::{Api, YcClient};
pub use http::{handle_http_error, HttpExecutor, RequestOptions};
