//! Yandex Cloud Authentication
//!
//! Resolves the bearer token for a connection: either the static token from
//! the config, or an IAM token exchanged for a signed JWT built from a
//! service account key file. Exchanged tokens are cached per key file.

use super::http::{HttpClientCache, RequestOptions};
use crate::config::ConnectionConfig;
use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::der::Decode;
use rsa::pkcs8::{PrivateKeyInfo, SecretDocument};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// IAM endpoint that exchanges a signed JWT for an IAM token
pub const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";

/// Token exchange always uses a 30 second client
const EXCHANGE_TIMEOUT_SECS: u64 = 30;

/// Lifetime of the signed JWT
const JWT_LIFETIME_SECS: i64 = 60 * 60;

/// Refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// rsaEncryption
const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";

/// An exchanged IAM token and its expiry
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Fresh while more than the expiry buffer remains
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS)
    }
}

/// IAM tokens keyed by service account key file path
#[derive(Clone, Default)]
pub struct TokenCache {
    entries: Arc<DashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key_path: &str) -> Option<CachedToken> {
        self.entries.get(key_path).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key_path: &str, token: CachedToken) {
        self.entries.insert(key_path.to_string(), token);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process-wide caches shared by every client built from them
#[derive(Clone, Default)]
pub struct Caches {
    pub tokens: TokenCache,
    pub clients: HttpClientCache,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Service account authorized key, as downloaded from the console
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    id: String,
    service_account_id: String,
    private_key: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    jwt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResponse {
    iam_token: String,
    #[serde(default)]
    expires_at: String,
}

/// Resolves bearer tokens for connections
#[derive(Clone, Default)]
pub struct TokenProvider {
    cache: TokenCache,
    clients: HttpClientCache,
}

impl TokenProvider {
    pub fn new(caches: &Caches) -> Self {
        Self {
            cache: caches.tokens.clone(),
            clients: caches.clients.clone(),
        }
    }

    /// Bearer token for a connection
    pub async fn resolve_token(&self, config: &ConnectionConfig) -> Result<String, AuthError> {
        config.validate()?;

        if let Some(token) = config.token() {
            return Ok(token.to_string());
        }

        let key_path = config.key_file().ok_or(AuthError::MissingKeyFile)?;
        let cache_key = key_path.to_string_lossy().into_owned();

        if let Some(cached) = self.cache.get(&cache_key) {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token);
            }
            tracing::debug!("Cached IAM token for {} is stale, refreshing", cache_key);
        }

        let key = read_key_file(key_path).await?;
        let jwt = sign_jwt(&key, Utc::now())?;
        let fresh = self
            .exchange(&jwt, &RequestOptions::from_config(config))
            .await?;

        tracing::info!(
            "IAM token issued for service account {}, expires at {}",
            key.service_account_id,
            fresh.expires_at
        );
        self.cache.insert(&cache_key, fresh.clone());
        Ok(fresh.token)
    }

    async fn exchange(&self, jwt: &str, options: &RequestOptions) -> Result<CachedToken, AuthError> {
        let client = self
            .clients
            .client(EXCHANGE_TIMEOUT_SECS)
            .map_err(AuthError::Client)?;

        let mut request = client
            .post(IAM_TOKEN_URL)
            .json(&ExchangeRequest { jwt })
            .build()
            .map_err(AuthError::Client)?;
        options.apply(&mut request);

        let url = request.url().to_string();
        tracing::debug!("POST {}", url);

        let response = client
            .execute(request)
            .await
            .map_err(|source| AuthError::Exchange {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AuthError::Exchange { url, source })?;

        if !status.is_success() {
            return Err(AuthError::ExchangeStatus {
                status: status.as_u16(),
                body: crate::error::truncate_body(&body),
            });
        }

        let parsed: ExchangeResponse =
            serde_json::from_str(&body).map_err(AuthError::ExchangeDecode)?;

        Ok(CachedToken {
            token: parsed.iam_token,
            expires_at: parse_expiry(&parsed.expires_at),
        })
    }
}

/// Unparsable expiry yields an already-stale token
fn parse_expiry(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("Unparsable IAM token expiry {:?}: {}", value, e);
            DateTime::<Utc>::MIN_UTC
        },
    }
}

async fn read_key_file(path: &Path) -> Result<ServiceAccountKey, AuthError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| AuthError::ReadKeyFile {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&content).map_err(AuthError::ParseKeyFile)
}

/// PKCS#8 PEM to an RS/PS signing key
///
/// Text before the first `-----BEGIN` line (console-issued keys carry a
/// banner there) is skipped.
fn encoding_key(private_key_pem: &str) -> Result<EncodingKey, AuthError> {
    let start = private_key_pem
        .find("-----BEGIN")
        .ok_or(AuthError::InvalidPem)?;
    let (_label, document) = SecretDocument::from_pem(private_key_pem[start..].trim())
        .map_err(|_| AuthError::InvalidPem)?;

    let info = PrivateKeyInfo::from_der(document.as_bytes())
        .map_err(|e| AuthError::ParsePkcs8(e.to_string()))?;
    if info.algorithm.oid.to_string() != RSA_ENCRYPTION_OID {
        return Err(AuthError::NotRsa);
    }

    let key = RsaPrivateKey::try_from(info).map_err(|e| AuthError::ParsePkcs8(e.to_string()))?;
    let pkcs1 = key
        .to_pkcs1_der()
        .map_err(|e| AuthError::ParsePkcs8(e.to_string()))?;
    Ok(EncodingKey::from_rsa_der(pkcs1.as_bytes()))
}

/// PS256 JWT for the IAM exchange, `kid` set to the key id
fn sign_jwt(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, AuthError> {
    let encoding_key = encoding_key(&key.private_key)?;

    let mut header = Header::new(Algorithm::PS256);
    header.kid = Some(key.id.clone());

    let claims = JwtClaims {
        iss: &key.service_account_id,
        aud: IAM_TOKEN_URL,
        iat: now.timestamp(),
        exp: now.timestamp() + JWT_LIFETIME_SECS,
    };

    jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(AuthError::Sign)
}
