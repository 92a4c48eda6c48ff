//! Credential bundle decoding
//!
//! Accounts are supplied as a base64-encoded JSON object keyed by identity:
//!
//! ```json
//! {
//!   "alice@example.com": { "password": "...", "secret": "JBSWY3DPEHPK3PXP" },
//!   "bob@example.com": {
//!     "password": "...",
//!     "provider": "google",
//!     "secret": { "google": "...", "chatgpt": "..." }
//!   }
//! }
//! ```
//!
//! A plain string `secret` belongs to the chat service itself (`chatgpt`).

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::otp_uri::OtpProvider;

/// Errors raised while decoding an account bundle
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid base64 string in account bundle: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Account bundle is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid JSON format in account bundle: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attributes of one account
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default, rename = "secret", deserialize_with = "deserialize_secrets")]
    secrets: BTreeMap<String, String>,
}

impl AccountRecord {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_secret(mut self, provider: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(provider.into(), secret.into());
        self
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Login provider tag, `None` means basic
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Named OTP secrets, keyed by provider
    pub fn secrets(&self) -> &BTreeMap<String, String> {
        &self.secrets
    }

    pub fn secret(&self, provider: &str) -> Option<&str> {
        self.secrets.get(provider).map(String::as_str)
    }
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn deserialize_secrets<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SecretField {
        Single(String),
        Named(BTreeMap<String, String>),
    }

    Ok(match Option::<SecretField>::deserialize(deserializer)? {
        Some(SecretField::Single(secret)) => {
            BTreeMap::from([(OtpProvider::ChatGpt.as_str().to_string(), secret)])
        }
        Some(SecretField::Named(secrets)) => secrets,
        None => BTreeMap::new(),
    })
}

/// Decoded accounts, looked up by identity
#[derive(Clone, Debug, Default)]
pub struct AccountStore {
    accounts: BTreeMap<String, AccountRecord>,
}

impl AccountStore {
    /// Environment variable read by [`AccountStore::from_env`]
    pub const ENV_VAR: &'static str = "TEST_ACCOUNTS";

    /// Decode a base64 JSON bundle. Absent or blank input gives an empty store.
    pub fn decode(encoded: Option<&str>) -> Result<Self, DecodeError> {
        let Some(encoded) = encoded else {
            return Ok(Self::default());
        };

        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Ok(Self::default());
        }

        let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
        let json = String::from_utf8(bytes)?;
        let accounts: BTreeMap<String, AccountRecord> = serde_json::from_str(&json)?;

        Ok(Self { accounts })
    }

    /// Decode the bundle held in `TEST_ACCOUNTS`, if any
    pub fn from_env() -> Result<Self, DecodeError> {
        let encoded = std::env::var(Self::ENV_VAR).ok();
        Self::decode(encoded.as_deref())
    }

    pub fn from_records<I, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, AccountRecord)>,
        K: Into<String>,
    {
        Self {
            accounts: records
                .into_iter()
                .map(|(identity, record)| (identity.into(), record))
                .collect(),
        }
    }

    pub fn lookup(&self, identity: &str) -> Option<&AccountRecord> {
        self.accounts.get(identity)
    }

    /// Known identities, in sorted order
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
#[path = "accounts_test.rs"]
mod accounts_test;
