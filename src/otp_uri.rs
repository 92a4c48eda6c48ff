//! `otpauth://` URI parsing and construction
//!
//! A URI such as
//! `otpauth://totp/Example:alice@google.com?secret=JBSWY3DPEHPK3PXP&issuer=Example`
//! is turned into an [`OtpDescriptor`]. The path must read `environment:subject`;
//! a subject containing `@` is an opaque id (the part before the `@`), anything
//! else is a user name.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Issuer used when a provider has no dedicated one
pub const DEFAULT_ISSUER: &str = "OpenAI";

/// Errors raised while parsing an OTP URI
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpUriError {
    #[error("Invalid OTP URI: {0}")]
    Malformed(String),
    #[error("Invalid URI format: path must be 'environment:user', got '{0}'")]
    InvalidPath(String),
    #[error("Invalid URI format: subject after ':' is empty")]
    EmptySubject,
    #[error("Missing required query parameter 'secret'")]
    MissingSecret,
    #[error("Missing required query parameter 'issuer'")]
    MissingIssuer,
    #[error("Invalid 'digits' parameter: {0}")]
    InvalidDigits(String),
    #[error("Invalid 'period' parameter: {0}")]
    InvalidPeriod(String),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Providers that own an OTP secret in an account record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OtpProvider {
    /// Google account two-factor
    Google,
    /// The chat service's own two-factor
    ChatGpt,
}

impl OtpProvider {
    /// Key under which the provider's secret is stored
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpProvider::Google => "google",
            OtpProvider::ChatGpt => "chatgpt",
        }
    }
}

/// HMAC hash function of a TOTP
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha1 => "SHA1",
            Algorithm::Sha256 => "SHA256",
            Algorithm::Sha512 => "SHA512",
        }
    }
}

impl FromStr for Algorithm {
    type Err = OtpUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Ok(Algorithm::Sha1),
            "SHA256" => Ok(Algorithm::Sha256),
            "SHA512" => Ok(Algorithm::Sha512),
            _ => Err(OtpUriError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the OTP belongs to. Exactly one of the two forms is ever present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subject {
    /// Plain (percent-decoded) user name
    User(String),
    /// Opaque id, taken from the part before `@`
    Id(String),
}

/// Structured form of an OTP URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpDescriptor {
    environment: String,
    subject: Subject,
    secret: String,
    issuer: String,
    algorithm: Algorithm,
    digits: u32,
    period: u64,
}

impl OtpDescriptor {
    /// Parse an `otpauth://` URI
    pub fn parse(uri: &str) -> Result<Self, OtpUriError> {
        let url = Url::parse(uri).map_err(|e| OtpUriError::Malformed(e.to_string()))?;

        let path = url.path().trim_matches('/');
        let parts: Vec<&str> = path.split(':').collect();
        if parts.len() != 2 || parts[0].is_empty() {
            return Err(OtpUriError::InvalidPath(path.to_string()));
        }
        if parts[1].is_empty() {
            return Err(OtpUriError::EmptySubject);
        }

        let environment = parts[0].to_string();
        let subject = match parts[1].split_once('@') {
            Some((id, _)) => Subject::Id(id.to_string()),
            None => {
                let user = urlencoding::decode(parts[1])
                    .map_err(|e| OtpUriError::Malformed(e.to_string()))?;
                Subject::User(user.into_owned())
            }
        };

        let param = |name: &str| -> Option<String> {
            url.query_pairs()
                .filter(|(key, value)| key == name && !value.is_empty())
                .map(|(_, value)| value.into_owned())
                .next()
        };

        let secret = param("secret").ok_or(OtpUriError::MissingSecret)?;
        let issuer = param("issuer").ok_or(OtpUriError::MissingIssuer)?;

        let algorithm = match param("algorithm") {
            Some(value) => value.parse()?,
            None => Algorithm::default(),
        };
        let digits = match param("digits") {
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| OtpUriError::InvalidDigits(value))?,
            None => 6,
        };
        let period = match param("period") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|_| OtpUriError::InvalidPeriod(value))?,
            None => 30,
        };

        Ok(OtpDescriptor {
            environment,
            subject,
            secret,
            issuer,
            algorithm,
            digits,
            period,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// User name, when the subject is not an opaque id
    pub fn user(&self) -> Option<&str> {
        match &self.subject {
            Subject::User(user) => Some(user),
            Subject::Id(_) => None,
        }
    }

    /// Opaque id, when the subject contained `@`
    pub fn id(&self) -> Option<&str> {
        match &self.subject {
            Subject::Id(id) => Some(id),
            Subject::User(_) => None,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn period(&self) -> u64 {
        self.period
    }
}

impl FromStr for OtpDescriptor {
    type Err = OtpUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OtpDescriptor::parse(s)
    }
}

// The secret is left out on purpose so descriptors can be logged.
impl fmt::Display for OtpDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Environment: {}, User: {}, ID: {}, Issuer: {}, Algorithm: {}, Digits: {}, Period: {}",
            self.environment,
            self.user().unwrap_or("None"),
            self.id().unwrap_or("None"),
            self.issuer,
            self.algorithm,
            self.digits,
            self.period
        )
    }
}

/// Optional parts of a constructed OTP URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpOptions {
    pub issuer: String,
    pub algorithm: Algorithm,
    pub digits: u32,
    pub period: u64,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            algorithm: Algorithm::Sha1,
            digits: 6,
            period: 30,
        }
    }
}

impl OtpOptions {
    /// Default options with the given issuer
    pub fn with_issuer(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }
}

/// Build an `otpauth://totp/` URI with label `issuer:email`
pub fn construct_uri(email: &str, secret: &str, options: &OtpOptions) -> String {
    let label = format!("{}:{}", options.issuer, email);
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("secret", secret)
        .append_pair("issuer", &options.issuer)
        .append_pair("algorithm", options.algorithm.as_str())
        .append_pair("digits", &options.digits.to_string())
        .append_pair("period", &options.period.to_string())
        .finish();

    format!("otpauth://totp/{}?{}", label, query)
}

/// Human-readable issuer for a provider key
pub fn derive_issuer(provider: &str) -> &'static str {
    if provider == OtpProvider::Google.as_str() {
        "Google"
    } else {
        DEFAULT_ISSUER
    }
}

#[cfg(test)]
#[path = "otp_uri_test.rs"]
mod otp_uri_test;
