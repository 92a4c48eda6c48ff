//! Time-based one-time passwords (RFC 6238)

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use thiserror::Error;

use crate::otp_uri::{Algorithm, OtpDescriptor, OtpOptions};

/// Errors raised while deriving a token
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("OTP secret is not valid base32")]
    InvalidSecret,
    #[error("Invalid OTP parameters: {0}")]
    InvalidParameters(String),
}

/// Current token for a base32 secret, using SHA1, 6 digits and a 30 second window
pub fn generate(secret: &str) -> Result<String, OtpError> {
    let options = OtpOptions::default();
    token(
        secret,
        options.algorithm,
        options.digits,
        options.period,
        unix_now(),
    )
}

/// Current token for a descriptor, honouring its algorithm, digits and period
pub fn generate_for(descriptor: &OtpDescriptor) -> Result<String, OtpError> {
    generate_at(descriptor, unix_now())
}

/// Token for a descriptor at a given unix time
pub fn generate_at(descriptor: &OtpDescriptor, unix_seconds: u64) -> Result<String, OtpError> {
    token(
        descriptor.secret(),
        descriptor.algorithm(),
        descriptor.digits(),
        descriptor.period(),
        unix_seconds,
    )
}

/// Seconds left before the descriptor's current token expires
pub fn seconds_remaining(descriptor: &OtpDescriptor) -> u64 {
    let period = descriptor.period().max(1);
    period - unix_now() % period
}

fn token(
    secret: &str,
    algorithm: Algorithm,
    digits: u32,
    period: u64,
    unix_seconds: u64,
) -> Result<String, OtpError> {
    if !(1..=9).contains(&digits) {
        return Err(OtpError::InvalidParameters(format!(
            "digits must be between 1 and 9, got {}",
            digits
        )));
    }
    if period == 0 {
        return Err(OtpError::InvalidParameters(
            "period must be greater than zero".to_string(),
        ));
    }

    let key = decode_secret(secret)?;
    let counter = (unix_seconds / period).to_be_bytes();
    let digest = sign(algorithm, &key, &counter)?;

    // Dynamic truncation
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let code = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    let value = u64::from(code) % 10u64.pow(digits);
    Ok(format!("{:0width$}", value, width = digits as usize))
}

fn sign(algorithm: Algorithm, key: &[u8], message: &[u8]) -> Result<Vec<u8>, OtpError> {
    let digest = match algorithm {
        Algorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key)
                .map_err(|e| OtpError::InvalidParameters(e.to_string()))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| OtpError::InvalidParameters(e.to_string()))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key)
                .map_err(|e| OtpError::InvalidParameters(e.to_string()))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(digest)
}

/// Decode a base32 secret. Case, whitespace and `=` padding are ignored.
fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
    let cleaned: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.is_empty() {
        return Err(OtpError::InvalidSecret);
    }

    base32::decode(base32::Alphabet::RFC4648 { padding: false }, &cleaned)
        .filter(|key| !key.is_empty())
        .ok_or(OtpError::InvalidSecret)
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
#[path = "otp_test.rs"]
mod otp_test;
