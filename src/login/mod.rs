//! Login strategies
//!
//! Each provider has its own struct carrying the selectors of its screens.
//! [`LoginProvider`] picks one from the account record and dispatches to it.
//! A login never returns an error: every failing step is logged and the
//! whole login reports `false`.

pub mod apple;
pub mod basic;
pub mod google;
pub mod microsoft;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::accounts::AccountRecord;
use crate::element_interactor::ElementInteractor;
use crate::otp;
use crate::otp_uri::{OtpDescriptor, OtpOptions, OtpProvider, construct_uri, derive_issuer};
use crate::session::BrowserSession;
use crate::types::Selector;

pub use apple::AppleLogin;
pub use basic::BasicLogin;
pub use google::GoogleLogin;
pub use microsoft::MicrosoftLogin;

/// Credentials prepared for one login
#[derive(Debug)]
pub struct LoginAttempt {
    pub identity: String,
    pub password: String,
    /// Descriptors keyed by provider name (`chatgpt`, `google`, ...)
    pub otp: HashMap<String, OtpDescriptor>,
    pub success: bool,
}

impl LoginAttempt {
    pub fn descriptor(&self, provider: OtpProvider) -> Option<&OtpDescriptor> {
        self.otp.get(provider.as_str())
    }

    /// Fresh token for `provider`, `None` when there is no usable secret
    pub fn token(&self, provider: OtpProvider) -> Option<String> {
        let descriptor = self.descriptor(provider)?;
        match otp::generate_for(descriptor) {
            Ok(token) => {
                debug!(
                    "Generated {} token, {}s left in window",
                    provider.as_str(),
                    otp::seconds_remaining(descriptor)
                );
                Some(token)
            }
            Err(e) => {
                error!("Failed to generate {} token: {}", provider.as_str(), e);
                None
            }
        }
    }
}

/// Validate a record and turn its secrets into OTP descriptors
///
/// Returns `None` when the identity is blank or the password is missing.
/// Secrets that do not form a valid descriptor are logged and skipped.
pub fn extract_account_info(identity: &str, record: &AccountRecord) -> Option<LoginAttempt> {
    if identity.trim().is_empty() {
        error!("Account identity is empty");
        return None;
    }

    let Some(password) = record.password().filter(|p| !p.is_empty()) else {
        error!("Password not found for account {}", identity);
        return None;
    };

    let mut descriptors = HashMap::new();
    for (provider, secret) in record.secrets() {
        let uri = construct_uri(
            identity,
            secret,
            &OtpOptions::with_issuer(derive_issuer(provider)),
        );
        match OtpDescriptor::parse(&uri) {
            Ok(descriptor) => {
                descriptors.insert(provider.clone(), descriptor);
            }
            Err(e) => warn!("Skipping {} OTP secret for {}: {}", provider, identity, e),
        }
    }

    Some(LoginAttempt {
        identity: identity.to_string(),
        password: password.to_string(),
        otp: descriptors,
        success: false,
    })
}

/// Type the identity into `input`, then click `submit`
pub async fn enter_email<S: BrowserSession>(
    interactor: &ElementInteractor<S>,
    email: &str,
    input: &Selector,
    submit: &Selector,
) -> bool {
    info!("Entering email");
    fill_and_submit(interactor, "email", email, input, submit).await
}

/// Type the password into `input`, then click `submit`
pub async fn enter_password<S: BrowserSession>(
    interactor: &ElementInteractor<S>,
    password: &str,
    input: &Selector,
    submit: &Selector,
) -> bool {
    info!("Entering password");
    fill_and_submit(interactor, "password", password, input, submit).await
}

/// Type a one-time code into `input`, then click `submit`
pub async fn enter_2fa_token<S: BrowserSession>(
    interactor: &ElementInteractor<S>,
    token: &str,
    input: &Selector,
    submit: &Selector,
) -> bool {
    info!("Entering 2FA token");
    fill_and_submit(interactor, "2FA token", token, input, submit).await
}

async fn fill_and_submit<S: BrowserSession>(
    interactor: &ElementInteractor<S>,
    what: &str,
    value: &str,
    input: &Selector,
    submit: &Selector,
) -> bool {
    if !interactor.interact_default(input, Some(value)).await {
        error!("Could not enter {} into {}", what, input);
        return false;
    }
    if !interactor.interact_default(submit, None).await {
        error!("Could not submit {} with {}", what, submit);
        return false;
    }
    true
}

/// Click a single element, logging `description` when it cannot be clicked
pub(crate) async fn click_button<S: BrowserSession>(
    interactor: &ElementInteractor<S>,
    selector: &Selector,
    description: &str,
) -> bool {
    if interactor.interact_default(selector, None).await {
        true
    } else {
        error!("{} not found or not clickable", description);
        false
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown login provider: {0}")]
pub struct UnknownProvider(pub String);

/// How an account signs in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoginProvider {
    #[default]
    Basic,
    Google,
    Microsoft,
    Apple,
}

impl LoginProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginProvider::Basic => "basic",
            LoginProvider::Google => "google",
            LoginProvider::Microsoft => "microsoft",
            LoginProvider::Apple => "apple",
        }
    }

    /// Run this provider's login flow for `identity`
    pub async fn login<S: BrowserSession>(
        &self,
        interactor: &ElementInteractor<S>,
        identity: &str,
        record: &AccountRecord,
    ) -> bool {
        info!("Logging in {} with {} login", identity, self);
        let success = match self {
            LoginProvider::Basic => {
                BasicLogin::default()
                    .login(interactor, identity, record)
                    .await
            }
            LoginProvider::Google => {
                GoogleLogin::default()
                    .login(interactor, identity, record)
                    .await
            }
            LoginProvider::Microsoft => MicrosoftLogin::default().login(interactor).await,
            LoginProvider::Apple => AppleLogin::default().login(interactor).await,
        };

        if success {
            info!("{} login completed for {}", self, identity);
        } else {
            error!("{} login failed for {}", self, identity);
        }
        success
    }
}

impl fmt::Display for LoginProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(LoginProvider::Basic),
            "google" => Ok(LoginProvider::Google),
            "microsoft" => Ok(LoginProvider::Microsoft),
            "apple" => Ok(LoginProvider::Apple),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Strategy for a record; missing or unknown providers fall back to basic
pub fn derive_login_provider(record: &AccountRecord) -> LoginProvider {
    match record.provider() {
        None => LoginProvider::Basic,
        Some(name) => name.parse().unwrap_or_else(|e: UnknownProvider| {
            warn!("{}, falling back to basic login", e);
            LoginProvider::Basic
        }),
    }
}

#[cfg(test)]
#[path = "../login_test.rs"]
mod login_test;
