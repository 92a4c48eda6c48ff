//! Command line and environment configuration
//!
//! Every flag falls back to an environment variable and then to a built-in
//! default. [`Settings`] is resolved once into a [`Configuration`] before any
//! browser work starts, so a broken account bundle fails the run early.

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use crate::accounts::{AccountRecord, AccountStore};
use crate::errors::ChatpilotError;
use crate::types::{OutputFormat, ResponseRetrieval};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are ChatGPT, a helpful assistant.";
pub const DEFAULT_URL: &str = "https://chatgpt.com";

#[derive(Parser, Debug, Clone)]
#[command(name = "chatpilot", version)]
#[command(
    about = "Drive a chat web app through WebDriver: log in, send prompts, collect responses",
    long_about = None
)]
pub struct Settings {
    /// Prompt sent before the user prompts
    #[arg(long, env = "CHATPILOT_SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    /// Prompts to send, in order (newline-separated in the environment)
    #[arg(
        long,
        env = "CHATPILOT_USER_PROMPTS",
        required = true,
        num_args = 1..,
        value_delimiter = '\n'
    )]
    pub user_prompts: Vec<String>,

    /// Identity to log in with; no login when absent
    #[arg(long, env = "CHATPILOT_ACCOUNT")]
    pub account: Option<String>,

    /// Base64-encoded JSON account bundle
    #[arg(long, env = "TEST_ACCOUNTS", hide_env_values = true)]
    pub accounts: Option<String>,

    /// Switch the conversation to temporary chat before sending prompts
    #[arg(
        long,
        env = "CHATPILOT_TEMPORARY_CHAT",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub temporary_chat: bool,

    /// Run Chrome without a window
    #[arg(
        long,
        env = "CHATPILOT_HEADLESS",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub headless: bool,

    /// Application URL
    #[arg(long, env = "CHATPILOT_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Running WebDriver endpoint (a chromedriver is managed when absent)
    #[arg(long, env = "CHATPILOT_WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// How responses are read back
    #[arg(long, value_enum, env = "CHATPILOT_RETRIEVAL", default_value = "text")]
    pub retrieval: ResponseRetrieval,

    /// Seconds a single response may take to generate
    #[arg(long, env = "CHATPILOT_RESPONSE_TIMEOUT", default_value_t = 120)]
    pub response_timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

impl Settings {
    /// Validate settings and decode the account bundle
    pub fn into_configuration(self) -> Result<Configuration, ChatpilotError> {
        let accounts = AccountStore::decode(self.accounts.as_deref())?;

        url::Url::parse(&self.url).map_err(|e| {
            ChatpilotError::InvalidConfiguration(format!("--url {}: {}", self.url, e))
        })?;

        if let Some(webdriver_url) = &self.webdriver_url {
            url::Url::parse(webdriver_url).map_err(|e| {
                ChatpilotError::InvalidConfiguration(format!(
                    "--webdriver-url {}: {}",
                    webdriver_url, e
                ))
            })?;
        }

        let user_prompts: Vec<String> = self
            .user_prompts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if user_prompts.is_empty() {
            return Err(ChatpilotError::InvalidConfiguration(
                "at least one non-empty user prompt is required".to_string(),
            ));
        }

        if self.response_timeout == 0 {
            return Err(ChatpilotError::InvalidConfiguration(
                "--response-timeout must be positive".to_string(),
            ));
        }

        let account = self.account.filter(|a| !a.trim().is_empty());
        if let Some(identity) = &account
            && accounts.lookup(identity).is_none()
        {
            tracing::warn!("Account {} is not in the account bundle", identity);
        }

        Ok(Configuration {
            system_prompt: self.system_prompt,
            user_prompts,
            account,
            accounts,
            use_temporary_chat: self.temporary_chat,
            headless: self.headless,
            url: self.url,
            webdriver_url: self.webdriver_url,
            retrieval: self.retrieval,
            response_timeout: Duration::from_secs(self.response_timeout),
            format: self.format,
        })
    }
}

/// Resolved, immutable run configuration
#[derive(Debug, Clone)]
pub struct Configuration {
    pub system_prompt: String,
    pub user_prompts: Vec<String>,
    pub account: Option<String>,
    pub accounts: AccountStore,
    pub use_temporary_chat: bool,
    pub headless: bool,
    pub url: String,
    pub webdriver_url: Option<String>,
    pub retrieval: ResponseRetrieval,
    pub response_timeout: Duration,
    pub format: OutputFormat,
}

impl Configuration {
    pub fn get_account(&self, identity: &str) -> Option<&AccountRecord> {
        self.accounts.lookup(identity)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
