//! # chatpilot
#![allow(clippy::uninlined_format_args)]
//!
//! WebDriver automation for chat web applications (ChatGPT by default):
//! log in, including OTP-based two-factor flows, send prompts and collect
//! the responses.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Anonymous chat, managed chromedriver
//! chatpilot --user-prompts "What is the meaning of life?" "Any productivity advice?"
//!
//! # Log in first; TEST_ACCOUNTS holds a base64 JSON account bundle
//! export TEST_ACCOUNTS=$(echo '{"alice@example.com":{"password":"...","secret":"JBSWY3DPEHPK3PXP"}}' | base64)
//! chatpilot --account alice@example.com --temporary-chat --user-prompts "Hello"
//!
//! # Use an already running chromedriver and print plain text
//! chatpilot --webdriver-url http://localhost:9515 --format simple --user-prompts "Hello"
//! ```
//!
//! Every flag has an environment variable counterpart, see `chatpilot --help`.
//!
//! ## Account Bundle
//!
//! ```json
//! {
//!   "alice@example.com": { "password": "...", "secret": "BASE32SECRET" },
//!   "bob@example.com": {
//!     "password": "...",
//!     "provider": "google",
//!     "secret": { "google": "BASE32SECRET", "chatgpt": "BASE32SECRET" }
//!   }
//! }
//! ```
//!
//! `provider` is one of `basic` (default), `google`, `microsoft` or `apple`.
//!
//! ## Library Usage
//!
//! ```no_run
//! use chatpilot::{AccountStore, ChatBot, ChatInteraction, ChromeSession, ElementInteractor};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let session = ChromeSession::connect("http://localhost:9515", true, "https://chatgpt.com").await?;
//! let chat = ChatInteraction::new(ElementInteractor::new(session), AccountStore::from_env()?);
//!
//! chat.open("https://chatgpt.com").await?;
//! if chat.login("alice@example.com").await {
//!     let transcript = ChatBot::new(&chat)
//!         .chat("You are a helpful assistant.", &["Hello".to_string()])
//!         .await;
//!     println!("{:?}", transcript);
//! }
//! chat.into_session().quit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## One-time Codes
//!
//! ```
//! use chatpilot::{OtpDescriptor, otp};
//!
//! let descriptor = OtpDescriptor::parse(
//!     "otpauth://totp/Example:alice@google.com?secret=JBSWY3DPEHPK3PXP&issuer=Example",
//! )
//! .unwrap();
//! assert_eq!(descriptor.id(), Some("alice"));
//! assert_eq!(otp::generate_at(&descriptor, 59).unwrap(), "996554");
//! ```

pub mod accounts;

/// Conversation loop over the orchestrator
pub mod chatbot;

pub mod config;

pub mod element_interactor;

/// Top-level errors and exit codes
pub mod errors;

/// Interaction orchestrator
pub mod interaction;

pub mod login;

/// Tracing bootstrap
pub mod logging;

pub mod otp;

pub mod otp_uri;

pub mod session;

/// Temporary chat mode
pub mod temporary_chat;

/// Shared type definitions
pub mod types;

/// WebDriver browser control
pub mod webdriver;

/// Automatic chromedriver process management
pub mod webdriver_manager;

#[cfg(test)]
pub(crate) mod fake_session;

pub use accounts::{AccountRecord, AccountStore, DecodeError};
pub use chatbot::ChatBot;
pub use config::{Configuration, Settings};
pub use element_interactor::ElementInteractor;
pub use errors::ChatpilotError;
pub use interaction::ChatInteraction;
pub use login::{LoginAttempt, LoginProvider, derive_login_provider, extract_account_info};
pub use otp_uri::{Algorithm, OtpDescriptor, OtpOptions, OtpProvider, OtpUriError, Subject};
pub use session::{BrowserSession, SessionError};
pub use types::{ChatTurn, OutputFormat, ResponseRetrieval, RetryPolicy, Selector};
pub use webdriver::ChromeSession;
