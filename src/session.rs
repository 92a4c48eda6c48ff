//! Browser session abstraction
//!
//! Everything above this module talks to the page through [`BrowserSession`].
//! [`crate::webdriver::ChromeSession`] implements it on top of fantoccini.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::types::Selector;

/// Failure of a single browser command
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No such element: {0}")]
    NoSuchElement(String),
    #[error("Element click intercepted: {0}")]
    ClickIntercepted(String),
    #[error("Stale element reference: {0}")]
    StaleElement(String),
    #[error("Operation timed out: {0}")]
    Timeout(String),
    #[error("WebDriver command failed: {0}")]
    Driver(String),
}

impl SessionError {
    /// Classify a driver error message by its WebDriver error code
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("click intercepted") || lower.contains("not interactable") {
            SessionError::ClickIntercepted(message)
        } else if lower.contains("stale element") {
            SessionError::StaleElement(message)
        } else if lower.contains("no such element") {
            SessionError::NoSuchElement(message)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            SessionError::Timeout(message)
        } else {
            SessionError::Driver(message)
        }
    }

    /// Whether repeating the same interaction may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::ClickIntercepted(_)
                | SessionError::StaleElement(_)
                | SessionError::Timeout(_)
        )
    }
}

/// Page operations the automation layer relies on
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Handle to an element on the page
    type Element: Clone + fmt::Debug + Send + Sync;

    /// All elements matching `selector`, empty when there are none
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self::Element>, SessionError>;

    /// Elements matching `selector` relative to `parent` (XPath `..` yields the parent node)
    async fn find_within(
        &self,
        parent: &Self::Element,
        selector: &Selector,
    ) -> Result<Vec<Self::Element>, SessionError>;

    async fn is_displayed(&self, element: &Self::Element) -> Result<bool, SessionError>;

    async fn is_enabled(&self, element: &Self::Element) -> Result<bool, SessionError>;

    /// Pointer-level click, as a user would perform it
    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    /// Click dispatched from page script, bypassing hit testing
    async fn script_click(&self, element: &Self::Element) -> Result<(), SessionError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), SessionError>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<(), SessionError>;

    /// Visible text of the element
    async fn text(&self, element: &Self::Element) -> Result<String, SessionError>;

    /// Text currently on the system clipboard, as seen by the page
    async fn read_clipboard(&self) -> Result<String, SessionError>;

    async fn visit(&self, url: &str) -> Result<(), SessionError>;
}
