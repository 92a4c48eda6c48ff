use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How an element is addressed on the page
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Selector::XPath(expression.into())
    }

    /// The raw selector text, without the strategy
    pub fn value(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css {}", s),
            Selector::XPath(s) => write!(f, "xpath {}", s),
        }
    }
}

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// How the newest response is read back from the page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseRetrieval {
    /// Visible text of the response element
    #[default]
    Text,
    /// The page's own "copy" button, read back from the clipboard.
    /// Falls back to `Text` when the button cannot be used.
    Clipboard,
}

/// Retry and timing knobs shared by every element interaction
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per find/click/interact operation
    pub max_retries: u32,
    /// Pause between two attempts
    pub retry_delay: Duration,
    /// Pause between two polls inside one attempt
    pub poll_interval: Duration,
    /// Pause after scrolling an element into view
    pub settle_delay: Duration,
    /// Timeout used when a caller has no better one
    pub default_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_millis(500),
            default_timeout: Duration::from_secs(10),
        }
    }
}

/// One prompt and the response it produced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Prompt that was sent
    pub prompt: String,
    /// Response text, `None` when it could not be retrieved
    pub response: Option<String>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
