use std::fmt;

use crate::accounts::DecodeError;

/// Top-level failure of a run, carrying its process exit code
#[derive(Debug)]
pub enum ChatpilotError {
    /// Flags, environment or account bundle are unusable (exit code 2)
    InvalidConfiguration(String),
    /// WebDriver could not be started or reached (exit code 4)
    WebDriverFailed(String),
    /// Operation timeout (exit code 5)
    Timeout(String),
    /// Generic error (exit code 1)
    Other(anyhow::Error),
}

impl ChatpilotError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ChatpilotError::InvalidConfiguration(_) => 2,
            ChatpilotError::WebDriverFailed(_) => 4,
            ChatpilotError::Timeout(_) => 5,
            ChatpilotError::Other(_) => 1,
        }
    }
}

impl fmt::Display for ChatpilotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatpilotError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            ChatpilotError::WebDriverFailed(msg) => {
                write!(f, "WebDriver connection failed: {}", msg)
            }
            ChatpilotError::Timeout(msg) => {
                write!(f, "Operation timed out: {}", msg)
            }
            ChatpilotError::Other(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for ChatpilotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatpilotError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DecodeError> for ChatpilotError {
    fn from(err: DecodeError) -> Self {
        ChatpilotError::InvalidConfiguration(err.to_string())
    }
}

impl From<anyhow::Error> for ChatpilotError {
    fn from(err: anyhow::Error) -> Self {
        // Already classified somewhere down the stack
        let err = match err.downcast::<ChatpilotError>() {
            Ok(classified) => return classified,
            Err(err) => err,
        };
        if let Some(decode) = err.downcast_ref::<DecodeError>() {
            return ChatpilotError::InvalidConfiguration(decode.to_string());
        }

        // Fall back to the error message, including its context chain
        let msg = format!("{:#}", err);
        let lower = msg.to_lowercase();

        if lower.contains("webdriver") || lower.contains("chromedriver") {
            ChatpilotError::WebDriverFailed(msg)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ChatpilotError::Timeout(msg)
        } else {
            ChatpilotError::Other(err)
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
