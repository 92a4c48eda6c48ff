#[cfg(test)]
mod tests {
    use super::super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            ChatpilotError::InvalidConfiguration("bad".into()).exit_code(),
            2
        );
        assert_eq!(ChatpilotError::WebDriverFailed("down".into()).exit_code(), 4);
        assert_eq!(ChatpilotError::Timeout("slow".into()).exit_code(), 5);
        assert_eq!(ChatpilotError::Other(anyhow!("boom")).exit_code(), 1);
    }

    #[test]
    fn test_decode_error_is_invalid_configuration() {
        let decode = crate::accounts::AccountStore::decode(Some("not base64!")).unwrap_err();
        let err: ChatpilotError = anyhow::Error::new(decode)
            .context("Failed to decode accounts")
            .into();

        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_classified_error_survives_anyhow() {
        let err: ChatpilotError =
            anyhow::Error::new(ChatpilotError::InvalidConfiguration("empty prompt".into())).into();

        assert!(matches!(err, ChatpilotError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_webdriver_context_is_detected() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let err: ChatpilotError = result
            .context("Failed to connect to WebDriver")
            .unwrap_err()
            .into();

        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_timeout_and_generic_errors() {
        let timeout: ChatpilotError = anyhow!("Response timed out").into();
        assert_eq!(timeout.exit_code(), 5);

        let other: ChatpilotError = anyhow!("Something else").into();
        assert_eq!(other.exit_code(), 1);
        assert_eq!(other.to_string(), "Something else");
    }
}
