use tracing::info;

use super::{enter_2fa_token, enter_email, enter_password, extract_account_info};
use crate::accounts::AccountRecord;
use crate::element_interactor::ElementInteractor;
use crate::otp_uri::OtpProvider;
use crate::session::BrowserSession;
use crate::types::Selector;

/// Email and password form of the application itself, with optional TOTP
#[derive(Clone, Debug)]
pub struct BasicLogin {
    pub email_input: Selector,
    pub continue_button: Selector,
    pub password_input: Selector,
    pub submit_button: Selector,
    pub code_input: Selector,
}

impl Default for BasicLogin {
    fn default() -> Self {
        Self {
            email_input: Selector::css("input[id='email-input']"),
            continue_button: Selector::css("button[class='continue-btn']"),
            password_input: Selector::css("input[id='password']"),
            submit_button: Selector::css("button[type='submit']"),
            code_input: Selector::css("input[id='code']"),
        }
    }
}

impl BasicLogin {
    pub async fn login<S: BrowserSession>(
        &self,
        interactor: &ElementInteractor<S>,
        identity: &str,
        record: &AccountRecord,
    ) -> bool {
        let Some(mut attempt) = extract_account_info(identity, record) else {
            return false;
        };

        if !enter_email(
            interactor,
            &attempt.identity,
            &self.email_input,
            &self.continue_button,
        )
        .await
        {
            return false;
        }

        if !enter_password(
            interactor,
            &attempt.password,
            &self.password_input,
            &self.submit_button,
        )
        .await
        {
            return false;
        }

        if attempt.descriptor(OtpProvider::ChatGpt).is_some() {
            let Some(token) = attempt.token(OtpProvider::ChatGpt) else {
                return false;
            };
            if !enter_2fa_token(interactor, &token, &self.code_input, &self.submit_button).await {
                return false;
            }
        } else {
            info!("No chatgpt OTP secret, skipping two-factor step");
        }

        attempt.success = true;
        attempt.success
    }
}
