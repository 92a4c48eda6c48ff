use std::time::Duration;

use tracing::{error, info, warn};

use super::{
    LoginAttempt, click_button, enter_2fa_token, enter_email, enter_password,
    extract_account_info,
};
use crate::accounts::AccountRecord;
use crate::element_interactor::ElementInteractor;
use crate::otp_uri::OtpProvider;
use crate::session::BrowserSession;
use crate::types::Selector;

/// "Continue with Google" flow, including Google's own authenticator step
///
/// Accounts may also have a separate application-level code, which shows up
/// as a second "Verify Your Identity" screen after Google lets the user in.
#[derive(Clone, Debug)]
pub struct GoogleLogin {
    pub login_button: Selector,
    pub email_input: Selector,
    pub password_input: Selector,
    pub next_button: Selector,
    pub try_another_way: Selector,
    pub authenticator_option: Selector,
    pub code_input: Selector,
    pub verify_identity: Selector,
    pub verify_code_input: Selector,
    pub verify_submit: Selector,
    /// How long to look for screens that are not always shown
    pub optional_screen_timeout: Duration,
}

impl Default for GoogleLogin {
    fn default() -> Self {
        Self {
            login_button: Selector::xpath("//button[span[contains(text(), 'Continue with Google')]]"),
            email_input: Selector::xpath("//input[@type='email']"),
            password_input: Selector::xpath("//input[@type='password']"),
            next_button: Selector::xpath("//button[span[contains(text(), 'Next')]]"),
            try_another_way: Selector::xpath("//button[span[text()='Try another way']]"),
            authenticator_option: Selector::xpath("//li[contains(.,'Google Authenticator')]"),
            code_input: Selector::xpath("//input[@id='totpPin']"),
            verify_identity: Selector::xpath("//*[contains(text(), 'Verify Your Identity')]"),
            verify_code_input: Selector::xpath("//input[@name='code']"),
            verify_submit: Selector::xpath("//button[@type='submit']"),
            optional_screen_timeout: Duration::from_secs(5),
        }
    }
}

impl GoogleLogin {
    pub async fn login<S: BrowserSession>(
        &self,
        interactor: &ElementInteractor<S>,
        identity: &str,
        record: &AccountRecord,
    ) -> bool {
        let Some(mut attempt) = extract_account_info(identity, record) else {
            return false;
        };

        attempt.success = click_button(interactor, &self.login_button, "Google login button")
            .await
            && enter_email(
                interactor,
                &attempt.identity,
                &self.email_input,
                &self.next_button,
            )
            .await
            && enter_password(
                interactor,
                &attempt.password,
                &self.password_input,
                &self.next_button,
            )
            .await
            && self.handle_2fa(interactor, &attempt).await;

        attempt.success
    }

    async fn handle_2fa<S: BrowserSession>(
        &self,
        interactor: &ElementInteractor<S>,
        attempt: &LoginAttempt,
    ) -> bool {
        if !self.choose_authenticator(interactor).await {
            return false;
        }

        let Some(token) = attempt.token(OtpProvider::Google) else {
            error!("No usable google OTP secret for {}", attempt.identity);
            return false;
        };

        if !enter_2fa_token(interactor, &token, &self.code_input, &self.next_button).await {
            return false;
        }

        self.verify_identity(interactor, attempt).await;
        true
    }

    /// Switch to the authenticator app when Google offers another method first
    async fn choose_authenticator<S: BrowserSession>(
        &self,
        interactor: &ElementInteractor<S>,
    ) -> bool {
        let Some(link) = interactor
            .probe(&self.try_another_way, self.optional_screen_timeout)
            .await
        else {
            info!("Google asks for the authenticator code directly");
            return true;
        };

        info!("Choosing Google Authenticator as second factor");
        interactor.click(&link).await
            && click_button(
                interactor,
                &self.authenticator_option,
                "Google Authenticator option",
            )
            .await
    }

    /// Second, application-level code screen; best-effort
    async fn verify_identity<S: BrowserSession>(
        &self,
        interactor: &ElementInteractor<S>,
        attempt: &LoginAttempt,
    ) {
        if interactor
            .probe(&self.verify_identity, self.optional_screen_timeout)
            .await
            .is_none()
        {
            return;
        }

        info!("Additional identity verification requested");
        let Some(token) = attempt.token(OtpProvider::ChatGpt) else {
            warn!("Identity verification requested but no chatgpt OTP secret is configured");
            return;
        };

        if !enter_2fa_token(
            interactor,
            &token,
            &self.verify_code_input,
            &self.verify_submit,
        )
        .await
        {
            warn!("Identity verification code was not accepted");
        }
    }
}
