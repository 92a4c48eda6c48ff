use super::click_button;
use crate::element_interactor::ElementInteractor;
use crate::session::BrowserSession;
use crate::types::Selector;

/// Hands off to Microsoft's sign-in; credentials are entered there
#[derive(Clone, Debug)]
pub struct MicrosoftLogin {
    pub login_button: Selector,
}

impl Default for MicrosoftLogin {
    fn default() -> Self {
        Self {
            login_button: Selector::css("button[data-testid='microsoft-login-button']"),
        }
    }
}

impl MicrosoftLogin {
    pub async fn login<S: BrowserSession>(&self, interactor: &ElementInteractor<S>) -> bool {
        click_button(interactor, &self.login_button, "Microsoft login button").await
    }
}
