use super::click_button;
use crate::element_interactor::ElementInteractor;
use crate::session::BrowserSession;
use crate::types::Selector;

#[derive(Clone, Debug)]
pub struct AppleLogin {
    pub login_button: Selector,
}

impl Default for AppleLogin {
    fn default() -> Self {
        Self {
            login_button: Selector::css("button[data-testid='apple-login-button']"),
        }
    }
}

impl AppleLogin {
    /// Click "Continue with Apple"; the rest happens on Apple's pages
    pub async fn login<S: BrowserSession>(&self, interactor: &ElementInteractor<S>) -> bool {
        click_button(interactor, &self.login_button, "Apple login button").await
    }
}
