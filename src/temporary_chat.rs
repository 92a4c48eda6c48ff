use std::time::Duration;

use tracing::{error, info};

use crate::element_interactor::ElementInteractor;
use crate::session::BrowserSession;
use crate::types::Selector;

/// Menu, switch and marker of the temporary (unsaved) chat mode
#[derive(Clone, Debug)]
pub struct TemporaryChat {
    pub menu_button: Selector,
    pub switch: Selector,
    /// Confirmation popup, only shown the first time
    pub continue_button: Selector,
    pub marker: Selector,
    pub popup_timeout: Duration,
}

impl Default for TemporaryChat {
    fn default() -> Self {
        Self {
            menu_button: Selector::css("div[id^='radix-'][type='button']"),
            switch: Selector::css("button[role='switch'][aria-label='Temporary']"),
            continue_button: Selector::css("button.btn-primary"),
            marker: Selector::xpath("//div[text()='Temporary Chat']"),
            popup_timeout: Duration::from_secs(3),
        }
    }
}

impl TemporaryChat {
    /// Open the menu, flip the switch, confirm the popup and check the marker
    pub async fn enable<S: BrowserSession>(&self, interactor: &ElementInteractor<S>) -> bool {
        info!("Enabling temporary chat mode");

        if !interactor.interact_default(&self.menu_button, None).await {
            error!("Temporary chat menu button not found");
            return false;
        }

        if !interactor.interact_default(&self.switch, None).await {
            error!("Temporary chat switch not found");
            return false;
        }

        if let Some(button) = interactor
            .probe(&self.continue_button, self.popup_timeout)
            .await
            && !interactor.click(&button).await
        {
            error!("Temporary chat continue button could not be clicked");
            return false;
        }

        let timeout = interactor.policy().default_timeout;
        if interactor.find(&self.marker, timeout).await.is_some() {
            info!("Temporary chat mode enabled successfully");
            true
        } else {
            error!("Temporary chat verification text not found");
            false
        }
    }
}
