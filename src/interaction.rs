use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::accounts::AccountStore;
use crate::element_interactor::ElementInteractor;
use crate::login::derive_login_provider;
use crate::session::{BrowserSession, SessionError};
use crate::temporary_chat::TemporaryChat;
use crate::types::{ResponseRetrieval, Selector};

pub const LOGIN_BUTTON: &str = "button[data-testid='login-button']";
pub const CHAT_INPUT: &str = "textarea[id='prompt-textarea']";
pub const SEND_BUTTON: &str = "button[data-testid='send-button']";
/// Shown while a response is being generated
pub const STOP_BUTTON: &str = "button[data-testid='stop-button']";
pub const RESPONSE: &str = "div[data-message-author-role='assistant']";
/// Copy action of a conversation turn, relative to one of its ancestors
pub const COPY_BUTTON: &str = ".//button[@data-testid='copy-turn-action-button']";

/// How far up from a response the copy button is searched for
const MAX_ANCESTOR_DEPTH: usize = 8;

/// Default bound on how long a response may take to generate
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Drives the chat application: login, prompts and responses
pub struct ChatInteraction<S: BrowserSession> {
    interactor: ElementInteractor<S>,
    accounts: AccountStore,
    temporary_chat: TemporaryChat,
    retrieval: ResponseRetrieval,
    response_timeout: Duration,
}

impl<S: BrowserSession> ChatInteraction<S> {
    pub fn new(interactor: ElementInteractor<S>, accounts: AccountStore) -> Self {
        Self {
            interactor,
            accounts,
            temporary_chat: TemporaryChat::default(),
            retrieval: ResponseRetrieval::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_retrieval(mut self, retrieval: ResponseRetrieval) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn interactor(&self) -> &ElementInteractor<S> {
        &self.interactor
    }

    /// Give the browser session back, e.g. to quit it
    pub fn into_session(self) -> S {
        self.interactor.into_session()
    }

    /// Navigate to the application
    pub async fn open(&self, url: &str) -> Result<(), SessionError> {
        self.interactor.session().visit(url).await
    }

    /// Click the page's "Log in" entry point; a missing button is only logged
    pub async fn click_login_button(&self) {
        info!("Clicking the login button");
        if !self
            .interactor
            .interact_default(&Selector::css(LOGIN_BUTTON), None)
            .await
        {
            error!("Login button not found");
        }
    }

    /// Log in as `identity` with the strategy its account record asks for
    pub async fn login(&self, identity: &str) -> bool {
        info!("Starting login process");

        self.click_login_button().await;

        let Some(record) = self.accounts.lookup(identity) else {
            error!("Account details not found for {}", identity);
            return false;
        };

        derive_login_provider(record)
            .login(&self.interactor, identity, record)
            .await
    }

    pub async fn enable_temporary_chat(&self) -> bool {
        self.temporary_chat.enable(&self.interactor).await
    }

    /// Send `message` and wait for the reply
    ///
    /// Returns `None` when the message could not be sent or no new response
    /// showed up in time.
    pub async fn send_message(&self, message: &str) -> Option<String> {
        info!("Sending message: {}", message);
        let timeout = self.interactor.policy().default_timeout;

        let chat_input = Selector::css(CHAT_INPUT);
        let Some(input) = self.interactor.wait_for_clickable(&chat_input, timeout).await else {
            error!("Chat input not found");
            return None;
        };

        if let Err(e) = self.type_like_a_human(&input, message).await {
            error!("Failed to type message: {}", e);
            return None;
        }

        let responses = Selector::css(RESPONSE);
        let initial_count = self.interactor.find_all(&responses).await.len();

        if !self
            .interactor
            .interact_default(&Selector::css(SEND_BUTTON), None)
            .await
        {
            error!("Send button not found");
            return None;
        }

        let stop = Selector::css(STOP_BUTTON);
        if self.interactor.probe(&stop, timeout).await.is_none() {
            debug!("Generation indicator never showed up");
        }

        if !self
            .interactor
            .wait_for_disappearance(&stop, self.response_timeout)
            .await
        {
            error!("Stop button did not disappear");
            return None;
        }

        if !self
            .interactor
            .wait_for_count_above(&responses, initial_count, timeout)
            .await
        {
            error!("No new response appeared");
            return None;
        }

        self.retrieve_latest(&responses).await
    }

    /// One keystroke at a time with a random 50-200ms pause after each
    async fn type_like_a_human(&self, input: &S::Element, message: &str) -> Result<(), SessionError> {
        let mut buffer = [0u8; 4];
        for c in message.chars() {
            self.interactor
                .session()
                .send_keys(input, c.encode_utf8(&mut buffer))
                .await?;
            let delay = rand::thread_rng().gen_range(50..=200);
            sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }

    async fn retrieve_latest(&self, responses: &Selector) -> Option<String> {
        let Some(latest) = self.interactor.find_all(responses).await.pop() else {
            error!("Response disappeared before it could be read");
            return None;
        };

        if self.retrieval == ResponseRetrieval::Clipboard {
            if let Some(text) = self.copy_to_clipboard(&latest).await {
                return Some(text);
            }
            warn!("Clipboard retrieval failed, reading the response text instead");
        }

        match self.interactor.session().text(&latest).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to read response text: {}", e);
                None
            }
        }
    }

    /// Click the response's copy button and read the clipboard back
    async fn copy_to_clipboard(&self, response: &S::Element) -> Option<String> {
        let button = self.find_copy_button(response).await?;
        if !self.interactor.click(&button).await {
            return None;
        }

        sleep(self.interactor.policy().settle_delay).await;

        match self.interactor.session().read_clipboard().await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                debug!("Clipboard is empty after copying");
                None
            }
            Err(e) => {
                debug!("Could not read clipboard: {}", e);
                None
            }
        }
    }

    /// Nearest copy button, searching the response and then its ancestors
    async fn find_copy_button(&self, response: &S::Element) -> Option<S::Element> {
        let session = self.interactor.session();
        let copy_button = Selector::xpath(COPY_BUTTON);
        let parent = Selector::xpath("..");

        let mut node = response.clone();
        for _ in 0..MAX_ANCESTOR_DEPTH {
            if let Ok(buttons) = session.find_within(&node, &copy_button).await
                && let Some(button) = buttons.into_iter().next()
            {
                return Some(button);
            }

            node = session
                .find_within(&node, &parent)
                .await
                .ok()?
                .into_iter()
                .next()?;
        }

        debug!("No copy button within {} ancestors", MAX_ANCESTOR_DEPTH);
        None
    }
}

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;
