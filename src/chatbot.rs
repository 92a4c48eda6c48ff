use tracing::{info, warn};

use crate::interaction::ChatInteraction;
use crate::session::BrowserSession;
use crate::types::ChatTurn;

/// Runs a scripted conversation: system prompt first, then each user prompt
pub struct ChatBot<'a, S: BrowserSession> {
    interaction: &'a ChatInteraction<S>,
}

impl<'a, S: BrowserSession> ChatBot<'a, S> {
    pub fn new(interaction: &'a ChatInteraction<S>) -> Self {
        Self { interaction }
    }

    /// Send every prompt in order and collect the transcript
    ///
    /// A prompt without a response is recorded with `response: None` and the
    /// conversation carries on.
    pub async fn chat(&self, system_prompt: &str, user_prompts: &[String]) -> Vec<ChatTurn> {
        info!("Starting chat with system prompt: {}", system_prompt);

        let mut transcript = Vec::with_capacity(user_prompts.len() + 1);
        transcript.push(self.turn(system_prompt).await);

        for prompt in user_prompts {
            info!("Sending user prompt: {}", prompt);
            transcript.push(self.turn(prompt).await);
        }

        transcript
    }

    async fn turn(&self, prompt: &str) -> ChatTurn {
        let response = self.interaction.send_message(prompt).await;
        match &response {
            Some(text) => info!("Response: {}", text),
            None => warn!("No response for prompt: {}", prompt),
        }

        ChatTurn {
            prompt: prompt.to_string(),
            response,
        }
    }
}

#[cfg(test)]
#[path = "chatbot_test.rs"]
mod chatbot_test;
