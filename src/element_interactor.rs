//! Resilient element lookups and interactions
//!
//! Every find/click/type goes through [`ElementInteractor`], which retries
//! transient failures (late rendering, animations, overlays) a bounded number
//! of times. Nothing here returns an error: absence is `None`, failure is
//! `false`, and both are logged with the selector involved.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, warn};

use crate::session::{BrowserSession, SessionError};
use crate::types::{RetryPolicy, Selector};

/// What an element must satisfy to count as found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Readiness {
    /// Attached to the DOM
    Present,
    /// Attached and displayed
    Visible,
    /// Displayed and enabled
    Clickable,
}

/// Retrying wrapper around a [`BrowserSession`]
pub struct ElementInteractor<S: BrowserSession> {
    session: S,
    policy: RetryPolicy,
}

impl<S: BrowserSession> ElementInteractor<S> {
    pub fn new(session: S) -> Self {
        Self::with_policy(session, RetryPolicy::default())
    }

    pub fn with_policy(session: S, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Give the session back, e.g. to quit the browser
    pub fn into_session(self) -> S {
        self.session
    }

    /// Wait until an element is displayed and enabled, retrying whole waits
    pub async fn wait_for_clickable(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Option<S::Element> {
        let attempts = self.attempts();
        for attempt in 1..=attempts {
            if let Some(element) = self.poll(selector, Readiness::Clickable, timeout).await {
                return Some(element);
            }
            warn!(
                "Attempt {}: Element with {} not found or not clickable",
                attempt, selector
            );
            self.pause_between(attempt, attempts).await;
        }

        error!(
            "Failed to find clickable element with {} after {} attempts",
            selector, attempts
        );
        None
    }

    /// Wait until an element is attached to the DOM, retrying whole waits
    pub async fn find(&self, selector: &Selector, timeout: Duration) -> Option<S::Element> {
        let attempts = self.attempts();
        for attempt in 1..=attempts {
            if let Some(element) = self.poll(selector, Readiness::Present, timeout).await {
                return Some(element);
            }
            warn!(
                "Attempt {}: Failed to find element with {}",
                attempt, selector
            );
            self.pause_between(attempt, attempts).await;
        }

        error!(
            "Failed to find element with {} after {} attempts",
            selector, attempts
        );
        None
    }

    /// Single wait for a displayed element, without retries or error logs.
    /// Meant for screens that may legitimately never show up.
    pub async fn probe(&self, selector: &Selector, timeout: Duration) -> Option<S::Element> {
        let found = self.poll(selector, Readiness::Visible, timeout).await;
        debug!(
            "Probe for {}: {}",
            selector,
            if found.is_some() { "present" } else { "absent" }
        );
        found
    }

    /// All elements currently matching, without waiting
    pub async fn find_all(&self, selector: &Selector) -> Vec<S::Element> {
        match self.session.find_all(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("Lookup of {} failed: {}", selector, e);
                Vec::new()
            }
        }
    }

    /// Best-effort scroll, followed by a short settle delay
    pub async fn scroll_into_view(&self, element: &S::Element) {
        if let Err(e) = self.session.scroll_into_view(element).await {
            debug!("Could not scroll element into view: {}", e);
        }
        sleep(self.policy.settle_delay).await;
    }

    /// Click with a script-click fallback when the pointer click is intercepted
    pub async fn click(&self, element: &S::Element) -> bool {
        match self.try_click(element).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to click element: {}", e);
                false
            }
        }
    }

    async fn try_click(&self, element: &S::Element) -> Result<(), SessionError> {
        match self.session.click(element).await {
            Err(SessionError::ClickIntercepted(reason)) => {
                warn!(
                    "Click intercepted, retrying with JavaScript click: {}",
                    reason
                );
                self.session.script_click(element).await
            }
            other => other,
        }
    }

    /// Locate, scroll into view, then type `text` or click
    ///
    /// `None` and an empty string both mean click.
    pub async fn interact(&self, selector: &Selector, text: Option<&str>, timeout: Duration) -> bool {
        let attempts = self.attempts();
        for attempt in 1..=attempts {
            let Some(element) = self.wait_for_clickable(selector, timeout).await else {
                return false;
            };

            self.scroll_into_view(&element).await;

            let result = match text {
                Some(text) if !text.is_empty() => self.session.send_keys(&element, text).await,
                _ => self.try_click(&element).await,
            };

            match result {
                Ok(()) => return true,
                Err(e) if e.is_transient() => {
                    warn!("Attempt {} on {} failed: {}", attempt, selector, e);
                    self.pause_between(attempt, attempts).await;
                }
                Err(e) => {
                    error!("Failed to interact with element {}: {}", selector, e);
                    return false;
                }
            }
        }

        error!(
            "Failed to interact with element {} after {} attempts",
            selector, attempts
        );
        false
    }

    /// [`interact`](Self::interact) with the policy's default timeout
    pub async fn interact_default(&self, selector: &Selector, text: Option<&str>) -> bool {
        self.interact(selector, text, self.policy.default_timeout)
            .await
    }

    /// Poll until no matching element is displayed
    pub async fn wait_for_disappearance(&self, selector: &Selector, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.any_displayed(selector).await {
                return true;
            }
            if !self.wait_next_poll(deadline).await {
                error!("Element did not disappear: {}", selector);
                return false;
            }
        }
    }

    /// Poll until more than `count` elements match
    pub async fn wait_for_count_above(
        &self,
        selector: &Selector,
        count: usize,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.find_all(selector).await.len() > count {
                return true;
            }
            if !self.wait_next_poll(deadline).await {
                error!(
                    "Expected more than {} elements matching {}",
                    count, selector
                );
                return false;
            }
        }
    }

    fn attempts(&self) -> u32 {
        self.policy.max_retries.max(1)
    }

    async fn pause_between(&self, attempt: u32, attempts: u32) {
        if attempt < attempts {
            sleep(self.policy.retry_delay).await;
        }
    }

    /// One bounded wait: poll every `poll_interval` until found or `timeout` passes
    async fn poll(
        &self,
        selector: &Selector,
        readiness: Readiness,
        timeout: Duration,
    ) -> Option<S::Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.locate(selector, readiness).await {
                return Some(element);
            }
            if !self.wait_next_poll(deadline).await {
                return None;
            }
        }
    }

    /// Sleep until the next poll; `false` once the deadline has passed
    async fn wait_next_poll(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(self.policy.poll_interval.min(deadline - now)).await;
        true
    }

    async fn locate(&self, selector: &Selector, readiness: Readiness) -> Option<S::Element> {
        for element in self.find_all(selector).await {
            if self.is_ready(&element, readiness).await {
                return Some(element);
            }
        }
        None
    }

    async fn is_ready(&self, element: &S::Element, readiness: Readiness) -> bool {
        if readiness == Readiness::Present {
            return true;
        }

        // Stale or detached elements are simply not ready yet
        let displayed = self.session.is_displayed(element).await.unwrap_or(false);
        if readiness == Readiness::Visible || !displayed {
            return displayed;
        }

        self.session.is_enabled(element).await.unwrap_or(false)
    }

    async fn any_displayed(&self, selector: &Selector) -> bool {
        for element in self.find_all(selector).await {
            if self.session.is_displayed(&element).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "element_interactor_test.rs"]
mod element_interactor_test;
