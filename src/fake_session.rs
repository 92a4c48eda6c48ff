//! Scripted in-memory page used by unit tests
//!
//! Nodes are registered up front with the selector that finds them. Timing is
//! expressed in lookups: a node can show up only from the N-th `find_all` of
//! its selector, or vanish after it, which keeps tests independent of the
//! clock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::session::{BrowserSession, SessionError};
use crate::types::Selector;

/// Handle to a scripted node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FakeElement(usize);

/// Something the code under test did to the page
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Click(Selector),
    ScriptClick(Selector),
    Typed(Selector, String),
    Visit(String),
}

/// A node and its scripted behaviour
#[derive(Clone, Debug)]
pub struct FakeNode {
    selector: Selector,
    text: String,
    displayed: bool,
    enabled: bool,
    visible_from: usize,
    hidden_from: Option<usize>,
    intercepts: u32,
    stale_failures: u32,
    parent: Option<usize>,
}

impl FakeNode {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            text: String::new(),
            displayed: true,
            enabled: true,
            visible_from: 0,
            hidden_from: None,
            intercepts: 0,
            stale_failures: 0,
            parent: None,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Absent from the first `lookups` lookups of its selector
    pub fn appears_after(mut self, lookups: usize) -> Self {
        self.visible_from = lookups;
        self
    }

    /// Gone once its selector has been looked up `lookups` times
    pub fn vanishes_after(mut self, lookups: usize) -> Self {
        self.hidden_from = Some(lookups);
        self
    }

    /// Pointer clicks fail as intercepted this many times
    pub fn intercepts(mut self, times: u32) -> Self {
        self.intercepts = times;
        self
    }

    /// Clicks and typing fail with a stale reference this many times
    pub fn stale(mut self, times: u32) -> Self {
        self.stale_failures = times;
        self
    }

    pub fn within(mut self, parent: FakeElement) -> Self {
        self.parent = Some(parent.0);
        self
    }
}

#[derive(Default)]
struct PageState {
    nodes: Vec<FakeNode>,
    lookups: HashMap<Selector, usize>,
    actions: Vec<Action>,
    clipboard: Option<String>,
}

impl PageState {
    fn present(&self, index: usize, lookup: usize) -> bool {
        let node = &self.nodes[index];
        lookup >= node.visible_from && node.hidden_from.is_none_or(|hidden| lookup < hidden)
    }

    fn current_lookup(&self, selector: &Selector) -> usize {
        self.lookups.get(selector).copied().unwrap_or(0).saturating_sub(1)
    }
}

#[derive(Default)]
pub struct FakeSession {
    state: Mutex<PageState>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, node: FakeNode) -> FakeElement {
        let mut state = self.lock();
        state.nodes.push(node);
        FakeElement(state.nodes.len() - 1)
    }

    /// Shorthand for a visible, enabled node
    pub fn add_css(&self, css: &str) -> FakeElement {
        self.add(FakeNode::new(Selector::css(css)))
    }

    pub fn add_xpath(&self, xpath: &str) -> FakeElement {
        self.add(FakeNode::new(Selector::xpath(xpath)))
    }

    pub fn set_clipboard(&self, text: &str) {
        self.lock().clipboard = Some(text.to_string());
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    /// How many times `selector` was looked up at page level
    pub fn lookups(&self, selector: &Selector) -> usize {
        self.lock().lookups.get(selector).copied().unwrap_or(0)
    }

    /// Everything typed into elements found by `selector`, concatenated
    pub fn typed_into(&self, selector: &Selector) -> String {
        self.lock()
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::Typed(target, text) if target == selector => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Pointer and script clicks on elements found by `selector`
    pub fn clicks_on(&self, selector: &Selector) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|action| {
                matches!(action, Action::Click(target) | Action::ScriptClick(target) if target == selector)
            })
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn selector_of(&self, element: &FakeElement) -> Result<Selector, SessionError> {
        self.lock()
            .nodes
            .get(element.0)
            .map(|node| node.selector.clone())
            .ok_or_else(|| SessionError::StaleElement(format!("{:?}", element)))
    }

    fn take_stale_failure(&self, element: &FakeElement) -> Result<(), SessionError> {
        let mut state = self.lock();
        if let Some(node) = state.nodes.get_mut(element.0)
            && node.stale_failures > 0
        {
            node.stale_failures -= 1;
            return Err(SessionError::StaleElement(format!(
                "stale element reference: {}",
                node.selector
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn find_all(&self, selector: &Selector) -> Result<Vec<FakeElement>, SessionError> {
        let mut state = self.lock();
        let counter = state.lookups.entry(selector.clone()).or_insert(0);
        let lookup = *counter;
        *counter += 1;

        Ok((0..state.nodes.len())
            .filter(|&i| &state.nodes[i].selector == selector && state.present(i, lookup))
            .map(FakeElement)
            .collect())
    }

    async fn find_within(
        &self,
        parent: &FakeElement,
        selector: &Selector,
    ) -> Result<Vec<FakeElement>, SessionError> {
        let state = self.lock();

        if selector == &Selector::xpath("..") {
            return Ok(state
                .nodes
                .get(parent.0)
                .and_then(|node| node.parent)
                .map(FakeElement)
                .into_iter()
                .collect());
        }

        let is_descendant = |mut index: usize| {
            while let Some(up) = state.nodes[index].parent {
                if up == parent.0 {
                    return true;
                }
                index = up;
            }
            false
        };

        Ok((0..state.nodes.len())
            .filter(|&i| {
                &state.nodes[i].selector == selector
                    && is_descendant(i)
                    && state.present(i, state.current_lookup(selector))
            })
            .map(FakeElement)
            .collect())
    }

    async fn is_displayed(&self, element: &FakeElement) -> Result<bool, SessionError> {
        Ok(self
            .lock()
            .nodes
            .get(element.0)
            .is_some_and(|node| node.displayed))
    }

    async fn is_enabled(&self, element: &FakeElement) -> Result<bool, SessionError> {
        Ok(self
            .lock()
            .nodes
            .get(element.0)
            .is_some_and(|node| node.enabled))
    }

    async fn click(&self, element: &FakeElement) -> Result<(), SessionError> {
        self.take_stale_failure(element)?;
        let mut state = self.lock();
        let node = state
            .nodes
            .get_mut(element.0)
            .ok_or_else(|| SessionError::StaleElement(format!("{:?}", element)))?;

        if node.intercepts > 0 {
            node.intercepts -= 1;
            return Err(SessionError::ClickIntercepted(format!(
                "element click intercepted: {}",
                node.selector
            )));
        }

        let selector = node.selector.clone();
        state.actions.push(Action::Click(selector));
        Ok(())
    }

    async fn script_click(&self, element: &FakeElement) -> Result<(), SessionError> {
        let selector = self.selector_of(element)?;
        self.lock().actions.push(Action::ScriptClick(selector));
        Ok(())
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> Result<(), SessionError> {
        self.selector_of(element).map(|_| ())
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> Result<(), SessionError> {
        self.take_stale_failure(element)?;
        let selector = self.selector_of(element)?;
        self.lock()
            .actions
            .push(Action::Typed(selector, text.to_string()));
        Ok(())
    }

    async fn text(&self, element: &FakeElement) -> Result<String, SessionError> {
        self.lock()
            .nodes
            .get(element.0)
            .map(|node| node.text.clone())
            .ok_or_else(|| SessionError::StaleElement(format!("{:?}", element)))
    }

    async fn read_clipboard(&self) -> Result<String, SessionError> {
        self.lock()
            .clipboard
            .clone()
            .ok_or_else(|| SessionError::Driver("Clipboard is empty".to_string()))
    }

    async fn visit(&self, url: &str) -> Result<(), SessionError> {
        self.lock().actions.push(Action::Visit(url.to_string()));
        Ok(())
    }
}
