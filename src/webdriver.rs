use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::session::{BrowserSession, SessionError};
use crate::types::Selector;
use crate::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

/// Script hiding the WebDriver flag from page scripts
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Chrome session driven through chromedriver
pub struct ChromeSession {
    client: Client,
    // Keeps the temporary user-data directory alive for the session
    _profile_dir: tempfile::TempDir,
}

impl From<CmdError> for SessionError {
    fn from(err: CmdError) -> Self {
        SessionError::classify(err.to_string())
    }
}

fn locator(selector: &Selector) -> Locator<'_> {
    match selector {
        Selector::Css(css) => Locator::Css(css),
        Selector::XPath(xpath) => Locator::XPath(xpath),
    }
}

fn element_arg(element: &Element) -> Result<serde_json::Value, SessionError> {
    serde_json::to_value(element).map_err(|e| SessionError::Driver(e.to_string()))
}

impl ChromeSession {
    /// Connect to chromedriver and open a fresh Chrome window
    ///
    /// # Arguments
    /// * `webdriver_url` - chromedriver endpoint, e.g. `http://localhost:9515`
    /// * `headless` - Whether to run without a visible window
    /// * `app_url` - Application origin granted clipboard access
    pub async fn connect(webdriver_url: &str, headless: bool, app_url: &str) -> Result<Self> {
        info!("Connecting to Chrome WebDriver at {}", webdriver_url);

        // Chrome is strict about profile directory reuse, so every session gets its own
        let profile_dir = tempfile::Builder::new()
            .prefix("chatpilot-chrome-")
            .tempdir()?;

        let caps = Self::capabilities(headless, app_url, &profile_dir);

        let client = match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(webdriver_url)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("Session is already started")
                    || error_str.contains("session not created")
                {
                    info!("WebDriver appears to be in a bad state, attempting recovery...");

                    GLOBAL_WEBDRIVER_MANAGER.stop_all();
                    tokio::time::sleep(Duration::from_millis(500)).await;

                    let new_url = GLOBAL_WEBDRIVER_MANAGER
                        .ensure_driver()
                        .await
                        .context("Failed to restart WebDriver after recovery")?;

                    ClientBuilder::rustls()
                        .capabilities(caps)
                        .connect(&new_url)
                        .await
                        .context("Failed to connect to WebDriver after restart")?
                } else {
                    return Err(e).context("Failed to connect to WebDriver");
                }
            }
        };

        if let Err(e) = client.execute(HIDE_WEBDRIVER_SCRIPT, vec![]).await {
            debug!("Could not hide navigator.webdriver: {}", e);
        }

        Ok(ChromeSession {
            client,
            _profile_dir: profile_dir,
        })
    }

    fn capabilities(
        headless: bool,
        app_url: &str,
        profile_dir: &tempfile::TempDir,
    ) -> serde_json::Map<String, serde_json::Value> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-extensions".to_string(),
        ];

        if headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }

        args.push(format!("--user-data-dir={}", profile_dir.path().display()));

        // Allow the application to read the clipboard without a permission prompt
        let clipboard_pattern = url::Url::parse(app_url)
            .ok()
            .and_then(|u| {
                Some(format!(
                    "{}://{}:{},*",
                    u.scheme(),
                    u.host_str()?,
                    u.port_or_known_default()?
                ))
            })
            .unwrap_or_else(|| format!("{},*", app_url.trim_end_matches('/')));

        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "prefs": {
                    "profile.managed_default_content_settings.clipboard": 1,
                    "profile.content_settings.exceptions.clipboard": {
                        clipboard_pattern: { "setting": 1 }
                    }
                }
            }),
        );
        caps
    }

    /// Close the browser window and end the WebDriver session
    pub async fn quit(self) -> Result<()> {
        info!("Closing browser");
        self.client.close().await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Element>, SessionError> {
        Ok(self.client.find_all(locator(selector)).await?)
    }

    async fn find_within(
        &self,
        parent: &Element,
        selector: &Selector,
    ) -> Result<Vec<Element>, SessionError> {
        Ok(parent.find_all(locator(selector)).await?)
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool, SessionError> {
        Ok(element.is_displayed().await?)
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, SessionError> {
        Ok(element.is_enabled().await?)
    }

    async fn click(&self, element: &Element) -> Result<(), SessionError> {
        // Element Click rather than an action chain: only it reports interception
        Ok(element.click().await?)
    }

    async fn script_click(&self, element: &Element) -> Result<(), SessionError> {
        self.client
            .execute("arguments[0].click();", vec![element_arg(element)?])
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), SessionError> {
        self.client
            .execute(
                "arguments[0].scrollIntoView({block: 'center'});",
                vec![element_arg(element)?],
            )
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), SessionError> {
        Ok(element.send_keys(text).await?)
    }

    async fn text(&self, element: &Element) -> Result<String, SessionError> {
        Ok(element.text().await?)
    }

    async fn read_clipboard(&self) -> Result<String, SessionError> {
        let script = r#"
            const done = arguments[arguments.length - 1];
            navigator.clipboard.readText().then(done).catch(() => done(null));
        "#;

        match self.client.execute_async(script, vec![]).await? {
            serde_json::Value::String(text) => Ok(text),
            _ => Err(SessionError::Driver(
                "Clipboard is empty or not readable".to_string(),
            )),
        }
    }

    async fn visit(&self, url: &str) -> Result<(), SessionError> {
        if url.is_empty() {
            return Err(SessionError::Driver("URL is required".to_string()));
        }

        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        // Wait for the page to be ready (max 2 seconds)
        let wait_script = "return document.readyState === 'complete';";
        for _ in 0..20 {
            match self.client.execute(wait_script, vec![]).await {
                Ok(serde_json::Value::Bool(true)) => break,
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        let _ = self.client.execute(HIDE_WEBDRIVER_SCRIPT, vec![]).await;

        // Let client-side rendering finish, with some human-looking jitter
        let settle_ms = rand::thread_rng().gen_range(2000..5000);
        debug!("Waiting {}ms for the page to settle", settle_ms);
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;

        Ok(())
    }
}
