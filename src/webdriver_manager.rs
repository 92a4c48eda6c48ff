use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Port chromedriver listens on unless told otherwise
pub const DEFAULT_CHROMEDRIVER_PORT: u16 = 9515;

/// Manages chromedriver processes started on behalf of the CLI
pub struct WebDriverManager {
    processes: Arc<Mutex<Vec<WebDriverProcess>>>,
}

struct WebDriverProcess {
    child: Child,
    port: u16,
    url: String,
    #[cfg(unix)]
    process_group_id: Option<i32>,
}

impl Default for WebDriverManager {
    fn default() -> Self {
        Self {
            processes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl WebDriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a chromedriver is running and ready
    /// Returns the URL to connect to
    pub async fn ensure_driver(&self) -> Result<String> {
        let managed_urls: Vec<String> = self
            .lock_processes()
            .iter()
            .map(|p| p.url.clone())
            .collect();

        for url in managed_urls {
            if Self::is_driver_ready(&url).await {
                debug!("Using existing managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        // An externally started chromedriver on the standard port
        let standard_url = format!("http://localhost:{}", DEFAULT_CHROMEDRIVER_PORT);
        if Self::is_driver_ready(&standard_url).await {
            debug!("Found external WebDriver at {}", standard_url);
            return Ok(standard_url);
        }

        info!("WebDriver not detected, attempting to start chromedriver...");
        self.start_driver().await
    }

    /// Start a chromedriver process
    async fn start_driver(&self) -> Result<String> {
        let command = "chromedriver";
        let port = Self::find_free_port()?;
        info!("Starting {} on port {}", command, port);

        if !Self::command_exists(command) {
            anyhow::bail!(
                "{} not found in PATH. Please install it:\n\
                  macOS: brew install {}\n\
                  Linux: Download from https://googlechromelabs.github.io/chrome-for-testing/\n\
                  Or pass --webdriver-url to use a running driver",
                command,
                command
            );
        }

        let mut cmd = Command::new(command);
        cmd.arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // On Unix, create a new process group so we can kill the entire tree
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .context(format!("Failed to start {}", command))?;

        #[cfg(unix)]
        let process_group_id = Some(child.id() as i32);

        let url = format!("http://localhost:{}", port);

        self.lock_processes().push(WebDriverProcess {
            child,
            port,
            url: url.clone(),
            #[cfg(unix)]
            process_group_id,
        });

        // Wait for driver to be ready (3 seconds total)
        let max_attempts = 30;
        for attempt in 1..=max_attempts {
            if Self::is_driver_ready(&url).await {
                info!("WebDriver started successfully on port {}", port);
                return Ok(url);
            }
            if attempt < max_attempts {
                sleep(Duration::from_millis(100)).await;
            }
        }

        self.stop_process(port);
        anyhow::bail!("WebDriver failed to start within timeout")
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        let finder = "which";
        #[cfg(windows)]
        let finder = "where";

        Command::new(finder)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Find a free port, preferring the chromedriver defaults
    pub fn find_free_port() -> Result<u16> {
        for port in [
            DEFAULT_CHROMEDRIVER_PORT,
            DEFAULT_CHROMEDRIVER_PORT + 1,
            DEFAULT_CHROMEDRIVER_PORT + 2,
        ] {
            if !Self::is_port_in_use(port) {
                debug!("Found free port {}", port);
                return Ok(port);
            }
            debug!("Port {} is in use", port);
        }

        // Fall back to letting OS assign a port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    /// Check if a port is in use
    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Whether a WebDriver at `url` answers its status endpoint with `ready: true`
    pub async fn is_driver_ready(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(body) => body
                    .get("value")
                    .and_then(|v| v.get("ready"))
                    .and_then(|r| r.as_bool())
                    .unwrap_or(false),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Stop all managed WebDriver processes
    pub fn stop_all(&self) {
        let mut processes = self.lock_processes();
        for process in processes.iter_mut() {
            Self::terminate(process);
        }
        processes.clear();
    }

    fn stop_process(&self, port: u16) {
        let mut processes = self.lock_processes();
        if let Some(index) = processes.iter().position(|p| p.port == port) {
            let mut process = processes.remove(index);
            Self::terminate(&mut process);
        }
    }

    fn terminate(process: &mut WebDriverProcess) {
        debug!("Stopping WebDriver on port {}", process.port);

        #[cfg(unix)]
        if let Some(pgid) = process.process_group_id {
            Self::kill_process_group(pgid);
        }

        // Also try to kill the child process directly (fallback)
        let _ = process.child.kill();
        let _ = process.child.wait();
    }

    /// Kill a process group on Unix systems
    #[cfg(unix)]
    fn kill_process_group(pgid: i32) {
        // First try SIGTERM for graceful shutdown
        if let Err(e) = Command::new("kill")
            .args(["-TERM", &format!("-{}", pgid)])
            .output()
        {
            debug!("Failed to send SIGTERM to process group {}: {}", pgid, e);
        }

        std::thread::sleep(Duration::from_millis(100));

        if let Err(e) = Command::new("kill")
            .args(["-KILL", &format!("-{}", pgid)])
            .output()
        {
            debug!("Failed to send SIGKILL to process group {}: {}", pgid, e);
        }
    }

    fn lock_processes(&self) -> std::sync::MutexGuard<'_, Vec<WebDriverProcess>> {
        // A poisoned registry is still usable for cleanup
        self.processes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for WebDriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// Global WebDriver manager instance
lazy_static::lazy_static! {
    pub static ref GLOBAL_WEBDRIVER_MANAGER: WebDriverManager = WebDriverManager::new();
}

#[cfg(test)]
#[path = "webdriver_manager_test.rs"]
mod webdriver_manager_test;
