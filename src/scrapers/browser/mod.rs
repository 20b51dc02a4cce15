//! Chrome DevTools page session.
//!
//! Uses chromiumoxide (CDP) to drive a single tab, either in a locally
//! launched Chrome or in a remote browser exposing a DevTools endpoint.

mod config;

pub use config::BrowserEngineConfig;

use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::error::CdpError;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use super::session::{PageSession, SessionError};
use super::types::{ClickTarget, PageElement};

/// Interval between element lookups while waiting for a click target.
#[cfg(feature = "browser")]
const CLICK_POLL: Duration = Duration::from_millis(250);

/// Resolves once the document is interactive.
#[cfg(feature = "browser")]
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
        }
    })
"#;

/// Browser page session over CDP.
#[cfg(feature = "browser")]
pub struct ChromiumSession {
    config: BrowserEngineConfig,
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[cfg(feature = "browser")]
impl ChromiumSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch (or connect to) a browser and open a blank tab.
    pub async fn start(config: BrowserEngineConfig) -> Result<Self, SessionError> {
        let (browser, mut handler) = match config.remote_url.clone() {
            Some(remote_url) => Self::connect_remote(&config, &remote_url).await?,
            None => Self::launch(&config).await?,
        };

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to open tab: {}", e)))?;
        page.execute(SetUserAgentOverrideParams::new(config.user_agent.clone()))
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to set user agent: {}", e)))?;

        Ok(Self {
            config,
            browser,
            page,
            handler,
        })
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf, SessionError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(SessionError::Browser(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or set browser.remote_url to an existing DevTools endpoint"
                .to_string(),
        ))
    }

    async fn launch(
        config: &BrowserEngineConfig,
    ) -> Result<(Browser, chromiumoxide::handler::Handler), SessionError> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(config.timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| SessionError::Browser(format!("Failed to build browser config: {}", e)))?;

        Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to launch browser: {}", e)))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(
        config: &BrowserEngineConfig,
        url: &str,
    ) -> Result<(Browser, chromiumoxide::handler::Handler), SessionError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        // The WebSocket URL comes from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| SessionError::Browser(format!("Bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SessionError::Browser("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| SessionError::Browser(format!("Failed to connect to remote browser: {}", e)))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout)
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, SessionError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

/// Script returning text and attributes of every element matching `selector`.
///
/// `href` is read from the DOM property so links come back absolute.
#[cfg(feature = "browser")]
fn query_script(selector: &str) -> String {
    // A JSON string literal is a valid JS string literal
    let selector = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"
        Array.from(document.querySelectorAll({selector})).map((el) => {{
            const attributes = {{}};
            for (const attr of el.attributes) {{
                attributes[attr.name] = attr.value;
            }}
            if (typeof el.href === 'string') {{
                attributes.href = el.href;
            }}
            return {{ text: (el.innerText || el.textContent || '').trim(), attributes }};
        }})
        "#
    )
}

/// Script clicking the first element matching `target`; resolves to whether
/// one was found.
#[cfg(feature = "browser")]
fn click_script(target: &ClickTarget) -> String {
    let selector = serde_json::to_string(&target.selector).unwrap_or_else(|_| "\"\"".to_string());
    let needle = serde_json::to_string(&target.text).unwrap_or_else(|_| "null".to_string());
    format!(
        r#"
        (() => {{
            const needle = {needle};
            const el = Array.from(document.querySelectorAll({selector}))
                .find((el) => needle === null || (el.innerText || el.textContent || '').includes(needle));
            if (!el) return false;
            el.click();
            return true;
        }})()
        "#
    )
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageSession for ChromiumSession {
    async fn load(&mut self, url: &str) -> Result<(), SessionError> {
        debug!("Navigating to {}", url);
        let timeout = self.timeout();

        let navigation = async {
            self.page.goto(url).await?;
            self.page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()).await
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(CdpError::Timeout)) | Err(_) => Err(SessionError::Timeout {
                url: url.to_string(),
                timeout,
            }),
            Ok(Err(e)) => Err(SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.page
            .url()
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .ok_or_else(|| SessionError::Script("page has no URL".to_string()))
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<PageElement>, SessionError> {
        self.evaluate(query_script(selector)).await
    }

    async fn click(&mut self, target: &ClickTarget, wait: Duration) -> Result<(), SessionError> {
        let deadline = tokio::time::Instant::now() + wait;
        let script = click_script(target);

        loop {
            if self.evaluate::<bool>(script.clone()).await? {
                debug!("Clicked {}", target);
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SessionError::ElementNotFound {
                    target: target.to_string(),
                });
            }
            tokio::time::sleep(CLICK_POLL).await;
        }
    }

    async fn scroll_height(&mut self) -> Result<u64, SessionError> {
        self.evaluate("document.body.scrollHeight".to_string()).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        self.evaluate::<serde_json::Value>(
            "window.scrollTo(0, document.body.scrollHeight); true".to_string(),
        )
        .await
        .map(|_| ())
    }

    async fn close(&mut self) {
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close tab: {}", e);
        }
        if self.config.remote_url.is_none() {
            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
        }
        self.handler.abort();
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromiumSession {
    _config: BrowserEngineConfig,
}

#[cfg(not(feature = "browser"))]
impl ChromiumSession {
    pub async fn start(_config: BrowserEngineConfig) -> Result<Self, SessionError> {
        Err(SessionError::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser".into(),
        ))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageSession for ChromiumSession {
    async fn load(&mut self, _url: &str) -> Result<(), SessionError> {
        Err(SessionError::Browser("Browser support not compiled".into()))
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        Err(SessionError::Browser("Browser support not compiled".into()))
    }

    async fn query(&mut self, _selector: &str) -> Result<Vec<PageElement>, SessionError> {
        Err(SessionError::Browser("Browser support not compiled".into()))
    }

    async fn click(&mut self, _target: &ClickTarget, _wait: Duration) -> Result<(), SessionError> {
        Err(SessionError::Browser("Browser support not compiled".into()))
    }

    async fn scroll_height(&mut self) -> Result<u64, SessionError> {
        Err(SessionError::Browser("Browser support not compiled".into()))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        Err(SessionError::Browser("Browser support not compiled".into()))
    }

    async fn close(&mut self) {}
}
