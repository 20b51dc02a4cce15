//! Abstract page session used by the harvesters.
//!
//! Harvest loops only need to navigate, query elements, click and scroll.
//! Any browser driver that can do those satisfies [`PageSession`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::pacing::Pacer;
use super::types::{ClickTarget, PageElement};

/// Errors raised by a page session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("No element matched {target}")]
    ElementNotFound { target: String },

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Browser unavailable: {0}")]
    Browser(String),
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Capability a browser session must provide to drive a harvest.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to `url` and wait until its DOM is ready.
    async fn load(&mut self, url: &str) -> Result<(), SessionError>;

    /// URL of the currently loaded page, after redirects.
    async fn current_url(&mut self) -> Result<String, SessionError>;

    /// All elements matching a CSS selector on the current page.
    async fn query(&mut self, selector: &str) -> Result<Vec<PageElement>, SessionError>;

    /// Click the first element matching `target`, waiting up to `wait` for it
    /// to appear.
    async fn click(&mut self, target: &ClickTarget, wait: Duration) -> Result<(), SessionError>;

    /// Current document scroll height in pixels.
    async fn scroll_height(&mut self) -> Result<u64, SessionError>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), SessionError>;

    /// Tear down the session.
    async fn close(&mut self);
}

/// Scroll to the bottom until a scroll leaves the page height unchanged.
///
/// Stops after the first scroll that does not grow the document. Used for
/// infinite-scroll lists; returns the number of scrolls performed.
pub async fn scroll_until_stable<S: PageSession + ?Sized>(
    session: &mut S,
    pacer: &Pacer,
) -> Result<u32, SessionError> {
    let mut last_height = session.scroll_height().await?;
    let mut scrolls = 0;

    loop {
        session.scroll_to_bottom().await?;
        scrolls += 1;
        pacer.pause().await;

        let new_height = session.scroll_height().await?;
        debug!("Scrolled to height {} (was {})", new_height, last_height);
        if new_height == last_height {
            return Ok(scrolls);
        }
        last_height = new_height;
    }
}

/// Time allowed for the cookie consent popup to appear.
pub const POPUP_WAIT: Duration = Duration::from_secs(20);

/// Dismiss the site's cookie consent popup.
pub async fn dismiss_cookie_popup<S: PageSession + ?Sized>(
    session: &mut S,
) -> Result<(), SessionError> {
    let target = ClickTarget::with_text("button", "OK");
    session.click(&target, POPUP_WAIT).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::fixture::{FixturePage, FixtureSession};

    #[tokio::test]
    async fn test_scroll_until_stable_stops_on_unchanged_height() {
        let mut session = FixtureSession::new().with_page(
            "https://example.test/list",
            FixturePage::html("<html></html>").with_heights(vec![1000, 2000, 3000, 3000, 4000]),
        );
        session.load("https://example.test/list").await.unwrap();

        let scrolls = scroll_until_stable(&mut session, &Pacer::none()).await.unwrap();
        assert_eq!(scrolls, 3);
    }

    #[tokio::test]
    async fn test_dismiss_cookie_popup() {
        let mut session = FixtureSession::new().with_page(
            "https://example.test/",
            FixturePage::html("<button class='css-47sehv'>OK</button>"),
        );
        session.load("https://example.test/").await.unwrap();
        dismiss_cookie_popup(&mut session).await.unwrap();
        assert_eq!(session.clicks(), &["button".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_cookie_popup() {
        let mut session = FixtureSession::new()
            .with_page("https://example.test/", FixturePage::html("<p>hi</p>"));
        session.load("https://example.test/").await.unwrap();
        let err = dismiss_cookie_popup(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::ElementNotFound { .. }));
    }
}
