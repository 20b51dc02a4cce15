//! In-memory page session backed by static HTML.
//!
//! Serves pre-registered pages, evaluates selectors with `scraper`, and can be
//! told to time out on specific URLs. Harvest logic is exercised against it
//! without launching a browser.
//!
//! Test support only: the unit and integration tests use it in place of
//! [`ChromiumSession`](super::ChromiumSession). No command constructs one.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::session::{PageSession, SessionError};
use super::types::{ClickTarget, PageElement};

/// A canned page.
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    html: String,
    heights: Vec<u64>,
    redirect_to: Option<String>,
}

impl FixturePage {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    /// Scroll heights reported before the first scroll and after each one.
    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }

    /// Report `url` as the current URL after loading this page.
    pub fn redirects_to(mut self, url: impl Into<String>) -> Self {
        self.redirect_to = Some(url.into());
        self
    }
}

/// Page session over a fixed set of HTML documents.
#[derive(Debug, Default)]
pub struct FixtureSession {
    pages: HashMap<String, FixturePage>,
    timeouts: HashSet<String>,
    current: Option<(String, String)>,
    scroll_index: usize,
    visited: Vec<String>,
    clicks: Vec<String>,
    closed: bool,
}

impl FixtureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, page: FixturePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Make every load of `url` time out.
    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.timeouts.insert(url.into());
        self
    }

    /// URLs passed to `load`, in order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Selectors clicked, in order.
    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn current_page(&self) -> Result<(&str, &FixturePage), SessionError> {
        let (key, url) = self
            .current
            .as_ref()
            .ok_or_else(|| SessionError::Script("no page loaded".to_string()))?;
        let page = self
            .pages
            .get(key)
            .ok_or_else(|| SessionError::Script(format!("fixture missing for {}", key)))?;
        Ok((url.as_str(), page))
    }
}

#[async_trait]
impl PageSession for FixtureSession {
    async fn load(&mut self, url: &str) -> Result<(), SessionError> {
        self.visited.push(url.to_string());

        if self.timeouts.contains(url) {
            return Err(SessionError::Timeout {
                url: url.to_string(),
                timeout: Duration::from_secs(30),
            });
        }

        let page = self.pages.get(url).ok_or_else(|| SessionError::Navigation {
            url: url.to_string(),
            message: "no fixture registered".to_string(),
        })?;
        let resolved = page.redirect_to.clone().unwrap_or_else(|| url.to_string());

        self.current = Some((url.to_string(), resolved));
        self.scroll_index = 0;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        self.current_page().map(|(url, _)| url.to_string())
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<PageElement>, SessionError> {
        let (url, page) = self.current_page()?;
        select(&page.html, selector, url)
    }

    async fn click(&mut self, target: &ClickTarget, _wait: Duration) -> Result<(), SessionError> {
        let (url, page) = self.current_page()?;
        let found = select(&page.html, &target.selector, url)?
            .iter()
            .any(|el| target.matches_text(&el.text));

        if !found {
            return Err(SessionError::ElementNotFound {
                target: target.to_string(),
            });
        }
        self.clicks.push(target.selector.clone());
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64, SessionError> {
        let (_, page) = self.current_page()?;
        let idx = self.scroll_index.min(page.heights.len().saturating_sub(1));
        Ok(page.heights.get(idx).copied().unwrap_or(0))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        self.current_page()?;
        self.scroll_index += 1;
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }
}

/// Evaluate `selector` against `html`, resolving links relative to `base`.
fn select(html: &str, selector: &str, base: &str) -> Result<Vec<PageElement>, SessionError> {
    let selector = Selector::parse(selector)
        .map_err(|e| SessionError::Script(format!("invalid selector {:?}: {}", selector, e)))?;
    let document = Html::parse_document(html);
    let base = Url::parse(base).ok();

    Ok(document
        .select(&selector)
        .map(|el| snapshot(el, base.as_ref()))
        .collect())
}

fn snapshot(el: ElementRef<'_>, base: Option<&Url>) -> PageElement {
    let text = el.text().collect::<Vec<_>>().join(" ");
    let mut element = PageElement::new(text.split_whitespace().collect::<Vec<_>>().join(" "));

    for (name, value) in el.value().attrs() {
        let value = match (name, base) {
            ("href", Some(base)) => base
                .join(value)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| value.to_string()),
            _ => value.to_string(),
        };
        element.attributes.insert(name.to_string(), value);
    }
    element
}
