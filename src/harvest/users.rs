//! Watch-list harvest of users discovered through recent forum posts.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::{navigate, site_url, HarvestError};
use crate::extract::{list_url_from_profile, parse_watch_days, username_from_list_url, WatchColumns};
use crate::models::WatchEntry;
use crate::scrapers::{
    dismiss_cookie_popup, scroll_until_stable, ClickTarget, DelayConfig, PageSession, Pacer,
    SessionError,
};
use crate::storage::{HarvestPaths, RecordSink, SeenSet};

pub const FORUM_POST_LINKS: &str =
    "td[class*='forum_boardrow1']:not([align='right']) a[href^='/forum']";
pub const PROFILE_LINKS: &str = "a[href*='/profile']:not([class='forum-icon'])";
pub const STATS_BUTTON: &str = "a[id='show-stats-button']";
pub const STATS_PANEL: &str = "div[class='list-stats']";
pub const ENTRY_TITLES: &str = "td[class='data title clearfix'] > a[class='link sort']";
pub const ENTRY_SCORES: &str = "span[class*='score-label']";
pub const ENTRY_PROGRESS: &str = "td[class*='data progress']";
pub const ENTRY_STATUSES: &str = "td[class*='data status']";

/// Time allowed for the statistics button to become clickable.
pub const STATS_WAIT: Duration = Duration::from_secs(15);
/// Topics per forum board page.
pub const FORUM_PAGE_SIZE: usize = 50;

/// User harvest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHarvestConfig {
    /// Number of recent forum posts to mine for usernames.
    #[serde(default = "default_forum_posts")]
    pub forum_posts: usize,

    /// Lists with this many days of watch time or fewer are skipped.
    #[serde(default = "default_min_watch_days")]
    pub min_watch_days: f64,

    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
}

impl Default for UserHarvestConfig {
    fn default() -> Self {
        Self {
            forum_posts: default_forum_posts(),
            min_watch_days: default_min_watch_days(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
        }
    }
}

impl UserHarvestConfig {
    pub fn delay(&self) -> DelayConfig {
        DelayConfig::new(self.delay_min_ms, self.delay_max_ms)
    }
}

fn default_forum_posts() -> usize {
    50
}

fn default_min_watch_days() -> f64 {
    1.0
}

fn default_delay_min_ms() -> u64 {
    10_000
}

fn default_delay_max_ms() -> u64 {
    15_000
}

/// Counters for a finished user harvest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserHarvestSummary {
    pub forum_posts: usize,
    pub lists_found: usize,
    /// Lists skipped because the user was already harvested.
    pub already_seen: usize,
    pub harvested_users: usize,
    pub below_threshold: usize,
    /// Users whose list could not be read.
    pub failed: usize,
    pub entries_written: usize,
    pub entries_skipped: usize,
}

/// What a single list page yielded.
#[derive(Debug)]
enum ListScan {
    BelowThreshold(f64),
    Entries(WatchColumns),
}

/// Per-user failures; these never end the run.
#[derive(Debug, Error)]
enum ScanError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("unreadable list statistics {0:?}")]
    Stats(String),
}

/// Harvests watch lists into the user data file.
pub struct UserHarvester {
    base_url: String,
    config: UserHarvestConfig,
    pacer: Pacer,
    paths: HarvestPaths,
}

impl UserHarvester {
    pub fn new(base_url: impl Into<String>, config: UserHarvestConfig, paths: HarvestPaths) -> Self {
        let pacer = Pacer::new(config.delay());
        Self {
            base_url: base_url.into(),
            config,
            pacer,
            paths,
        }
    }

    /// Replace the courtesy delay.
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub async fn run<S: PageSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<UserHarvestSummary, HarvestError> {
        let mut seen = SeenSet::open(self.paths.usernames())?;
        let mut sink = RecordSink::<WatchEntry>::open(self.paths.user_data())?;
        info!("{} users already harvested", seen.len());

        navigate(session, &site_url(&self.base_url, "")).await?;
        dismiss_cookie_popup(session)
            .await
            .map_err(HarvestError::MissingPopup)?;

        let mut summary = UserHarvestSummary::default();
        let posts = self.collect_forum_posts(session).await?;
        summary.forum_posts = posts.len();

        let lists = self.collect_list_urls(session, &posts).await?;
        summary.lists_found = lists.len();
        info!("Found {} lists in {} forum posts", lists.len(), posts.len());

        for list_url in lists {
            if let Some(name) = username_from_list_url(&list_url) {
                if seen.contains(&name) {
                    debug!("Skipping {}, already harvested", name);
                    summary.already_seen += 1;
                    continue;
                }
            }

            navigate(session, &list_url).await?;
            self.pacer.pause().await;

            // The final URL carries the canonical username after redirects
            let final_url = session.current_url().await?;
            let Some(username) =
                username_from_list_url(&final_url).or_else(|| username_from_list_url(&list_url))
            else {
                warn!("No username in {}", final_url);
                summary.failed += 1;
                continue;
            };
            if seen.contains(&username) {
                summary.already_seen += 1;
                continue;
            }

            match self.scan_list(session).await {
                Ok(ListScan::BelowThreshold(days)) => {
                    info!("{}'s list has {} days of watch time, skipping", username, days);
                    summary.below_threshold += 1;
                }
                Ok(ListScan::Entries(columns)) => {
                    let zipped = columns.zip(&username);
                    for entry in &zipped.entries {
                        sink.append(entry)?;
                    }
                    if !zipped.skipped.is_empty() {
                        warn!(
                            "Skipped {} entries with missing fields on {}'s list",
                            zipped.skipped.len(),
                            username
                        );
                    }
                    info!("Saved {} entries for {}", zipped.entries.len(), username);
                    summary.harvested_users += 1;
                    summary.entries_written += zipped.entries.len();
                    summary.entries_skipped += zipped.skipped.len();
                }
                Err(e) => {
                    warn!("{}'s list could not be read: {}", username, e);
                    summary.failed += 1;
                }
            }

            seen.insert(&username)?;
        }

        Ok(summary)
    }

    async fn collect_forum_posts<S: PageSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<Vec<String>, HarvestError> {
        let mut posts = Vec::new();
        let mut known = HashSet::new();

        for show in (0..self.config.forum_posts).step_by(FORUM_PAGE_SIZE) {
            let url = site_url(&self.base_url, &format!("forum/?board=1&show={}", show));
            navigate(session, &url).await?;
            self.pacer.pause().await;

            for link in session.query(FORUM_POST_LINKS).await? {
                if let Some(href) = link.href() {
                    if known.insert(href.to_string()) {
                        posts.push(href.to_string());
                    }
                }
            }
        }
        Ok(posts)
    }

    /// Anime-list URLs of users linked from `posts`, in discovery order.
    async fn collect_list_urls<S: PageSession + ?Sized>(
        &self,
        session: &mut S,
        posts: &[String],
    ) -> Result<Vec<String>, HarvestError> {
        let site_host = Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        let mut lists = Vec::new();
        let mut known = HashSet::new();

        for post in posts {
            navigate(session, post).await?;
            self.pacer.pause().await;

            for link in session.query(PROFILE_LINKS).await? {
                let Some(href) = link.href() else { continue };
                let host = Url::parse(href)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string));
                if host != site_host {
                    continue;
                }
                if let Some(list) = list_url_from_profile(href) {
                    if known.insert(list.clone()) {
                        lists.push(list);
                    }
                }
            }
        }
        Ok(lists)
    }

    async fn scan_list<S: PageSession + ?Sized>(&self, session: &mut S) -> Result<ListScan, ScanError> {
        session
            .click(&ClickTarget::selector(STATS_BUTTON), STATS_WAIT)
            .await?;

        let stats = session
            .query(STATS_PANEL)
            .await?
            .into_iter()
            .next()
            .map(|el| el.text)
            .unwrap_or_default();
        let days = parse_watch_days(&stats).ok_or(ScanError::Stats(stats))?;
        if days <= self.config.min_watch_days {
            return Ok(ListScan::BelowThreshold(days));
        }

        scroll_until_stable(session, &self.pacer).await?;

        let text = |els: Vec<crate::scrapers::PageElement>| -> Vec<String> {
            els.into_iter().map(|el| el.text).collect()
        };
        Ok(ListScan::Entries(WatchColumns {
            titles: text(session.query(ENTRY_TITLES).await?),
            scores: text(session.query(ENTRY_SCORES).await?),
            progress: text(session.query(ENTRY_PROGRESS).await?),
            status_classes: session
                .query(ENTRY_STATUSES)
                .await?
                .into_iter()
                .map(|el| el.attr("class").unwrap_or_default().to_string())
                .collect(),
        }))
    }
}
