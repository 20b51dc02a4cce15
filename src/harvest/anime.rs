//! Anime detail harvest driven by the top-anime ranking.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{navigate, site_url, HarvestError};
use crate::extract::parse_anime_info;
use crate::models::AnimeRecord;
use crate::scrapers::{DelayConfig, PageSession, Pacer};
use crate::storage::{CheckpointStore, HarvestPaths, RecordSink};

/// Detail page links on a ranking page.
pub const ITEM_LINKS: &str = ".anime_ranking_h3 a";
/// English title, present only for some entries.
pub const ENGLISH_TITLE: &str = ".h1-title .title-english";
/// Default title.
pub const MAIN_TITLE: &str = ".h1-title strong";
/// Information panel blocks of a detail page.
pub const INFO_PANEL: &str = ".leftside .spaceit_pad";

/// Anime harvest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeHarvestConfig {
    /// Number of ranked titles to harvest.
    #[serde(default = "default_total_items")]
    pub total_items: u64,

    /// Entries per ranking page. At most this many links are taken from
    /// each page; the next page is requested from the advanced cursor.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
}

impl Default for AnimeHarvestConfig {
    fn default() -> Self {
        Self {
            total_items: default_total_items(),
            page_size: default_page_size(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
        }
    }
}

impl AnimeHarvestConfig {
    pub fn delay(&self) -> DelayConfig {
        DelayConfig::new(self.delay_min_ms, self.delay_max_ms)
    }
}

fn default_total_items() -> u64 {
    12831
}

fn default_page_size() -> u64 {
    50
}

fn default_delay_min_ms() -> u64 {
    3000
}

fn default_delay_max_ms() -> u64 {
    5000
}

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// The cursor reached the configured total.
    Completed,
    /// A ranking page listed no entries before the total was reached.
    Exhausted,
}

/// Result of a finished anime harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimeHarvestSummary {
    /// Cursor when the run started.
    pub resumed_from: u64,
    /// Cursor when the run ended.
    pub cursor: u64,
    pub outcome: HarvestOutcome,
}

impl AnimeHarvestSummary {
    pub fn harvested(&self) -> u64 {
        self.cursor - self.resumed_from
    }
}

/// Harvests anime detail pages into the anime data file.
pub struct AnimeHarvester {
    base_url: String,
    config: AnimeHarvestConfig,
    pacer: Pacer,
    checkpoint: CheckpointStore,
    paths: HarvestPaths,
}

impl AnimeHarvester {
    pub fn new(base_url: impl Into<String>, config: AnimeHarvestConfig, paths: HarvestPaths) -> Self {
        let pacer = Pacer::new(config.delay());
        Self {
            base_url: base_url.into(),
            checkpoint: CheckpointStore::new(paths.anime_checkpoint()),
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

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    fn list_url(&self, cursor: u64) -> String {
        site_url(&self.base_url, &format!("topanime.php?limit={}", cursor))
    }

    /// Run until the total is reached, the ranking runs out, or a page fails
    /// to load.
    ///
    /// `progress` is called with the cursor at start and after every
    /// persisted record.
    pub async fn run<S, F>(
        &self,
        session: &mut S,
        mut progress: F,
    ) -> Result<AnimeHarvestSummary, HarvestError>
    where
        S: PageSession + ?Sized,
        F: FnMut(u64),
    {
        let total = self.config.total_items;
        let mut cursor = self.checkpoint.load()?;
        let resumed_from = cursor;
        let mut sink = RecordSink::<AnimeRecord>::open(self.paths.anime_data())?;

        if cursor > 0 {
            info!("Resuming anime harvest at {}/{}", cursor, total);
        }
        progress(cursor);

        let page_size = self.config.page_size.max(1);
        while cursor < total {
            let list_url = self.list_url(cursor);
            debug!("Ranking page {} (limit={})", cursor / page_size + 1, cursor);
            navigate(session, &list_url).await?;
            self.pacer.pause().await;

            let links: Vec<String> = session
                .query(ITEM_LINKS)
                .await?
                .iter()
                .filter_map(|el| el.href().map(str::to_string))
                .take(page_size as usize)
                .collect();

            if links.is_empty() {
                warn!("No entries on {}; stopping at {}", list_url, cursor);
                return Ok(AnimeHarvestSummary {
                    resumed_from,
                    cursor,
                    outcome: HarvestOutcome::Exhausted,
                });
            }

            for link in links {
                if cursor >= total {
                    break;
                }

                navigate(session, &link).await?;
                self.pacer.pause().await;

                let record = self.read_detail(session, &link).await?;
                sink.append(&record)?;
                cursor += 1;
                self.checkpoint.save(cursor)?;
                progress(cursor);
                debug!("Saved {:?} ({}/{})", record.title, cursor, total);

                self.pacer.pause().await;
            }
        }

        info!("Anime harvest complete at {}", cursor);
        Ok(AnimeHarvestSummary {
            resumed_from,
            cursor,
            outcome: HarvestOutcome::Completed,
        })
    }

    async fn read_detail<S: PageSession + ?Sized>(
        &self,
        session: &mut S,
        url: &str,
    ) -> Result<AnimeRecord, HarvestError> {
        let title = match session.query(ENGLISH_TITLE).await?.into_iter().next() {
            Some(el) if !el.text.trim().is_empty() => el.text,
            _ => session
                .query(MAIN_TITLE)
                .await?
                .into_iter()
                .next()
                .map(|el| el.text)
                .unwrap_or_else(|| {
                    warn!("No title found on {}", url);
                    String::new()
                }),
        };

        let fragments: Vec<String> = session
            .query(INFO_PANEL)
            .await?
            .into_iter()
            .map(|el| el.text)
            .collect();

        Ok(parse_anime_info(&title, &fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{FixturePage, FixtureSession};
    use crate::storage::count_records;
    use tempfile::TempDir;

    const BASE: &str = "https://mal.test";

    fn ranking(links: &[&str]) -> FixturePage {
        let rows: String = links
            .iter()
            .map(|l| format!("<h3 class='anime_ranking_h3'><a href='{}'>x</a></h3>", l))
            .collect();
        FixturePage::html(format!("<table>{}</table>", rows))
    }

    fn detail(english: Option<&str>, main: &str) -> FixturePage {
        let english = english
            .map(|t| format!("<p class='title-english'>{}</p>", t))
            .unwrap_or_default();
        FixturePage::html(format!(
            "<div class='h1-title'><strong>{}</strong>{}</div>
             <div class='leftside'>
               <div class='spaceit_pad'><span>Type:</span> TV</div>
               <div class='spaceit_pad'><span>Episodes:</span> 12</div>
               <div class='spaceit_pad'><span>Aired:</span> Jan 10, 2021 to Mar 28, 2021</div>
             </div>",
            main, english
        ))
    }

    fn harvester(dir: &TempDir, total: u64) -> AnimeHarvester {
        let config = AnimeHarvestConfig {
            total_items: total,
            ..Default::default()
        };
        AnimeHarvester::new(BASE, config, HarvestPaths::new(dir.path())).with_pacer(Pacer::none())
    }

    #[tokio::test]
    async fn test_stops_at_total_mid_page() {
        let dir = TempDir::new().unwrap();
        let mut session = FixtureSession::new()
            .with_page(
                "https://mal.test/topanime.php?limit=0",
                ranking(&["/anime/1", "/anime/2", "/anime/3"]),
            )
            .with_page("https://mal.test/anime/1", detail(Some("One"), "Ichi"))
            .with_page("https://mal.test/anime/2", detail(None, "Ni"));

        let mut seen = Vec::new();
        let summary = harvester(&dir, 2)
            .run(&mut session, |c| seen.push(c))
            .await
            .unwrap();

        assert_eq!(summary.outcome, HarvestOutcome::Completed);
        assert_eq!(summary.harvested(), 2);
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(!session
            .visited()
            .contains(&"https://mal.test/anime/3".to_string()));

        let content = std::fs::read_to_string(dir.path().join("anime_data.csv")).unwrap();
        assert!(content.contains("One,TV,12,Winter 2021"));
        assert!(content.contains("Ni,TV,12,Winter 2021"));
    }

    #[tokio::test]
    async fn test_page_size_bounds_links_per_ranking_page() {
        let dir = TempDir::new().unwrap();
        let config = AnimeHarvestConfig {
            total_items: 3,
            page_size: 2,
            ..Default::default()
        };
        let mut session = FixtureSession::new()
            .with_page(
                "https://mal.test/topanime.php?limit=0",
                ranking(&["/anime/1", "/anime/2", "/anime/3"]),
            )
            .with_page("https://mal.test/topanime.php?limit=2", ranking(&["/anime/3"]))
            .with_page("https://mal.test/anime/1", detail(None, "Ichi"))
            .with_page("https://mal.test/anime/2", detail(None, "Ni"))
            .with_page("https://mal.test/anime/3", detail(None, "San"));

        let summary = AnimeHarvester::new(BASE, config, HarvestPaths::new(dir.path()))
            .with_pacer(Pacer::none())
            .run(&mut session, |_| {})
            .await
            .unwrap();

        assert_eq!(summary.outcome, HarvestOutcome::Completed);
        assert_eq!(
            session.visited(),
            [
                "https://mal.test/topanime.php?limit=0",
                "https://mal.test/anime/1",
                "https://mal.test/anime/2",
                "https://mal.test/topanime.php?limit=2",
                "https://mal.test/anime/3",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_ranking_page_ends_run() {
        let dir = TempDir::new().unwrap();
        let mut session = FixtureSession::new()
            .with_page("https://mal.test/topanime.php?limit=0", ranking(&["/anime/1"]))
            .with_page("https://mal.test/anime/1", detail(None, "Only"))
            .with_page("https://mal.test/topanime.php?limit=1", ranking(&[]));

        let summary = harvester(&dir, 100).run(&mut session, |_| {}).await.unwrap();
        assert_eq!(summary.outcome, HarvestOutcome::Exhausted);
        assert_eq!(summary.cursor, 1);
        assert_eq!(count_records(&dir.path().join("anime_data.csv")).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_already_complete_does_nothing() {
        let dir = TempDir::new().unwrap();
        let h = harvester(&dir, 5);
        h.checkpoint().save(5).unwrap();

        let mut session = FixtureSession::new();
        let summary = h.run(&mut session, |_| {}).await.unwrap();
        assert_eq!(summary.harvested(), 0);
        assert!(session.visited().is_empty());
    }
}
