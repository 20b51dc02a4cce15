//! Checkpointed harvest loops.
//!
//! Both harvesters fetch pages strictly one at a time, persist every record
//! before advancing their progress marker, and stop on the first navigation
//! failure so that a later run resumes where this one ended.

pub mod anime;
pub mod users;

pub use anime::{AnimeHarvestConfig, AnimeHarvestSummary, AnimeHarvester, HarvestOutcome};
pub use users::{UserHarvestConfig, UserHarvestSummary, UserHarvester};

use thiserror::Error;
use tracing::{debug, error};

use crate::scrapers::{PageSession, SessionError};
use crate::storage::{CheckpointError, SinkError};

/// Errors that end a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Failed to load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: SessionError,
    },

    #[error("Cookie consent popup not found: {0}")]
    MissingPopup(#[source] SessionError),

    #[error("Page session failed: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl HarvestError {
    /// Whether the run was stopped by a page that would not load.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation { .. })
    }
}

/// Load `url`, turning any failure into a run-ending error.
pub(crate) async fn navigate<S: PageSession + ?Sized>(
    session: &mut S,
    url: &str,
) -> Result<(), HarvestError> {
    debug!("Loading {}", url);
    session.load(url).await.map_err(|source| {
        error!("Failed to load page {}: {}", url, source);
        HarvestError::Navigation {
            url: url.to_string(),
            source,
        }
    })
}

/// Join `base` and a site path without doubling the slash.
pub(crate) fn site_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::FixtureSession;

    #[test]
    fn test_site_url() {
        assert_eq!(
            site_url("https://myanimelist.net/", "/topanime.php?limit=0"),
            "https://myanimelist.net/topanime.php?limit=0"
        );
        assert_eq!(site_url("https://myanimelist.net", ""), "https://myanimelist.net/");
    }

    #[tokio::test]
    async fn test_navigate_wraps_timeout() {
        let mut session = FixtureSession::new().with_timeout("https://example.test/a");
        let err = navigate(&mut session, "https://example.test/a")
            .await
            .unwrap_err();
        assert!(err.is_navigation());
        assert!(err.to_string().contains("https://example.test/a"));
    }
}
