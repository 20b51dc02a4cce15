//! Extraction helpers for user anime-list pages.

use url::Url;

use crate::models::WatchEntry;

/// Per-entry columns queried independently from a list page.
///
/// The four collections are expected to line up positionally, but any of
/// them may come back short when a cell is missing from the page.
#[derive(Debug, Clone, Default)]
pub struct WatchColumns {
    pub titles: Vec<String>,
    pub scores: Vec<String>,
    pub progress: Vec<String>,
    /// Raw `class` attribute of the status cells.
    pub status_classes: Vec<String>,
}

/// Result of zipping the columns into entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZippedEntries {
    pub entries: Vec<WatchEntry>,
    /// Positions skipped because at least one column was missing or empty.
    pub skipped: Vec<usize>,
}

impl WatchColumns {
    /// Combine the columns into entries for `username`.
    ///
    /// Iterates up to the longest column; a position where any column is
    /// missing or blank is skipped on its own without affecting the others.
    pub fn zip(&self, username: &str) -> ZippedEntries {
        let len = self
            .titles
            .len()
            .max(self.scores.len())
            .max(self.progress.len())
            .max(self.status_classes.len());

        let mut zipped = ZippedEntries::default();
        for i in 0..len {
            let title = non_empty(self.titles.get(i));
            let score = non_empty(self.scores.get(i));
            let progress = non_empty(self.progress.get(i));
            let status = self.status_classes.get(i).and_then(|c| status_from_class(c));

            match (title, score, progress, status) {
                (Some(title), Some(score), Some(progress), Some(status)) => {
                    zipped.entries.push(WatchEntry {
                        username: username.to_string(),
                        title: title.to_string(),
                        score: score.to_string(),
                        progress: progress.to_string(),
                        status: status.to_string(),
                    });
                }
                _ => zipped.skipped.push(i),
            }
        }
        zipped
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `"data status completed"` -> `"completed"`.
pub fn status_from_class(class: &str) -> Option<&str> {
    class.split_whitespace().nth(2)
}

/// Read the total watch time in days from the list statistics panel text.
///
/// The panel reads like `"Watching: 3, Completed: 1,204, ..., Days: 1,234.5,
/// Mean Score: 7.81"`. Counts may carry thousands separators, so the value is
/// the run of digits, dots and commas following the `Days:` label.
pub fn parse_watch_days(stats: &str) -> Option<f64> {
    const LABEL: &str = "days:";

    // ASCII lowercasing keeps byte offsets aligned with `stats`
    let lower = stats.to_ascii_lowercase();
    // The label must open an entry, not end a longer one ("Watch Days:")
    let start = lower.match_indices(LABEL).map(|(i, _)| i).find(|&i| {
        let before = lower[..i].trim_end_matches([' ', '\t']);
        before.is_empty() || before.ends_with([',', '\n'])
    })?;

    let value: String = stats[start + LABEL.len()..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    value.parse().ok()
}

/// Username from an anime-list URL such as
/// `https://myanimelist.net/animelist/alice?status=7`.
pub fn username_from_list_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "animelist")?;
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Rewrite a profile URL to the user's anime-list URL.
pub fn list_url_from_profile(profile_url: &str) -> Option<String> {
    let mut parsed = Url::parse(profile_url).ok()?;
    let username = {
        let mut segments = parsed.path_segments()?;
        segments.find(|s| *s == "profile")?;
        segments.next().filter(|s| !s.is_empty())?.to_string()
    };
    parsed.set_path(&format!("/animelist/{}", username));
    parsed.set_query(None);
    parsed.set_fragment(None);
    Some(parsed.to_string())
}
