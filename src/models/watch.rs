//! Watch-list entry records.

use super::Record;

/// Watch status as exposed in the list page's status cell class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::OnHold => "onhold",
            Self::Dropped => "dropped",
            Self::PlanToWatch => "plantowatch",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "watching" => Some(Self::Watching),
            "completed" => Some(Self::Completed),
            "onhold" => Some(Self::OnHold),
            "dropped" => Some(Self::Dropped),
            "plantowatch" => Some(Self::PlanToWatch),
            _ => None,
        }
    }

    /// Statuses that count towards the "varied list" rule used when loading.
    pub fn counts_towards_variety(&self) -> bool {
        !matches!(self, Self::PlanToWatch)
    }
}

/// One row of a user's anime list.
///
/// Values are kept as scraped (`"-"` for an unset score, `"12 / 24"` style
/// progress); interpretation happens at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub username: String,
    pub title: String,
    pub score: String,
    pub progress: String,
    pub status: String,
}

impl Record for WatchEntry {
    const HEADER: &'static [&'static str] = &[
        "Username",
        "Anime_Title",
        "Score",
        "Watch_Progress",
        "Watch_Status",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.title.clone(),
            self.score.clone(),
            self.progress.clone(),
            self.status.clone(),
        ]
    }
}

/// A username that has already been visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenUser(pub String);

impl Record for SeenUser {
    const HEADER: &'static [&'static str] = &["Username"];

    fn fields(&self) -> Vec<String> {
        vec![self.0.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        assert_eq!(WatchStatus::from_str("watching"), Some(WatchStatus::Watching));
        assert_eq!(WatchStatus::from_str("onhold"), Some(WatchStatus::OnHold));
        assert_eq!(WatchStatus::from_str("On-Hold"), Some(WatchStatus::OnHold));
        assert_eq!(
            WatchStatus::from_str("plantowatch"),
            Some(WatchStatus::PlanToWatch)
        );
        assert_eq!(WatchStatus::from_str("rewatching"), None);
    }

    #[test]
    fn test_plan_to_watch_does_not_count() {
        assert!(WatchStatus::Dropped.counts_towards_variety());
        assert!(!WatchStatus::PlanToWatch.counts_towards_variety());
    }

    #[test]
    fn test_watch_entry_arity() {
        let entry = WatchEntry {
            username: "alice".to_string(),
            title: "Mushishi".to_string(),
            score: "9".to_string(),
            progress: "26".to_string(),
            status: "completed".to_string(),
        };
        assert_eq!(entry.fields().len(), WatchEntry::HEADER.len());
    }
}
