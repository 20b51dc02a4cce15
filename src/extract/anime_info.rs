//! Label-dispatched parsing of an anime detail page's information panel.
//!
//! The panel is a list of `Label: value` text blocks. Each known label maps to
//! one record field through a pure extraction function, so the parser can be
//! exercised without a browser.

use tracing::debug;

use crate::models::{AnimeRecord, SeasonLabel};

/// Placeholder MAL shows for empty multi-valued fields.
const NONE_FOUND: &str = "None found";

/// Record field targeted by a panel label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeField {
    ShowType,
    Episodes,
    Premiered,
    Studios,
    Source,
    Genres,
    Themes,
    AgeRating,
    Score,
    Ranking,
    Popularity,
}

impl AnimeField {
    /// Resolve a panel label. Unknown labels yield `None` and are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Type" => Some(Self::ShowType),
            "Episodes" => Some(Self::Episodes),
            "Aired" => Some(Self::Premiered),
            "Studios" => Some(Self::Studios),
            "Source" => Some(Self::Source),
            "Genre" | "Genres" => Some(Self::Genres),
            "Theme" | "Themes" => Some(Self::Themes),
            "Rating" => Some(Self::AgeRating),
            "Score" => Some(Self::Score),
            "Ranked" => Some(Self::Ranking),
            "Popularity" => Some(Self::Popularity),
            _ => None,
        }
    }

    /// Store `value` into the matching field of `record`.
    ///
    /// Values that cannot be interpreted leave the field at its empty marker.
    pub fn apply(self, record: &mut AnimeRecord, value: &str) {
        match self {
            Self::ShowType => record.show_type = text(value),
            Self::Episodes => record.episodes = value.parse().ok(),
            Self::Premiered => {
                record.premiered = SeasonLabel::from_aired(value);
                if record.premiered.is_none() {
                    debug!("Could not derive a season from aired text {:?}", value);
                }
            }
            Self::Studios => record.studios = list(value),
            Self::Source => record.source = text(value),
            Self::Genres => record.genres = list(value),
            Self::Themes => record.themes = list(value),
            Self::AgeRating => record.age_rating = text(value),
            Self::Score => record.score = parse_score(value),
            Self::Ranking => record.ranking = parse_rank(value),
            Self::Popularity => record.popularity = parse_rank(value),
        }
    }
}

/// Build a record from the page title and its information panel fragments.
///
/// Fragments without a `": "` separator are skipped; no single field failure
/// prevents the record from being produced.
pub fn parse_anime_info<S: AsRef<str>>(title: &str, fragments: &[S]) -> AnimeRecord {
    let mut record = AnimeRecord::new(title.trim());

    for fragment in fragments {
        let fragment = fragment.as_ref().trim();
        if fragment.is_empty() {
            continue;
        }
        let Some((label, value)) = fragment.split_once(": ") else {
            continue;
        };
        if let Some(field) = AnimeField::from_label(label.trim()) {
            field.apply(&mut record, value.trim());
        }
    }

    record
}

fn text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn list(value: &str) -> Option<String> {
    text(value).filter(|v| !v.starts_with(NONE_FOUND))
}

/// `"8.78 (scored by 2,034,112 users)"` -> `8.78`.
pub fn parse_score(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}

/// `"#24"` -> `24`; trailing footnote markers are ignored.
pub fn parse_rank(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .trim_start_matches('#')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
