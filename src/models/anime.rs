//! Anime detail record.

use super::{field, Record, SeasonLabel};

/// Metadata harvested from one anime detail page.
///
/// Any field the page did not provide stays `None` and is written as an
/// empty column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimeRecord {
    pub title: String,
    pub show_type: Option<String>,
    pub episodes: Option<u32>,
    pub premiered: Option<SeasonLabel>,
    pub studios: Option<String>,
    pub source: Option<String>,
    pub genres: Option<String>,
    pub themes: Option<String>,
    pub age_rating: Option<String>,
    pub score: Option<f64>,
    pub ranking: Option<u32>,
    pub popularity: Option<u32>,
}

impl AnimeRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

impl Record for AnimeRecord {
    const HEADER: &'static [&'static str] = &[
        "title",
        "show_type",
        "episodes",
        "premiered",
        "studios",
        "source",
        "genres",
        "theme",
        "age_rating",
        "score",
        "ranking",
        "popularity_rank",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            field(&self.show_type),
            field(&self.episodes),
            field(&self.premiered),
            field(&self.studios),
            field(&self.source),
            field(&self.genres),
            field(&self.themes),
            field(&self.age_rating),
            field(&self.score),
            field(&self.ranking),
            field(&self.popularity),
        ]
    }
}
