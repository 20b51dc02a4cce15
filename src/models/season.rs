//! Calendar-season labels derived from a premiere month and year.

use std::fmt;
use std::str::FromStr;

use chrono::Month;

/// One of the four anime broadcast seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
        }
    }
}

/// A season together with its year, rendered as e.g. `"Spring 2021"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonLabel {
    pub season: Season,
    pub year: i32,
}

impl SeasonLabel {
    /// Map a premiere month and year to its season.
    ///
    /// December premieres belong to the Winter season of the following year.
    pub fn from_month(month: Month, year: i32) -> Self {
        let (season, year) = match month {
            Month::January | Month::February => (Season::Winter, year),
            Month::March | Month::April | Month::May => (Season::Spring, year),
            Month::June | Month::July | Month::August => (Season::Summer, year),
            Month::September | Month::October | Month::November => (Season::Fall, year),
            Month::December => (Season::Winter, year + 1),
        };
        Self { season, year }
    }

    /// Same as [`SeasonLabel::from_month`] but accepts a month name or
    /// three-letter abbreviation (`"Dec"`, `"december"`).
    pub fn from_month_name(month: &str, year: i32) -> Option<Self> {
        Month::from_str(month.trim())
            .ok()
            .map(|m| Self::from_month(m, year))
    }

    /// Derive a season from free-text air dates such as
    /// `"Apr 3, 2016 to Jun 26, 2016"` or `"Oct 2006 to Mar 2007"`.
    ///
    /// The first month name and the first four-digit year are used. Returns
    /// `None` when either is missing (`"2019 to ?"`, `"Not available"`).
    pub fn from_aired(text: &str) -> Option<Self> {
        let mut tokens = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty());

        let month = tokens
            .next()
            .and_then(|t| Month::from_str(t.get(..3).unwrap_or(t)).ok())?;

        let year = text
            .split(|c: char| !c.is_ascii_digit())
            .find(|t| t.len() == 4)
            .and_then(|t| t.parse::<i32>().ok())?;

        Some(Self::from_month(month, year))
    }
}

impl fmt::Display for SeasonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season.as_str(), self.year)
    }
}
