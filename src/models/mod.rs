//! Data models for harvested anime and watch-list records.

mod anime;
mod season;
mod watch;

pub use anime::AnimeRecord;
pub use season::{Season, SeasonLabel};
pub use watch::{SeenUser, WatchEntry, WatchStatus};

/// A record with a fixed, ordered set of named columns.
///
/// Every row produced by `fields` has exactly `HEADER.len()` entries; absent
/// values are rendered as the empty string rather than dropped.
pub trait Record {
    /// Column names, in serialisation order.
    const HEADER: &'static [&'static str];

    /// Field values in the same order as `HEADER`.
    fn fields(&self) -> Vec<String>;
}

/// Render an optional value as a CSV field, using the empty marker for `None`.
pub(crate) fn field<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}
