//! Pure extraction of records from scraped page text.

pub mod anime_info;
pub mod watchlist;

pub use anime_info::{parse_anime_info, AnimeField};
pub use watchlist::{
    list_url_from_profile, parse_watch_days, status_from_class, username_from_list_url,
    WatchColumns, ZippedEntries,
};
