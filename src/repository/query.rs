//! Read queries over the loaded tables.

use rusqlite::Connection;

use super::Result;

/// One watch-list entry joined with its user and anime.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub username: String,
    pub score: Option<i64>,
    pub curr_episode: Option<i64>,
    pub watch_status: Option<String>,
    pub anime_title: String,
    pub anime_show_type: Option<String>,
    pub anime_episodes: Option<i64>,
    pub anime_premiered: Option<String>,
    pub anime_source: Option<String>,
    pub anime_studios: Option<String>,
    pub anime_genres: Option<String>,
    pub anime_themes: Option<String>,
    pub anime_age_rating: Option<String>,
    pub anime_score: Option<f64>,
    pub anime_ranking: Option<i64>,
    pub anime_popularity: Option<i64>,
}

/// Join all three tables, one row per watch-list entry.
pub fn full_merge(conn: &Connection) -> Result<Vec<MergedRow>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT u.USERNAME, d.SCORE, d.CURR_EPISODE, d.WATCH_STATUS,
               a.ANIME_TITLE, a.ANIME_SHOW_TYPE, a.ANIME_EPISODES, a.ANIME_PREMIERED,
               a.ANIME_SOURCE, a.ANIME_STUDIOS, a.ANIME_GENRES, a.ANIME_THEMES,
               a.ANIME_AGE_RATING, a.ANIME_SCORE, a.ANIME_RANKING, a.ANIME_POPULARITY
        FROM user_data d
        JOIN anime_data a ON d.ANIME_ID = a.ANIME_ID
        JOIN users u ON d.USER_ID = u.USER_ID
        ORDER BY u.USERNAME, a.ANIME_TITLE
        "#,
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MergedRow {
                username: row.get(0)?,
                score: row.get(1)?,
                curr_episode: row.get(2)?,
                watch_status: row.get(3)?,
                anime_title: row.get(4)?,
                anime_show_type: row.get(5)?,
                anime_episodes: row.get(6)?,
                anime_premiered: row.get(7)?,
                anime_source: row.get(8)?,
                anime_studios: row.get(9)?,
                anime_genres: row.get(10)?,
                anime_themes: row.get(11)?,
                anime_age_rating: row.get(12)?,
                anime_score: row.get(13)?,
                anime_ranking: row.get(14)?,
                anime_popularity: row.get(15)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Row counts of the three tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub users: i64,
    pub anime: i64,
    pub entries: i64,
}

pub fn table_counts(conn: &Connection) -> Result<TableCounts> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
    };
    Ok(TableCounts {
        users: count("users")?,
        anime: count("anime_data")?,
        entries: count("user_data")?,
    })
}
