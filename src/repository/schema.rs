//! Table definitions.

use rusqlite::Connection;

use super::Result;

/// Create the tables if they do not exist yet.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            USER_ID INTEGER PRIMARY KEY AUTOINCREMENT,
            USERNAME VARCHAR(255) NOT NULL
        );

        CREATE TABLE IF NOT EXISTS anime_data (
            ANIME_ID INTEGER PRIMARY KEY AUTOINCREMENT,
            ANIME_TITLE VARCHAR(255) NOT NULL,
            ANIME_SHOW_TYPE VARCHAR(10),
            ANIME_EPISODES INTEGER,
            ANIME_PREMIERED VARCHAR(15),
            ANIME_SOURCE TEXT,
            ANIME_STUDIOS TEXT,
            ANIME_GENRES TEXT,
            ANIME_THEMES TEXT,
            ANIME_AGE_RATING VARCHAR(255),
            ANIME_SCORE REAL,
            ANIME_RANKING INTEGER,
            ANIME_POPULARITY INTEGER
        );

        CREATE TABLE IF NOT EXISTS user_data (
            USER_ID INTEGER NOT NULL REFERENCES users(USER_ID),
            ANIME_ID INTEGER NOT NULL REFERENCES anime_data(ANIME_ID),
            SCORE INTEGER,
            CURR_EPISODE INTEGER,
            WATCH_STATUS VARCHAR(11)
        );

        CREATE INDEX IF NOT EXISTS idx_users_username ON users(USERNAME);
        CREATE INDEX IF NOT EXISTS idx_anime_title ON anime_data(ANIME_TITLE);
        CREATE INDEX IF NOT EXISTS idx_user_data_pair ON user_data(USER_ID, ANIME_ID);
    "#,
    )?;
    Ok(())
}
