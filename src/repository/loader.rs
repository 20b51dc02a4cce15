//! Load harvest CSV files into the database.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use rusqlite::{params, Connection, Transaction};
use tracing::{debug, info, warn};

use super::{to_option, RepositoryError, Result};
use crate::models::WatchStatus;
use crate::storage::HarvestPaths;

/// Counts from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub anime_inserted: usize,
    /// Titles already present in the database.
    pub anime_existing: usize,
    pub users_inserted: usize,
    /// Users whose entries were ignored for lacking status variety.
    pub users_rejected: usize,
    pub entries_inserted: usize,
    pub entries_existing: usize,
    /// Entries naming a title that is not in `anime_data`.
    pub entries_unknown_title: usize,
}

/// Loads the CSV files produced by the harvesters.
///
/// Loading is idempotent: anime are matched by title and entries by
/// `(user, anime)`, so rerunning after another harvest only adds new rows.
#[derive(Debug, Clone)]
pub struct Loader {
    min_distinct_statuses: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Loader {
    pub fn new(min_distinct_statuses: usize) -> Self {
        Self {
            min_distinct_statuses,
        }
    }

    /// Load anime first so that entries can resolve their titles.
    pub fn load(&self, conn: &mut Connection, paths: &HarvestPaths) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let tx = conn.transaction()?;
        self.load_anime(&tx, &paths.anime_data(), &mut report)?;
        self.load_user_data(&tx, &paths.user_data(), &mut report)?;
        tx.commit()?;

        info!(
            "Loaded {} anime, {} users, {} entries",
            report.anime_inserted, report.users_inserted, report.entries_inserted
        );
        Ok(report)
    }

    fn load_anime(&self, tx: &Transaction<'_>, path: &Path, report: &mut LoadReport) -> Result<()> {
        let Some(mut reader) = open_csv(path)? else {
            warn!("{} not found, no anime loaded", path.display());
            return Ok(());
        };

        let mut find = tx.prepare("SELECT ANIME_ID FROM anime_data WHERE ANIME_TITLE = ?1")?;
        let mut insert = tx.prepare(
            r#"
            INSERT INTO anime_data (
                ANIME_TITLE, ANIME_SHOW_TYPE, ANIME_EPISODES, ANIME_PREMIERED, ANIME_STUDIOS,
                ANIME_SOURCE, ANIME_GENRES, ANIME_THEMES, ANIME_AGE_RATING, ANIME_SCORE,
                ANIME_RANKING, ANIME_POPULARITY
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )?;

        for row in reader.records() {
            let row = row.map_err(|source| csv_error(path, source))?;
            let title = row.get(0).unwrap_or_default().trim();
            if title.is_empty() {
                continue;
            }
            if to_option(find.query_row(params![title], |r| r.get::<_, i64>(0)))?.is_some() {
                report.anime_existing += 1;
                continue;
            }

            insert.execute(params![
                title,
                text(row.get(1)),
                integer(row.get(2)),
                text(row.get(3)),
                text(row.get(4)),
                text(row.get(5)),
                text(row.get(6)),
                text(row.get(7)),
                text(row.get(8)),
                real(row.get(9)),
                integer(row.get(10)),
                integer(row.get(11)),
            ])?;
            report.anime_inserted += 1;
        }
        Ok(())
    }

    fn load_user_data(
        &self,
        tx: &Transaction<'_>,
        path: &Path,
        report: &mut LoadReport,
    ) -> Result<()> {
        let (valid, rejected) = self.valid_users(path)?;
        report.users_rejected = rejected;

        let Some(mut reader) = open_csv(path)? else {
            warn!("{} not found, no watch data loaded", path.display());
            return Ok(());
        };

        let mut find_user = tx.prepare("SELECT USER_ID FROM users WHERE USERNAME = ?1")?;
        let mut insert_user = tx.prepare("INSERT INTO users (USERNAME) VALUES (?1)")?;
        let mut find_anime = tx.prepare("SELECT ANIME_ID FROM anime_data WHERE ANIME_TITLE = ?1")?;
        let mut find_entry =
            tx.prepare("SELECT 1 FROM user_data WHERE USER_ID = ?1 AND ANIME_ID = ?2")?;
        let mut insert_entry = tx.prepare(
            "INSERT INTO user_data (USER_ID, ANIME_ID, SCORE, CURR_EPISODE, WATCH_STATUS)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut user_ids: HashMap<String, i64> = HashMap::new();

        for row in reader.records() {
            let row = row.map_err(|source| csv_error(path, source))?;
            let username = row.get(0).unwrap_or_default();
            if !valid.contains(username) {
                continue;
            }

            let Some(anime_id) = to_option(
                find_anime.query_row(params![row.get(1).unwrap_or_default()], |r| r.get::<_, i64>(0)),
            )?
            else {
                debug!("Unknown title {:?} on {}'s list", row.get(1), username);
                report.entries_unknown_title += 1;
                continue;
            };

            let user_id = match user_ids.get(username) {
                Some(id) => *id,
                None => {
                    let existing =
                        find_user.query_row(params![username], |r| r.get::<_, i64>(0));
                    let id = match to_option(existing)? {
                        Some(id) => id,
                        None => {
                            insert_user.execute(params![username])?;
                            report.users_inserted += 1;
                            tx.last_insert_rowid()
                        }
                    };
                    user_ids.insert(username.to_string(), id);
                    id
                }
            };

            if to_option(find_entry.query_row(params![user_id, anime_id], |_| Ok(())))?.is_some() {
                report.entries_existing += 1;
                continue;
            }

            insert_entry.execute(params![
                user_id,
                anime_id,
                entry_score(row.get(2).unwrap_or_default()),
                leading_integer(row.get(3).unwrap_or_default()),
                row.get(4).unwrap_or_default(),
            ])?;
            report.entries_inserted += 1;
        }
        Ok(())
    }

    /// Users with at least `min_distinct_statuses` different statuses that
    /// count towards variety, and the number of users without.
    pub fn valid_users(&self, path: &Path) -> Result<(HashSet<String>, usize)> {
        let Some(mut reader) = open_csv(path)? else {
            return Ok((HashSet::new(), 0));
        };

        let mut statuses: HashMap<String, HashSet<WatchStatus>> = HashMap::new();
        for row in reader.records() {
            let row = row.map_err(|source| csv_error(path, source))?;
            let Some(username) = row.get(0).filter(|u| !u.is_empty()) else {
                continue;
            };
            let seen = statuses.entry(username.to_string()).or_default();
            if let Some(status) = row.get(4).and_then(WatchStatus::from_str) {
                if status.counts_towards_variety() {
                    seen.insert(status);
                }
            }
        }

        let total = statuses.len();
        let valid: HashSet<String> = statuses
            .into_iter()
            .filter(|(_, s)| s.len() >= self.min_distinct_statuses)
            .map(|(user, _)| user)
            .collect();
        let rejected = total - valid.len();
        Ok((valid, rejected))
    }
}

fn open_csv(path: &Path) -> Result<Option<csv::Reader<File>>> {
    if !path.exists() {
        return Ok(None);
    }
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map(Some)
        .map_err(|source| csv_error(path, source))
}

fn csv_error(path: &Path, source: csv::Error) -> RepositoryError {
    RepositoryError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn integer(value: Option<&str>) -> Option<i64> {
    text(value).and_then(|v| v.parse().ok())
}

fn real(value: Option<&str>) -> Option<f64> {
    text(value).and_then(|v| v.parse().ok())
}

/// `"8"` -> 8; `"-"` (unscored) -> NULL.
fn entry_score(value: &str) -> Option<i64> {
    value.trim().parse::<f64>().ok().map(|s| s as i64)
}

/// `"12 / 24"` -> 12; `"- / 12"` -> NULL.
fn leading_integer(value: &str) -> Option<i64> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::connect;
    use tempfile::TempDir;

    const ANIME_CSV: &str = "\
title,show_type,episodes,premiered,studios,source,genres,theme,age_rating,score,ranking,popularity_rank
Alpha,TV,24,Spring 2011,Bones,Manga,\"Action, Drama\",Military,R - 17+,9.1,1,3
Beta,Movie,,,,Original,,,PG-13,N/A,2,
";

    const USER_CSV: &str = "\
Username,Anime_Title,Score,Watch_Progress,Watch_Status
amy,Alpha,9,24,completed
amy,Beta,-,- / 1,watching
bob,Alpha,7,3,plantowatch
bob,Beta,6,1,completed
amy,Gamma,5,2,dropped
";

    fn setup() -> (TempDir, HarvestPaths, Connection) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("anime_data.csv"), ANIME_CSV).unwrap();
        std::fs::write(dir.path().join("user_data.csv"), USER_CSV).unwrap();
        let conn = connect(&dir.path().join("anime.db")).unwrap();
        let paths = HarvestPaths::new(dir.path());
        (dir, paths, conn)
    }

    #[test]
    fn test_load_applies_valid_user_rule() {
        let (_dir, paths, mut conn) = setup();
        let report = Loader::default().load(&mut conn, &paths).unwrap();

        assert_eq!(report.anime_inserted, 2);
        assert_eq!(report.users_inserted, 1);
        assert_eq!(report.users_rejected, 1);
        assert_eq!(report.entries_inserted, 2);
        assert_eq!(report.entries_unknown_title, 1);

        let (score, episode): (Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT SCORE, CURR_EPISODE FROM user_data d
                 JOIN anime_data a ON a.ANIME_ID = d.ANIME_ID WHERE a.ANIME_TITLE = 'Beta'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(score, None);
        assert_eq!(episode, None);
    }

    #[test]
    fn test_empty_numeric_fields_become_null() {
        let (_dir, paths, mut conn) = setup();
        Loader::default().load(&mut conn, &paths).unwrap();

        let (episodes, score, popularity): (Option<i64>, Option<f64>, Option<i64>) = conn
            .query_row(
                "SELECT ANIME_EPISODES, ANIME_SCORE, ANIME_POPULARITY FROM anime_data
                 WHERE ANIME_TITLE = 'Beta'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((episodes, score, popularity), (None, None, None));
    }

    #[test]
    fn test_reload_is_idempotent() {
        let (_dir, paths, mut conn) = setup();
        Loader::default().load(&mut conn, &paths).unwrap();
        let second = Loader::default().load(&mut conn, &paths).unwrap();

        assert_eq!(second.anime_inserted, 0);
        assert_eq!(second.anime_existing, 2);
        assert_eq!(second.users_inserted, 0);
        assert_eq!(second.entries_inserted, 0);
        assert_eq!(second.entries_existing, 2);
    }

    #[test]
    fn test_lower_threshold_admits_more_users() {
        let (_dir, paths, _conn) = setup();
        let (valid, rejected) = Loader::new(1).valid_users(&paths.user_data()).unwrap();
        assert!(valid.contains("amy") && valid.contains("bob"));
        assert_eq!(rejected, 0);
    }

    #[test]
    fn test_missing_files_load_nothing() {
        let dir = TempDir::new().unwrap();
        let mut conn = connect(&dir.path().join("anime.db")).unwrap();
        let report = Loader::default()
            .load(&mut conn, &HarvestPaths::new(dir.path()))
            .unwrap();
        assert_eq!(report, LoadReport::default());
    }

    #[test]
    fn test_value_helpers() {
        assert_eq!(entry_score("8"), Some(8));
        assert_eq!(entry_score("-"), None);
        assert_eq!(leading_integer("12 / 24"), Some(12));
        assert_eq!(leading_integer("- / 12"), None);
    }
}
