//! User × title score matrix.
//!
//! Rows are usernames, columns are anime titles, and each cell holds the mean
//! of the user's non-null scores for that title. Users and titles without a
//! single score are dropped, as are all-empty rows and columns.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::repository::MergedRow;

/// Placeholder for cells without a score.
const EMPTY_CELL: &str = "NaN";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserItemMatrix {
    users: Vec<String>,
    titles: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl UserItemMatrix {
    pub fn from_rows(rows: &[MergedRow]) -> Self {
        let mut sums: BTreeMap<(&str, &str), (f64, u32)> = BTreeMap::new();
        for row in rows {
            let Some(score) = row.score else { continue };
            let cell = sums
                .entry((row.username.as_str(), row.anime_title.as_str()))
                .or_default();
            cell.0 += score as f64;
            cell.1 += 1;
        }

        let users: Vec<String> = sums
            .keys()
            .map(|(u, _)| *u)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let titles: Vec<String> = sums
            .keys()
            .map(|(_, t)| *t)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let cells = users
            .iter()
            .map(|user| {
                titles
                    .iter()
                    .map(|title| {
                        sums.get(&(user.as_str(), title.as_str()))
                            .map(|(sum, n)| sum / *n as f64)
                    })
                    .collect()
            })
            .collect();

        Self {
            users,
            titles,
            cells,
        }
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, user: &str, title: &str) -> Option<f64> {
        let r = self.users.iter().position(|u| u == user)?;
        let c = self.titles.iter().position(|t| t == title)?;
        self.cells[r][c]
    }

    /// Render the first `rows` rows as a text table.
    ///
    /// When there are more than `max_columns` titles, the first and last
    /// halves are shown around a `...` column.
    pub fn preview(&self, rows: usize, max_columns: usize) -> String {
        let columns: Vec<Option<usize>> = if self.titles.len() > max_columns {
            let head = max_columns.div_ceil(2);
            let tail = max_columns / 2;
            (0..head)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((self.titles.len() - tail..self.titles.len()).map(Some))
                .collect()
        } else {
            (0..self.titles.len()).map(Some).collect()
        };

        let header = |c: &Option<usize>| match c {
            Some(i) => self.titles[*i].clone(),
            None => "...".to_string(),
        };
        let cell = |r: usize, c: &Option<usize>| match c {
            Some(i) => self.cells[r][*i]
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
            None => "...".to_string(),
        };

        let shown_rows = rows.min(self.users.len());
        let label_width = self.users[..shown_rows]
            .iter()
            .map(|u| u.chars().count())
            .chain(std::iter::once("USERNAME".len()))
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = columns
            .iter()
            .map(|c| {
                (0..shown_rows)
                    .map(|r| cell(r, c).chars().count())
                    .chain(std::iter::once(header(c).chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let _ = write!(out, "{:<w$}", "USERNAME", w = label_width);
        for (c, w) in columns.iter().zip(&widths) {
            let _ = write!(out, "  {:>w$}", header(c), w = w);
        }
        for r in 0..shown_rows {
            let _ = write!(out, "\n{:<w$}", self.users[r], w = label_width);
            for (c, w) in columns.iter().zip(&widths) {
                let _ = write!(out, "  {:>w$}", cell(r, c), w = w);
            }
        }
        if shown_rows < self.users.len() || columns.len() < self.titles.len() {
            let _ = write!(
                out,
                "\n\n[{} rows x {} columns]",
                self.users.len(),
                self.titles.len()
            );
        }
        out
    }
}
