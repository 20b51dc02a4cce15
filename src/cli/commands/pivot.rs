//! User x title matrix preview.

use console::style;

use crate::analysis::UserItemMatrix;
use crate::config::Settings;
use crate::repository::{connect, full_merge};

/// Rows shown in the preview.
const PREVIEW_ROWS: usize = 5;
/// Columns shown before the middle ones are elided.
const PREVIEW_COLUMNS: usize = 10;

pub fn cmd_pivot(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_path.exists() {
        println!(
            "{} No database at {}. Run 'anime-harvest load' first.",
            style("✗").red(),
            settings.database_path.display()
        );
        return Ok(());
    }

    let conn = connect(&settings.database_path)?;
    let rows = full_merge(&conn)?;
    let matrix = UserItemMatrix::from_rows(&rows);

    if matrix.is_empty() {
        println!("{} No scored entries loaded", style("!").yellow());
        return Ok(());
    }

    println!("{}", matrix.preview(PREVIEW_ROWS, PREVIEW_COLUMNS));
    Ok(())
}
