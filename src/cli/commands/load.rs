//! Database load command.

use console::style;

use crate::config::Settings;
use crate::repository::{connect, Loader};

pub fn cmd_load(settings: &Settings) -> anyhow::Result<()> {
    let mut conn = connect(&settings.database_path)?;
    let loader = Loader::new(settings.loader.min_distinct_statuses);
    let report = loader.load(&mut conn, &settings.paths())?;

    println!(
        "{} Loaded into {}",
        style("✓").green(),
        settings.database_path.display()
    );
    println!(
        "  anime:   {} inserted, {} already present",
        report.anime_inserted, report.anime_existing
    );
    println!(
        "  users:   {} inserted, {} without enough status variety",
        report.users_inserted, report.users_rejected
    );
    println!(
        "  entries: {} inserted, {} already present",
        report.entries_inserted, report.entries_existing
    );
    if report.entries_unknown_title > 0 {
        println!(
            "  {} {} entries reference titles not in anime_data",
            style("!").yellow(),
            report.entries_unknown_title
        );
    }
    Ok(())
}
