//! Harvest and database status.

use console::style;

use crate::config::Settings;
use crate::repository::{connect, table_counts};
use crate::storage::{count_records, CheckpointStore};

pub fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let paths = settings.paths();
    let total = settings.anime.total_items;
    let cursor = CheckpointStore::new(paths.anime_checkpoint()).load()?;

    println!("{}", style("Harvest").bold());
    println!("  Data directory: {}", paths.data_dir().display());

    let marker = if cursor >= total {
        style("✓").green()
    } else {
        style("…").yellow()
    };
    println!("  {} Anime checkpoint: {}/{}", marker, cursor, total);
    println!(
        "  Anime records:    {}",
        count_records(&paths.anime_data())?
    );
    println!(
        "  Watch entries:    {}",
        count_records(&paths.user_data())?
    );
    println!(
        "  Seen usernames:   {}",
        count_records(&paths.usernames())?
    );

    println!();
    println!("{}", style("Database").bold());
    if !settings.database_path.exists() {
        println!(
            "  {} {} (not created yet)",
            style("-").dim(),
            settings.database_path.display()
        );
        return Ok(());
    }

    let conn = connect(&settings.database_path)?;
    let counts = table_counts(&conn)?;
    println!("  Path:    {}", settings.database_path.display());
    println!("  Users:   {}", counts.users);
    println!("  Anime:   {}", counts.anime);
    println!("  Entries: {}", counts.entries);
    Ok(())
}
