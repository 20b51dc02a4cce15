//! Watch-list harvest command.

use std::time::Instant;

use console::style;

use crate::cli::helpers::{format_elapsed, spinner};
use crate::config::Settings;
use crate::harvest::UserHarvester;
use crate::scrapers::{ChromiumSession, PageSession};

pub async fn cmd_users(settings: &Settings) -> anyhow::Result<()> {
    let harvester = UserHarvester::new(&settings.base_url, settings.users.clone(), settings.paths());

    println!(
        "{} Harvesting watch lists from {} forum posts into {}",
        style("→").cyan(),
        settings.users.forum_posts,
        settings.data_dir.display()
    );

    let mut session = ChromiumSession::start(settings.browser.clone()).await?;
    let pb = spinner("Scanning watch lists...");
    let started = Instant::now();
    let result = harvester.run(&mut session).await;
    session.close().await;
    pb.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            println!("{} User harvest aborted; rerun to continue", style("✗").red());
            return Err(e.into());
        }
    };

    println!(
        "{} Harvested {} users ({} entries) in {}",
        style("✓").green(),
        summary.harvested_users,
        summary.entries_written,
        format_elapsed(started.elapsed())
    );
    println!(
        "  {} lists found, {} already seen, {} below watch time, {} unreadable",
        summary.lists_found, summary.already_seen, summary.below_threshold, summary.failed
    );
    if summary.entries_skipped > 0 {
        println!(
            "  {} {} entries skipped for missing fields",
            style("!").yellow(),
            summary.entries_skipped
        );
    }
    Ok(())
}
