//! Anime detail harvest command.

use std::time::Instant;

use console::style;

use crate::cli::helpers::{format_elapsed, harvest_progress_bar};
use crate::config::Settings;
use crate::harvest::{AnimeHarvester, HarvestOutcome};
use crate::scrapers::{ChromiumSession, PageSession};

pub async fn cmd_anime(settings: &Settings) -> anyhow::Result<()> {
    let harvester = AnimeHarvester::new(&settings.base_url, settings.anime.clone(), settings.paths());
    let start = harvester.checkpoint().load()?;
    let total = settings.anime.total_items;

    if start >= total {
        println!(
            "{} All {} anime already harvested",
            style("✓").green(),
            total
        );
        return Ok(());
    }

    println!(
        "{} Harvesting anime {}..{} into {}",
        style("→").cyan(),
        start,
        total,
        settings.data_dir.display()
    );

    let mut session = ChromiumSession::start(settings.browser.clone()).await?;
    let pb = harvest_progress_bar(total);
    let started = Instant::now();

    let result = harvester
        .run(&mut session, |cursor| pb.set_position(cursor))
        .await;
    session.close().await;
    pb.finish_and_clear();

    match result {
        Ok(summary) => {
            let symbol = match summary.outcome {
                HarvestOutcome::Completed => style("✓").green(),
                HarvestOutcome::Exhausted => style("!").yellow(),
            };
            println!(
                "{} Harvested {} anime in {} (checkpoint {}/{})",
                symbol,
                summary.harvested(),
                format_elapsed(started.elapsed()),
                summary.cursor,
                total
            );
            Ok(())
        }
        Err(e) => {
            let cursor = harvester.checkpoint().load().unwrap_or(start);
            println!(
                "{} Harvest stopped at {}/{}; rerun to resume",
                style("✗").red(),
                cursor,
                total
            );
            Err(e.into())
        }
    }
}
