//! Resumable anime harvest against canned pages.

use anime_harvest::harvest::{AnimeHarvestConfig, AnimeHarvester, HarvestError, HarvestOutcome};
use anime_harvest::scrapers::{FixturePage, FixtureSession, Pacer};
use anime_harvest::storage::{count_records, CheckpointStore, HarvestPaths};
use tempfile::TempDir;

const BASE: &str = "https://mal.test";

fn ranking(ids: &[u32]) -> FixturePage {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                "<tr><td><h3 class='anime_ranking_h3'><a href='/anime/{}'>#{}</a></h3></td></tr>",
                id, id
            )
        })
        .collect();
    FixturePage::html(format!("<table>{}</table>", rows))
}

fn detail(title: &str, score: &str, rank: &str) -> FixturePage {
    FixturePage::html(format!(
        "<div class='h1-title'><strong>{}</strong></div>
         <div class='leftside'>
           <div class='spaceit_pad'><span>Type:</span> TV</div>
           <div class='spaceit_pad'><span>Episodes:</span> 26</div>
           <div class='spaceit_pad'><span>Aired:</span> Oct 4, 2006 to Sep 25, 2007</div>
           <div class='spaceit_pad'><span>Studios:</span> Madhouse</div>
           <div class='spaceit_pad'><span>Score:</span> {} (scored by 1,234 users)</div>
           <div class='spaceit_pad'><span>Ranked:</span> #{}</div>
         </div>",
        title, score, rank
    ))
}

fn harvester(dir: &TempDir, total: u64) -> AnimeHarvester {
    let config = AnimeHarvestConfig {
        total_items: total,
        ..Default::default()
    };
    AnimeHarvester::new(BASE, config, HarvestPaths::new(dir.path())).with_pacer(Pacer::none())
}

#[tokio::test]
async fn test_timeout_keeps_checkpoint_and_rerun_resumes() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("anime_data.csv");

    // First run: the second detail page never loads.
    let mut first = FixtureSession::new()
        .with_page("https://mal.test/topanime.php?limit=0", ranking(&[1, 2, 3]))
        .with_page("https://mal.test/anime/1", detail("Monster", "8.88", "30"))
        .with_timeout("https://mal.test/anime/2");

    let err = harvester(&dir, 3).run(&mut first, |_| {}).await.unwrap_err();
    assert!(err.is_navigation());
    assert!(matches!(err, HarvestError::Navigation { ref url, .. } if url == "https://mal.test/anime/2"));

    let checkpoint = CheckpointStore::new(dir.path().join("num_anime_scraped.bin"));
    assert_eq!(checkpoint.load().unwrap(), 1);
    assert_eq!(count_records(&data).unwrap(), 1);

    // Second run starts from the ranking page at the checkpoint.
    let mut second = FixtureSession::new()
        .with_page("https://mal.test/topanime.php?limit=1", ranking(&[2, 3]))
        .with_page("https://mal.test/anime/2", detail("Mushishi", "8.65", "61"))
        .with_page("https://mal.test/anime/3", detail("Kaiba", "8.10", "450"));

    let summary = harvester(&dir, 3).run(&mut second, |_| {}).await.unwrap();
    assert_eq!(summary.resumed_from, 1);
    assert_eq!(summary.cursor, 3);
    assert_eq!(summary.outcome, HarvestOutcome::Completed);
    assert_eq!(second.visited()[0], "https://mal.test/topanime.php?limit=1");

    assert_eq!(checkpoint.load().unwrap(), 3);
    let content = std::fs::read_to_string(&data).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("title,"));
    assert!(lines[1].starts_with("Monster,TV,26,Fall 2006,Madhouse"));
    assert!(lines[2].starts_with("Mushishi,"));
    assert!(lines[3].starts_with("Kaiba,"));
    assert_eq!(content.matches("Monster").count(), 1);
}

#[tokio::test]
async fn test_harvest_crosses_ranking_pages() {
    let dir = TempDir::new().unwrap();
    let config = AnimeHarvestConfig {
        total_items: 3,
        page_size: 2,
        ..Default::default()
    };
    let mut session = FixtureSession::new()
        .with_page("https://mal.test/topanime.php?limit=0", ranking(&[1, 2]))
        .with_page("https://mal.test/topanime.php?limit=2", ranking(&[3, 4]))
        .with_page("https://mal.test/anime/1", detail("One", "7.00", "1"))
        .with_page("https://mal.test/anime/2", detail("Two", "7.00", "2"))
        .with_page("https://mal.test/anime/3", detail("Three", "7.00", "3"));

    let mut progress = Vec::new();
    let summary = AnimeHarvester::new(BASE, config, HarvestPaths::new(dir.path()))
        .with_pacer(Pacer::none())
        .run(&mut session, |c| progress.push(c))
        .await
        .unwrap();

    assert_eq!(summary.harvested(), 3);
    assert_eq!(progress, vec![0, 1, 2, 3]);
    assert!(!session
        .visited()
        .contains(&"https://mal.test/anime/4".to_string()));
    assert_eq!(count_records(&dir.path().join("anime_data.csv")).unwrap(), 3);
}

#[tokio::test]
async fn test_checkpoint_write_failure_aborts_run() {
    let dir = TempDir::new().unwrap();
    let checkpoint_path = dir.path().join("num_anime_scraped.bin");
    let parked = dir.path().join("parked.bin");

    let mut session = FixtureSession::new()
        .with_page("https://mal.test/topanime.php?limit=0", ranking(&[1, 2, 3]))
        .with_page("https://mal.test/anime/1", detail("Monster", "8.88", "30"))
        .with_page("https://mal.test/anime/2", detail("Mushishi", "8.65", "61"))
        .with_page("https://mal.test/anime/3", detail("Kaiba", "8.10", "450"));

    let mut reported = Vec::new();
    let err = harvester(&dir, 3)
        .run(&mut session, |cursor| {
            reported.push(cursor);
            if cursor == 1 {
                // Set the saved checkpoint aside and leave a directory in its
                // place, so the next save cannot replace it.
                std::fs::rename(&checkpoint_path, &parked).unwrap();
                std::fs::create_dir(&checkpoint_path).unwrap();
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Checkpoint(_)));
    assert!(!err.is_navigation());
    assert_eq!(reported, vec![0, 1]);
    assert!(!session
        .visited()
        .contains(&"https://mal.test/anime/3".to_string()));

    // The record is appended before the failed save; the durable cursor is
    // still the last one written.
    assert_eq!(count_records(&dir.path().join("anime_data.csv")).unwrap(), 2);
    std::fs::remove_dir(&checkpoint_path).unwrap();
    std::fs::rename(&parked, &checkpoint_path).unwrap();
    assert_eq!(CheckpointStore::new(&checkpoint_path).load().unwrap(), 1);
}
