//! Harvest both datasets, load them, and build the score matrix.

use anime_harvest::analysis::UserItemMatrix;
use anime_harvest::harvest::{AnimeHarvestConfig, AnimeHarvester, UserHarvestConfig, UserHarvester};
use anime_harvest::repository::{connect, full_merge, table_counts, Loader};
use anime_harvest::scrapers::{FixturePage, FixtureSession, Pacer};
use anime_harvest::storage::HarvestPaths;
use tempfile::TempDir;

const BASE: &str = "https://mal.test";

fn anime_site() -> FixtureSession {
    let detail = |title: &str| {
        FixturePage::html(format!(
            "<div class='h1-title'><strong>{}</strong></div>
             <div class='leftside'>
               <div class='spaceit_pad'><span>Type:</span> TV</div>
               <div class='spaceit_pad'><span>Score:</span> 8.50 (scored by 10 users)</div>
             </div>",
            title
        ))
    };
    FixtureSession::new()
        .with_page(
            "https://mal.test/topanime.php?limit=0",
            FixturePage::html(
                "<h3 class='anime_ranking_h3'><a href='/anime/1'>1</a></h3>
                 <h3 class='anime_ranking_h3'><a href='/anime/2'>2</a></h3>",
            ),
        )
        .with_page("https://mal.test/anime/1", detail("Monster"))
        .with_page("https://mal.test/anime/2", detail("Mushishi"))
}

fn list(rows: &[(&str, &str, &str)]) -> FixturePage {
    let body: String = rows
        .iter()
        .map(|(title, score, status)| {
            format!(
                "<tr>
                   <td class='data status {}'></td>
                   <td class='data title clearfix'><a class='link sort'>{}</a></td>
                   <td class='data score'><span class='score-label'>{}</span></td>
                   <td class='data progress'>1</td>
                 </tr>",
                status, title, score
            )
        })
        .collect();
    FixturePage::html(format!(
        "<a id='show-stats-button'>Stats</a>
         <div class='list-stats'>Days: 5.0</div>
         <table>{}</table>",
        body
    ))
}

fn user_site() -> FixtureSession {
    FixtureSession::new()
        .with_page("https://mal.test/", FixturePage::html("<button>OK</button>"))
        .with_page(
            "https://mal.test/forum/?board=1&show=0",
            FixturePage::html(
                "<table><tr><td class='forum_boardrow1'><a href='/forum/?topicid=9'>t</a></td></tr></table>",
            ),
        )
        .with_page(
            "https://mal.test/forum/?topicid=9",
            FixturePage::html("<a href='/profile/alice'>a</a><a href='/profile/bob'>b</a>"),
        )
        .with_page(
            "https://mal.test/animelist/alice",
            list(&[
                ("Monster", "9", "completed"),
                ("Mushishi", "8", "watching"),
                ("Kino no Tabi", "7", "dropped"),
            ]),
        )
        .with_page(
            "https://mal.test/animelist/bob",
            list(&[("Monster", "5", "completed"), ("Mushishi", "6", "completed")]),
        )
}

#[tokio::test]
async fn test_harvest_load_and_pivot() {
    let dir = TempDir::new().unwrap();
    let paths = HarvestPaths::new(dir.path());

    let anime_config = AnimeHarvestConfig {
        total_items: 2,
        ..Default::default()
    };
    AnimeHarvester::new(BASE, anime_config, paths.clone())
        .with_pacer(Pacer::none())
        .run(&mut anime_site(), |_| {})
        .await
        .unwrap();
    UserHarvester::new(BASE, UserHarvestConfig::default(), paths.clone())
        .with_pacer(Pacer::none())
        .run(&mut user_site())
        .await
        .unwrap();

    let mut conn = connect(&dir.path().join("db").join("anime.db")).unwrap();
    let report = Loader::default().load(&mut conn, &paths).unwrap();
    assert_eq!(report.anime_inserted, 2);
    assert_eq!(report.users_inserted, 1);
    assert_eq!(report.users_rejected, 1);
    assert_eq!(report.entries_inserted, 2);
    assert_eq!(report.entries_unknown_title, 1);

    // Loading again adds nothing.
    let again = Loader::default().load(&mut conn, &paths).unwrap();
    assert_eq!(again.anime_inserted, 0);
    assert_eq!(again.anime_existing, 2);
    assert_eq!(again.entries_existing, 2);
    let counts = table_counts(&conn).unwrap();
    assert_eq!((counts.users, counts.anime, counts.entries), (1, 2, 2));

    let rows = full_merge(&conn).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.username == "alice"));
    assert!(rows.iter().all(|r| r.anime_score == Some(8.5)));

    let matrix = UserItemMatrix::from_rows(&rows);
    assert_eq!(matrix.users(), ["alice".to_string()]);
    assert_eq!(matrix.titles(), ["Monster".to_string(), "Mushishi".to_string()]);
    assert_eq!(matrix.get("alice", "Monster"), Some(9.0));
    assert_eq!(matrix.get("alice", "Mushishi"), Some(8.0));

    let preview = matrix.preview(5, 10);
    assert!(preview.starts_with("USERNAME"));
    assert!(preview.contains("alice"));
}
