mod common;

use common::{cafes, listing, params, settings, FakeCard, FakeFeed, FakeLauncher};
use maplead_core::{FilterConfig, JobParameters, Record};
use maplead_scraper::{run_scrape, RunEnd, RunSummary, ScrapeError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn run(
    launcher: &FakeLauncher,
    params: &JobParameters,
    stagnation_limit: u32,
    cancel: &CancellationToken,
) -> (Result<RunSummary, ScrapeError>, Vec<Record>) {
    let (tx, mut rx) = mpsc::channel(256);
    let result = run_scrape(launcher, params, &settings(stagnation_limit), cancel, tx).await;
    let mut records = Vec::new();
    while let Some(record) = rx.recv().await {
        records.push(record);
    }
    (result, records)
}

fn names(records: &[Record]) -> Vec<&str> {
    records.iter().filter_map(|r| r.name.as_deref()).collect()
}

#[tokio::test]
async fn test_emits_in_visitation_order_up_to_max_results() {
    let launcher = FakeLauncher::new(FakeFeed::paged(cafes(10), 5, 5));
    let cancel = CancellationToken::new();

    let (result, records) = run(&launcher, &params(3, FilterConfig::default()), 3, &cancel).await;
    let summary = tokio_test::assert_ok!(result);

    assert_eq!(names(&records), vec!["Cafe 1", "Cafe 2", "Cafe 3"]);
    assert_eq!(summary.end, RunEnd::MaxResults);
    assert_eq!(summary.emitted, 3);
    assert_eq!(summary.scrolls, 0);
    assert_eq!(records[0].location, "Seattle");
    assert_eq!(records[0].rating, Some(4.5));
    assert_eq!(
        launcher.observed.searches(),
        vec!["https://www.google.com/maps/search/coffee+shop+in+Seattle".to_string()]
    );
    assert_eq!(launcher.observed.closes(), 1);
}

#[tokio::test]
async fn test_never_exceeds_max_results_across_scrolls() {
    for max in [1, 2, 7, 19] {
        let launcher = FakeLauncher::new(FakeFeed::paged(cafes(20), 2, 2));
        let cancel = CancellationToken::new();

        let (result, records) =
            run(&launcher, &params(max, FilterConfig::default()), 3, &cancel).await;
        let summary = result.expect("run succeeds");

        assert_eq!(records.len(), max as usize);
        assert_eq!(summary.emitted, max);
        assert_eq!(summary.cards_visited, max as usize);
        assert_eq!(summary.end, RunEnd::MaxResults);
    }
}

#[tokio::test]
async fn test_website_filter_keeps_listings_with_websites() {
    let cards = vec![
        listing("Alpha", None, Some("https://alpha.example"), None),
        listing("Bravo", None, None, None),
        listing("Charlie", None, Some("https://charlie.example"), None),
        listing("Delta", None, Some(""), None),
        listing("Echo", None, Some("https://echo.example"), None),
    ];
    let launcher = FakeLauncher::new(FakeFeed::all_visible(cards));
    let filters = FilterConfig {
        with_website_only: true,
        ..FilterConfig::default()
    };

    let (result, records) = run(&launcher, &params(10, filters), 2, &CancellationToken::new()).await;
    let summary = result.expect("run succeeds");

    assert_eq!(names(&records), vec!["Alpha", "Charlie", "Echo"]);
    assert_eq!(summary.cards_visited, 5);
    assert_eq!(summary.end, RunEnd::Stagnated);
}

#[tokio::test]
async fn test_stagnation_ends_after_exact_number_of_scrolls() {
    let launcher = FakeLauncher::new(FakeFeed::all_visible(cafes(4)));

    let (result, records) = run(
        &launcher,
        &params(100, FilterConfig::default()),
        5,
        &CancellationToken::new(),
    )
    .await;
    let summary = result.expect("run succeeds");

    assert_eq!(records.len(), 4);
    assert_eq!(summary.scrolls, 5);
    assert_eq!(summary.end, RunEnd::Stagnated);
}

#[tokio::test]
async fn test_new_cards_reset_stagnation() {
    // 2 visible, 2 more per scroll: 5 productive scrolls, then 2 idle ones.
    let launcher = FakeLauncher::new(FakeFeed::paged(cafes(12), 2, 2));

    let (result, records) = run(
        &launcher,
        &params(100, FilterConfig::default()),
        2,
        &CancellationToken::new(),
    )
    .await;
    let summary = result.expect("run succeeds");

    assert_eq!(records.len(), 12);
    assert_eq!(summary.scrolls, 7);
    assert_eq!(summary.end, RunEnd::Stagnated);
}

#[tokio::test]
async fn test_broken_cards_are_skipped() {
    let mut nameless = listing("Ghost", None, None, None);
    if let FakeCard::Listing(detail) = &mut nameless {
        detail.name = None;
    }
    let cards = vec![
        listing("Alpha", None, None, Some("4,2 stars")),
        FakeCard::Broken,
        nameless,
        listing("Delta", None, None, Some("No reviews")),
    ];
    let launcher = FakeLauncher::new(FakeFeed::all_visible(cards));

    let (result, records) = run(
        &launcher,
        &params(10, FilterConfig::default()),
        1,
        &CancellationToken::new(),
    )
    .await;
    let summary = result.expect("per-card failures do not fail the run");

    assert_eq!(names(&records), vec!["Alpha", "Delta"]);
    assert_eq!(records[0].rating, Some(4.2));
    assert_eq!(records[1].rating, None);
    assert_eq!(summary.cards_visited, 4);
}

#[tokio::test]
async fn test_duplicate_listings_are_emitted_twice() {
    let cards = vec![
        listing("Alpha", None, None, None),
        listing("Bravo", None, None, None),
        listing("Alpha", None, None, None),
    ];
    let launcher = FakeLauncher::new(FakeFeed::paged(cards, 2, 1));

    let (result, records) = run(
        &launcher,
        &params(10, FilterConfig::default()),
        1,
        &CancellationToken::new(),
    )
    .await;
    result.expect("run succeeds");

    assert_eq!(names(&records), vec!["Alpha", "Bravo", "Alpha"]);
    assert_eq!(records[0], records[2]);
}

#[tokio::test]
async fn test_cancelled_before_launch() {
    let launcher = FakeLauncher::new(FakeFeed::all_visible(cafes(3)));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (result, records) = run(&launcher, &params(3, FilterConfig::default()), 3, &cancel).await;
    let summary = result.expect("cancellation is not an error");

    assert!(records.is_empty());
    assert_eq!(summary.end, RunEnd::Cancelled);
    assert_eq!(launcher.observed.launches(), 0);
}

#[tokio::test]
async fn test_cancellation_is_observed_before_scrolling() {
    let cancel = CancellationToken::new();
    let mut feed = FakeFeed::paged(cafes(10), 2, 2);
    feed.cancel_after_opens = Some((3, cancel.clone()));
    let launcher = FakeLauncher::new(feed);

    let (result, records) = run(&launcher, &params(10, FilterConfig::default()), 3, &cancel).await;
    let summary = result.expect("cancellation is not an error");

    // The batch in flight when the token fired is finished before the loop stops.
    assert_eq!(records.len(), 4);
    assert_eq!(summary.scrolls, 1);
    assert_eq!(summary.end, RunEnd::Cancelled);
    assert_eq!(launcher.observed.closes(), 1);
}

#[tokio::test]
async fn test_missing_results_panel_is_fatal() {
    let mut feed = FakeFeed::all_visible(cafes(3));
    feed.fail_open_search = true;
    let launcher = FakeLauncher::new(feed);

    let (result, records) = run(
        &launcher,
        &params(3, FilterConfig::default()),
        3,
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(ScrapeError::Browser(_))));
    assert!(records.is_empty());
    assert_eq!(launcher.observed.closes(), 1);
}

#[tokio::test]
async fn test_enumeration_failure_keeps_emitted_records() {
    let mut feed = FakeFeed::paged(cafes(6), 2, 2);
    feed.fail_card_count_after = Some(1);
    let launcher = FakeLauncher::new(feed);

    let (result, records) = run(
        &launcher,
        &params(10, FilterConfig::default()),
        3,
        &CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(names(&records), vec!["Cafe 1", "Cafe 2"]);
    assert_eq!(launcher.observed.closes(), 1);
}

#[tokio::test]
async fn test_launch_failure() {
    let mut feed = FakeFeed::all_visible(cafes(3));
    feed.fail_launch = true;
    let launcher = FakeLauncher::new(feed);

    let (result, _) = run(
        &launcher,
        &params(3, FilterConfig::default()),
        3,
        &CancellationToken::new(),
    )
    .await;

    let err = result.expect_err("launch failure is fatal");
    assert!(err.to_string().contains("no chrome binary"));
    assert_eq!(launcher.observed.closes(), 0);
}

#[tokio::test]
async fn test_dropped_receiver_ends_the_run() {
    let launcher = FakeLauncher::new(FakeFeed::all_visible(cafes(3)));
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let result = run_scrape(
        &launcher,
        &params(3, FilterConfig::default()),
        &settings(3),
        &CancellationToken::new(),
        tx,
    )
    .await;

    assert!(matches!(result, Err(ScrapeError::ReceiverDropped)));
    assert_eq!(launcher.observed.closes(), 1);
}
