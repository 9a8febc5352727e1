//! HeydayTarkkaSource against a local mock server, plus refresh_series_file
//! against an in-process source. No real network.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use httpmock::prelude::*;
use tk_fetch::{
    refresh_series_file, FetchError, HeydayTarkkaSource, RefreshOutcome, SpotPriceSource,
};

const PATH: &str = "/fortum/tarkka/graafi.php";

fn page(prices: &[f64]) -> String {
    let entries: Vec<String> = prices
        .iter()
        .enumerate()
        .map(|(h, p)| {
            format!("{{ data: [[{h},{p}]], highlightColor: '#529900', bars: {{ show: true, barWidth: 0.7 }} }}")
        })
        .collect();
    format!(
        "<html><script>\n$.plot($(\"#graafi\"), [\n{}], options);\n</script></html>",
        entries.join(",")
    )
}

#[tokio::test]
async fn fetches_and_parses_graph_page() {
    let server = MockServer::start_async().await;
    let expected = vec![4.63, 4.12, 3.98, -0.05];
    let body = page(&expected);
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).body(body);
        })
        .await;

    let source = HeydayTarkkaSource::new_with_base_url(server.base_url(), PATH);
    let prices = source.fetch_hourly_prices().await.unwrap();

    mock.assert_async().await;
    assert_eq!(prices, expected);
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(502);
        })
        .await;

    let source = HeydayTarkkaSource::new_with_base_url(server.base_url(), PATH);
    let err = source.fetch_hourly_prices().await.unwrap_err();
    assert!(matches!(err, FetchError::Status(502)));
}

#[tokio::test]
async fn empty_body_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).body("");
        })
        .await;

    let source = HeydayTarkkaSource::new_with_base_url(server.base_url(), PATH);
    let err = source.fetch_hourly_prices().await.unwrap_err();
    assert!(matches!(err, FetchError::Empty));
}

// ---------------------------------------------------------------------------
// refresh_series_file
// ---------------------------------------------------------------------------

struct CountingSource {
    prices: Vec<f64>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl SpotPriceSource for CountingSource {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn fetch_hourly_prices(&self) -> Result<Vec<f64>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.prices.clone())
    }
}

#[tokio::test]
async fn refresh_fetches_once_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tarkka_data.json");
    let today = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let source = CountingSource {
        prices: vec![1.0; 24],
        calls: AtomicUsize::new(0),
    };

    let first = refresh_series_file(&source, &path, today).await.unwrap();
    assert_eq!(first, RefreshOutcome::Saved { hours: 24 });

    let second = refresh_series_file(&source, &path, today).await.unwrap();
    assert_eq!(second, RefreshOutcome::AlreadyFresh);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    // Next day the file is stale and gets replaced.
    let tomorrow = today.succ_opt().unwrap();
    let third = refresh_series_file(&source, &path, tomorrow).await.unwrap();
    assert_eq!(third, RefreshOutcome::Saved { hours: 24 });
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);

    let series = tk_store::load_fresh(&path, tomorrow).unwrap();
    assert_eq!(series.reference_day, tomorrow);
}

#[tokio::test]
async fn refresh_refuses_directory_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = CountingSource {
        prices: vec![],
        calls: AtomicUsize::new(0),
    };
    let today = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    assert!(refresh_series_file(&source, dir.path(), today).await.is_err());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}
