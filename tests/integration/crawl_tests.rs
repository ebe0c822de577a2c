//! Integration tests for the crawl orchestrator
//!
//! These tests use wiremock to stand in for prefecture servers and drive
//! full jobs end-to-end: work-unit ordering, pagination, progress
//! publication, cancellation and outcome finalization.

use veilleur::config::{CrawlConfig, ThrottleConfig};
use veilleur::crawler::{build_work_units, CardExtractor, Orchestrator};
use veilleur::ledger::{
    InMemoryLedger, JobLedger, JobOutcome, JobStatus, LedgerError, LedgerResult, ProgressSnapshot,
};
use veilleur::registry::Site;
use veilleur::session::ResilientSession;
use veilleur::store::{DocumentStore, InMemoryStore, PageItem, StoreError, StoreResult};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast configuration: no throttle, millisecond backoff
fn test_config() -> (CrawlConfig, ThrottleConfig) {
    let crawl = CrawlConfig {
        max_attempts: 2,
        backoff_base_ms: 1,
        backoff_cap_ms: 10,
        request_timeout_secs: 5,
        ..CrawlConfig::default()
    };
    let throttle = ThrottleConfig {
        min_delay_ms: 0,
        max_delay_ms: 0,
    };
    (crawl, throttle)
}

/// A site whose domain points straight at a mock server
fn mock_site(name: &str, server: &MockServer) -> Site {
    Site {
        name: name.to_string(),
        region: "Test".to_string(),
        domain: server.uri(),
        code: "00".to_string(),
    }
}

/// A search result page carrying `count` cards
fn results_page(count: usize) -> String {
    let mut cards = String::new();
    for i in 0..count {
        cards.push_str(&format!(
            "<div class=\"fr-card\"><h3 class=\"fr-card__title\">\
             <a href=\"/doc/{}\">Document {}</a></h3>\
             <p class=\"fr-card__desc\">Description {}</p></div>",
            i, i, i
        ));
    }
    format!("<html><body>{}</body></html>", cards)
}

fn search_path(keyword: &str) -> String {
    format!("/contenu/recherche/(searchtext)/{}", keyword)
}

fn search_path_at(keyword: &str, offset: u32) -> String {
    format!("/contenu/recherche/(offset)/{}/(searchtext)/{}", offset, keyword)
}

/// Mounts a one-page result set: `count` cards, then an empty second page
async fn mount_single_page(server: &MockServer, keyword: &str, count: usize) {
    Mock::given(method("GET"))
        .and(path(search_path(keyword)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(count)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(search_path_at(keyword, 10)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(0)))
        .mount(server)
        .await;
}

async fn run_job<L: JobLedger, S: DocumentStore>(
    crawl: CrawlConfig,
    throttle: ThrottleConfig,
    sites: &[Site],
    keywords: &[String],
    ledger: &L,
    store: &S,
) -> JobOutcome {
    let session = ResilientSession::new(&crawl, &throttle).unwrap();
    let units = build_work_units(sites, keywords);
    let extractor = CardExtractor::new();
    Orchestrator::new("job-test", session, crawl, units, ledger, store, &extractor)
        .run()
        .await
}

#[tokio::test]
async fn test_full_job_completes_and_aggregates() {
    let keywords = vec!["bovin".to_string(), "volaille".to_string()];
    let mut servers = Vec::new();
    let mut sites = Vec::new();

    for name in ["Alpha", "Bravo", "Charlie"] {
        let server = MockServer::start().await;
        for keyword in &keywords {
            mount_single_page(&server, keyword, 2).await;
        }
        sites.push(mock_site(name, &server));
        servers.push(server);
    }

    let (crawl, throttle) = test_config();
    let ledger = InMemoryLedger::new();
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.items_found, 12);
    assert!(outcome.failed_units.is_empty());
    assert!(outcome.error.is_none());
    assert!(outcome.finished_at >= outcome.started_at);

    // 3 sites x 2 keywords, 2 items per unit
    assert_eq!(outcome.per_site_counts.len(), 3);
    assert!(outcome.per_site_counts.values().all(|&n| n == 4));
    assert_eq!(outcome.per_keyword_counts.len(), 2);
    assert!(outcome.per_keyword_counts.values().all(|&n| n == 6));

    assert_eq!(store.total_items(), 12);
    assert_eq!(store.items_for("Alpha", "bovin").len(), 2);

    // One snapshot per unit, completed_units monotonically increasing
    let snapshots = ledger.snapshots();
    assert_eq!(snapshots.len(), 6);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.completed_units, i + 1);
        assert_eq!(snapshot.total_units, 6);
    }

    // The ledger holds the same outcome the caller got
    let finalized = ledger.outcome().expect("Outcome was not finalized");
    assert_eq!(finalized.status, JobStatus::Completed);
    assert_eq!(finalized.items_found, 12);
}

#[tokio::test]
async fn test_pagination_walks_until_empty_page() {
    let server = MockServer::start().await;
    let keyword = "bovin";

    Mock::given(method("GET"))
        .and(path(search_path(keyword)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(search_path_at(keyword, 10)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(search_path_at(keyword, 20)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(0)))
        .expect(1)
        .mount(&server)
        .await;

    let sites = vec![mock_site("Alpha", &server)];
    let keywords = vec![keyword.to_string()];
    let (crawl, throttle) = test_config();
    let ledger = InMemoryLedger::new();
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.items_found, 13);
    assert_eq!(store.items_for("Alpha", "bovin").len(), 13);
}

#[tokio::test]
async fn test_pagination_respects_offset_cap() {
    let server = MockServer::start().await;
    let keyword = "bovin";

    // Every page is full; only the cap stops the walk
    Mock::given(method("GET"))
        .and(path(search_path(keyword)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(10)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(search_path_at(keyword, 10)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(10)))
        .expect(1)
        .mount(&server)
        .await;

    let sites = vec![mock_site("Alpha", &server)];
    let keywords = vec![keyword.to_string()];
    let (mut crawl, throttle) = test_config();
    crawl.max_offset = 10;
    let ledger = InMemoryLedger::new();
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.items_found, 20);
    // No request for offset 20 was made; unmatched requests would have
    // tripped the expect(1) verifications above
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_unit_does_not_fail_the_job() {
    let keywords = vec!["bovin".to_string(), "volaille".to_string()];
    let server = MockServer::start().await;

    // "bovin" never resolves; "volaille" works
    Mock::given(method("GET"))
        .and(path(search_path("bovin")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_single_page(&server, "volaille", 2).await;

    let sites = vec![mock_site("Alpha", &server)];
    let (crawl, throttle) = test_config();
    let ledger = InMemoryLedger::new();
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.items_found, 2);
    assert_eq!(
        outcome.failed_units,
        vec![("Alpha".to_string(), "bovin".to_string())]
    );

    // Progress was still published for the failed unit
    assert_eq!(ledger.snapshots().len(), 2);
}

#[tokio::test]
async fn test_failure_deep_in_pagination_keeps_the_unit() {
    let server = MockServer::start().await;
    let keyword = "bovin";

    Mock::given(method("GET"))
        .and(path(search_path(keyword)))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(search_path_at(keyword, 10)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sites = vec![mock_site("Alpha", &server)];
    let keywords = vec![keyword.to_string()];
    let (crawl, throttle) = test_config();
    let ledger = InMemoryLedger::new();
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    // The entry page succeeded, so the unit is not failed
    assert_eq!(outcome.status, JobStatus::Completed);
    assert!(outcome.failed_units.is_empty());
    assert_eq!(outcome.items_found, 2);
    assert_eq!(store.items_for("Alpha", "bovin").len(), 2);
}

/// Ledger that requests cancellation once `after` snapshots are published
struct CancelAfter {
    inner: InMemoryLedger,
    after: usize,
}

impl JobLedger for CancelAfter {
    fn is_cancelled(&self, _job_id: &str) -> LedgerResult<bool> {
        Ok(self.inner.snapshots().len() >= self.after)
    }

    fn publish_progress(&self, job_id: &str, snapshot: ProgressSnapshot) -> LedgerResult<()> {
        self.inner.publish_progress(job_id, snapshot)
    }

    fn finalize(&self, job_id: &str, outcome: JobOutcome) -> LedgerResult<()> {
        self.inner.finalize(job_id, outcome)
    }
}

#[tokio::test]
async fn test_cancellation_preserves_partial_results() {
    let keywords = vec!["bovin".to_string(), "volaille".to_string()];
    let mut servers = Vec::new();
    let mut sites = Vec::new();

    for name in ["Alpha", "Bravo", "Charlie"] {
        let server = MockServer::start().await;
        for keyword in &keywords {
            mount_single_page(&server, keyword, 1).await;
        }
        sites.push(mock_site(name, &server));
        servers.push(server);
    }

    let (crawl, throttle) = test_config();
    let ledger = CancelAfter {
        inner: InMemoryLedger::new(),
        after: 3,
    };
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    // Units 4-6 were never attempted; units 1-3 kept their results
    assert_eq!(outcome.status, JobStatus::Cancelled);
    assert_eq!(outcome.items_found, 3);
    assert_eq!(ledger.inner.snapshots().len(), 3);
    assert_eq!(store.total_items(), 3);
    assert_eq!(store.items_for("Alpha", "bovin").len(), 1);
    assert!(store.items_for("Charlie", "bovin").is_empty());

    let finalized = ledger.inner.outcome().expect("Outcome was not finalized");
    assert_eq!(finalized.status, JobStatus::Cancelled);
}

/// Store that rejects every batch
struct BrokenStore;

impl DocumentStore for BrokenStore {
    fn store(&self, _site: &Site, _keyword: &str, _items: Vec<PageItem>) -> StoreResult<()> {
        Err(StoreError::Backend("read-only".to_string()))
    }
}

#[tokio::test]
async fn test_store_errors_do_not_abort_the_job() {
    let keywords = vec!["bovin".to_string(), "volaille".to_string()];
    let server = MockServer::start().await;
    for keyword in &keywords {
        mount_single_page(&server, keyword, 2).await;
    }

    let sites = vec![mock_site("Alpha", &server)];
    let (crawl, throttle) = test_config();
    let ledger = InMemoryLedger::new();
    let store = BrokenStore;
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    // Rejected batches are logged and skipped; the crawl itself is unharmed
    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.items_found, 4);
    assert!(outcome.failed_units.is_empty());
    assert!(outcome.error.is_none());
    assert_eq!(ledger.snapshots().len(), 2);
}

/// Ledger whose progress publication always fails
struct BrokenLedger {
    inner: InMemoryLedger,
}

impl JobLedger for BrokenLedger {
    fn is_cancelled(&self, _job_id: &str) -> LedgerResult<bool> {
        Ok(false)
    }

    fn publish_progress(&self, _job_id: &str, _snapshot: ProgressSnapshot) -> LedgerResult<()> {
        Err(LedgerError::Backend("disk full".to_string()))
    }

    fn finalize(&self, job_id: &str, outcome: JobOutcome) -> LedgerResult<()> {
        self.inner.finalize(job_id, outcome)
    }
}

#[tokio::test]
async fn test_ledger_defect_fails_the_job_but_finalizes() {
    let server = MockServer::start().await;
    mount_single_page(&server, "bovin", 2).await;

    let sites = vec![mock_site("Alpha", &server)];
    let keywords = vec!["bovin".to_string()];
    let (crawl, throttle) = test_config();
    let ledger = BrokenLedger {
        inner: InMemoryLedger::new(),
    };
    let store = InMemoryStore::new();
    let outcome = run_job(crawl, throttle, &sites, &keywords, &ledger, &store).await;

    assert_eq!(outcome.status, JobStatus::Failed);
    let error = outcome.error.as_deref().expect("Failed job carries no error");
    assert!(error.contains("disk full"));

    // Results harvested before the defect are still readable
    assert_eq!(store.total_items(), 2);
    let finalized = ledger.inner.outcome().expect("Outcome was not finalized");
    assert_eq!(finalized.status, JobStatus::Failed);
}
