use crate::config::CrawlConfig;
use crate::crawler::PageProcessor;
use crate::ledger::{JobLedger, JobOutcome, JobStatus, ProgressSnapshot};
use crate::registry::Site;
use crate::session::{FetchOutcome, FetchRequest, ResilientSession};
use crate::store::DocumentStore;
use chrono::Utc;
use std::collections::BTreeMap;

/// One (site, keyword) crawl task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub site: Site,
    pub keyword: String,
}

/// Builds the work set: sites in registry order, keywords in request order
///
/// Site-outer ordering keeps consecutive requests on the same host, which is
/// what the per-host throttle and cookie jar are tuned for.
pub fn build_work_units(sites: &[Site], keywords: &[String]) -> Vec<WorkUnit> {
    let mut units = Vec::with_capacity(sites.len() * keywords.len());
    for site in sites {
        for keyword in keywords {
            units.push(WorkUnit {
                site: site.clone(),
                keyword: keyword.clone(),
            });
        }
    }
    units
}

/// Result of one work unit
struct UnitResult {
    items: usize,
    failed: bool,
}

/// Drives one crawl job over its work set
///
/// The orchestrator owns the session for the job's whole lifetime and
/// consumes each work unit exactly once, sequentially. Collaborator
/// references are borrowed so a host can keep inspecting the ledger and
/// store while the job runs.
pub struct Orchestrator<'a, L, S, P>
where
    L: JobLedger,
    S: DocumentStore,
    P: PageProcessor,
{
    job_id: String,
    session: ResilientSession,
    config: CrawlConfig,
    units: Vec<WorkUnit>,
    ledger: &'a L,
    store: &'a S,
    processor: &'a P,
}

impl<'a, L, S, P> Orchestrator<'a, L, S, P>
where
    L: JobLedger,
    S: DocumentStore,
    P: PageProcessor,
{
    pub fn new(
        job_id: impl Into<String>,
        session: ResilientSession,
        config: CrawlConfig,
        units: Vec<WorkUnit>,
        ledger: &'a L,
        store: &'a S,
        processor: &'a P,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            session,
            config,
            units,
            ledger,
            store,
            processor,
        }
    }

    /// Runs the job to its outcome
    ///
    /// This never returns an error to the host: fetch failures become failed
    /// units, cancellation becomes a `Cancelled` outcome, and a collaborator
    /// defect becomes a `Failed` outcome carrying the defect text. The
    /// outcome is finalized to the ledger exactly once on every exit path.
    pub async fn run(mut self) -> JobOutcome {
        let started_at = Utc::now();
        let units = std::mem::take(&mut self.units);
        let total_units = units.len();

        tracing::info!(
            "Job {} starting: {} work units",
            self.job_id,
            total_units
        );

        let mut status = JobStatus::Completed;
        let mut error: Option<String> = None;
        let mut items_found: usize = 0;
        let mut completed_units: usize = 0;
        let mut per_site_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut per_keyword_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut failed_units: Vec<(String, String)> = Vec::new();

        for unit in &units {
            match self.ledger.is_cancelled(&self.job_id) {
                Ok(true) => {
                    tracing::info!(
                        "Job {} cancelled after {}/{} units",
                        self.job_id,
                        completed_units,
                        total_units
                    );
                    status = JobStatus::Cancelled;
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    status = JobStatus::Failed;
                    error = Some(format!("Cancellation poll failed: {}", e));
                    break;
                }
            }

            let result = self.run_unit(unit).await;

            completed_units += 1;
            items_found += result.items;
            *per_site_counts.entry(unit.site.name.clone()).or_insert(0) += result.items;
            *per_keyword_counts.entry(unit.keyword.clone()).or_insert(0) += result.items;

            if result.failed {
                tracing::warn!(
                    "Unit failed: {} / {} ({}/{})",
                    unit.site.name,
                    unit.keyword,
                    completed_units,
                    total_units
                );
                failed_units.push((unit.site.name.clone(), unit.keyword.clone()));
            } else {
                tracing::info!(
                    "Unit done: {} / {} found {} items ({}/{})",
                    unit.site.name,
                    unit.keyword,
                    result.items,
                    completed_units,
                    total_units
                );
            }

            let snapshot = ProgressSnapshot {
                completed_units,
                total_units,
                current_site: unit.site.name.clone(),
                current_keyword: unit.keyword.clone(),
                items_found,
            };
            if let Err(e) = self.ledger.publish_progress(&self.job_id, snapshot) {
                status = JobStatus::Failed;
                error = Some(format!("Progress publication failed: {}", e));
                break;
            }
        }

        if let Some(defect) = &error {
            tracing::error!("Job {} failed: {}", self.job_id, defect);
        }

        let outcome = JobOutcome {
            status,
            items_found,
            per_site_counts,
            per_keyword_counts,
            failed_units,
            error,
            started_at,
            finished_at: Utc::now(),
        };

        if let Err(e) = self.ledger.finalize(&self.job_id, outcome.clone()) {
            tracing::error!("Job {} outcome could not be finalized: {}", self.job_id, e);
        }

        tracing::info!(
            "Job {} finished: {:?}, {} items, {} failed units",
            self.job_id,
            outcome.status,
            outcome.items_found,
            outcome.failed_units.len()
        );

        outcome
    }

    /// Crawls one unit, walking result pagination
    ///
    /// Pagination ends at the first page with no items, at the offset cap, or
    /// on a fetch failure. The unit only counts as failed when its first page
    /// never succeeded; a failure deeper into pagination keeps the pages
    /// already harvested.
    async fn run_unit(&mut self, unit: &WorkUnit) -> UnitResult {
        let mut offset: u32 = 0;
        let mut pages_fetched: u32 = 0;
        let mut items_found: usize = 0;

        loop {
            let url = unit.site.search_url(&unit.keyword, offset);
            let outcome = self.session.fetch(&FetchRequest::get(&url)).await;

            let body = match outcome {
                FetchOutcome::Success { body, .. } => body,
                other => {
                    if pages_fetched == 0 {
                        tracing::warn!(
                            "Entry page failed for {} / {}: {}",
                            unit.site.name,
                            unit.keyword,
                            other.label()
                        );
                        return UnitResult {
                            items: items_found,
                            failed: true,
                        };
                    }
                    tracing::warn!(
                        "Pagination stopped at offset {} for {} / {}: {}",
                        offset,
                        unit.site.name,
                        unit.keyword,
                        other.label()
                    );
                    break;
                }
            };

            pages_fetched += 1;

            let items = self
                .processor
                .extract_items(&unit.site, &unit.keyword, &body);
            if items.is_empty() {
                break;
            }

            items_found += items.len();
            if let Err(e) = self.store.store(&unit.site, &unit.keyword, items) {
                tracing::error!(
                    "Store rejected items for {} / {}: {}",
                    unit.site.name,
                    unit.keyword,
                    e
                );
            }

            offset += self.config.page_step;
            if offset > self.config.max_offset {
                tracing::debug!(
                    "Offset cap reached for {} / {}",
                    unit.site.name,
                    unit.keyword
                );
                break;
            }
        }

        UnitResult {
            items: items_found,
            failed: false,
        }
    }
}
