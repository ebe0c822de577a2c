//! Crawl orchestration
//!
//! A job is a deterministic sequence of (site, keyword) work units. The
//! orchestrator consumes them one at a time through a single resilient
//! session, publishes progress to the job ledger after every unit, and polls
//! for cancellation at unit boundaries only. Extraction of items from fetched
//! pages is delegated to the `PageProcessor` seam; the bundled card extractor
//! is merely its default implementation.

mod extract;
mod orchestrator;

pub use extract::{CardExtractor, PageProcessor};
pub use orchestrator::{build_work_units, Orchestrator, WorkUnit};
