//! Veilleur: a resilient keyword crawler for French prefecture websites
//!
//! This crate implements the fetch-and-orchestration engine behind a
//! long-running document watch: it walks a site × keyword work set, fetching
//! search result pages through a session that throttles, disguises and retries
//! requests, and reports progress to a job ledger that can cancel the job
//! cooperatively at any work-unit boundary.

pub mod config;
pub mod crawler;
pub mod identity;
pub mod ledger;
pub mod registry;
pub mod session;
pub mod store;
pub mod throttle;

use thiserror::Error;

/// Main error type for veilleur operations
#[derive(Debug, Error)]
pub enum VeilleurError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Site registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("Job ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Document store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Orchestrator defect: {0}")]
    Defect(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid environment override {name}: {message}")]
    InvalidOverride { name: String, message: String },
}

/// Result type alias for veilleur operations
pub type Result<T> = std::result::Result<T, VeilleurError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Orchestrator, PageProcessor, WorkUnit};
pub use identity::{Identity, IdentityPool};
pub use ledger::{InMemoryLedger, JobLedger, JobOutcome, JobStatus, ProgressSnapshot};
pub use registry::{Site, SiteRegistry, StaticRegistry};
pub use session::{FetchOutcome, FetchRequest, ResilientSession};
pub use store::{DocumentStore, InMemoryStore, PageItem};
pub use throttle::Throttle;
