//! Configuration module for veilleur
//!
//! Configuration comes from an optional TOML file plus environment overrides.
//! Every knob has a safe default, so a job can run with no file at all.
//!
//! # Example
//!
//! ```no_run
//! use veilleur::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("veilleur.toml")).unwrap();
//! println!("Retry budget: {}", config.crawl.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, ThrottleConfig};

// Re-export parser functions
pub use parser::{apply_env_overrides, config_from_env, load_config};
