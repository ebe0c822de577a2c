//! Site registry collaborator
//!
//! The registry supplies the ordered list of sites a job crawls. Ordering
//! must be deterministic for a given filter: work units are enumerated from
//! it, and progress percentages are only reproducible if the enumeration is.

mod prefectures;

pub use prefectures::StaticRegistry;

use thiserror::Error;

/// Errors from registry lookups
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No sites found for region: {0}")]
    UnknownRegion(String),

    #[error("No site found with name: {0}")]
    UnknownSite(String),

    #[error("Registry backend error: {0}")]
    Backend(String),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// One crawlable site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Human-readable name (the prefecture name)
    pub name: String,

    /// Administrative region the site belongs to
    pub region: String,

    /// Site domain, e.g. `morbihan.gouv.fr`
    pub domain: String,

    /// Department code, e.g. `56`
    pub code: String,
}

impl Site {
    /// Base URL for this site
    ///
    /// Prefecture domains are bare (`morbihan.gouv.fr`) and served under
    /// `https://www.`; a domain already carrying a scheme is used verbatim,
    /// which is how test registries point at local servers.
    pub fn base_url(&self) -> String {
        if self.domain.contains("://") {
            self.domain.trim_end_matches('/').to_string()
        } else {
            format!("https://www.{}", self.domain)
        }
    }

    /// Search URL for a keyword at a pagination offset
    ///
    /// Offset zero uses the short form; later pages carry the offset segment.
    pub fn search_url(&self, keyword: &str, offset: u32) -> String {
        let base = self.base_url();
        if offset > 0 {
            format!(
                "{}/contenu/recherche/(offset)/{}/(searchtext)/{}?SearchText={}",
                base, offset, keyword, keyword
            )
        } else {
            format!(
                "{}/contenu/recherche/(searchtext)/{}?SearchText={}",
                base, keyword, keyword
            )
        }
    }
}

/// Supplies sites and regions to crawl
///
/// `list_sites` must return the same ordering for the same filters every
/// time.
pub trait SiteRegistry {
    /// Lists sites, optionally filtered by region and/or site name
    ///
    /// Filters match case-insensitively. An empty result for a non-empty
    /// filter is an error: a misspelled filter should fail loudly rather than
    /// silently crawl nothing.
    fn list_sites(
        &self,
        region_filter: Option<&str>,
        site_filter: Option<&str>,
    ) -> RegistryResult<Vec<Site>>;

    /// Lists distinct region names in registry order
    fn list_regions(&self) -> RegistryResult<Vec<String>>;
}
