//! URL handling module for Shoreline
//!
//! This module provides URL normalization, origin extraction and crawl scope
//! confinement.

mod normalize;
mod origin;

use crate::{UrlError, UrlResult};
use ::url::Url;

// Re-export main functions
pub use normalize::{normalize_parsed, normalize_url};
pub use origin::{origin_prefix, robots_url};

/// The boundary a crawl is confined to
///
/// A URL is in scope when its normalized string starts with the scope prefix.
/// The default prefix is the seed's origin (`scheme://host[:port]/`); a longer
/// prefix such as `https://host/docs` narrows the crawl to part of a site.
/// Matching is plain string prefix matching, so `/docs` also admits `/docs-old`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    prefix: String,
}

impl Scope {
    /// Creates a scope covering the whole origin of `seed`
    pub fn for_seed(seed: &Url) -> UrlResult<Self> {
        Ok(Self {
            prefix: origin_prefix(seed)?,
        })
    }

    /// Creates a scope with an explicit prefix
    ///
    /// The prefix is normalized like any other URL and must contain the seed.
    ///
    /// # Returns
    ///
    /// * `Ok(Scope)` - The prefix is valid and covers the seed
    /// * `Err(UrlError)` - The prefix is malformed or excludes the seed
    pub fn with_prefix(seed: &Url, prefix: &str) -> UrlResult<Self> {
        let prefix = normalize_url(prefix)?.to_string();

        if !seed.as_str().starts_with(&prefix) {
            return Err(UrlError::SeedOutOfScope {
                seed: seed.to_string(),
                prefix,
            });
        }

        Ok(Self { prefix })
    }

    /// Returns true if `url` falls inside this scope
    pub fn contains(&self, url: &Url) -> bool {
        url.as_str().starts_with(&self.prefix)
    }

    /// The prefix every in-scope URL starts with
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
