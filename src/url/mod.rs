//! URL handling module for Article-Sieve
//!
//! This module provides URL normalization (the frontier's identity key),
//! origin and path helpers, and host matching for site scope rules.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, path_segments, site_origin};
pub use matcher::host_matches;
pub use normalize::{normalize, NormalizedUrl};
