//! URL handling module for Job-Scout
//!
//! This module provides fragment-stripping normalization, domain extraction and
//! the same-site checks used to keep a crawl inside one careers site.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, is_same_site};
pub use normalize::{normalize_url, strip_fragment};
