//! Link classification and job extraction
//!
//! Both stages sit on top of a `TextCompletionOracle` and differ only in the
//! prompt they send and how they read the answer.

mod classifier;
mod extractor;
mod posting;

pub use classifier::{is_affirmative, LinkClassifier, LINK_CLASSIFICATION_PROMPT};
pub use extractor::{
    clean_response, parse_postings, split_into_chunks, strip_link_markup, JobExtractor,
    JOB_EXTRACTION_PROMPT,
};
pub use posting::{JobPosting, CANONICAL_KEYS};
