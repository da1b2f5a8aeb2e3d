//! Tabular posting output

use super::OutputResult;
use crate::extract::{JobPosting, CANONICAL_KEYS};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes postings as CSV to `path`
///
/// The header row is the six canonical keys; the file is written even when
/// there are no postings.
///
/// # Arguments
///
/// * `postings` - Postings in discovery order
/// * `path` - Destination file, created or truncated
pub fn write_postings_csv(postings: &[JobPosting], path: &Path) -> OutputResult<()> {
    let file = File::create(path)?;
    write_postings_to(postings, file)?;
    tracing::info!("Wrote {} postings to {}", postings.len(), path.display());
    Ok(())
}

/// Writes postings as CSV to any writer
pub fn write_postings_to<W: Write>(postings: &[JobPosting], writer: W) -> OutputResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CANONICAL_KEYS)?;

    for posting in postings {
        csv.write_record(posting.fields().iter().map(|(_, value)| *value))?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes postings as JSON lines, one object per posting
pub fn write_postings_jsonl<W: Write>(postings: &[JobPosting], mut writer: W) -> OutputResult<()> {
    for posting in postings {
        serde_json::to_writer(&mut writer, posting)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
