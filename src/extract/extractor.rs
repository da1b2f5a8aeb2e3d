//! Text chunks -> job postings via the oracle

use super::posting::JobPosting;
use crate::oracle::{OracleError, TextCompletionOracle};
use crate::retry::{RetryError, RetryPolicy};
use crate::ScoutError;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Prompt sent for every text chunk
pub const JOB_EXTRACTION_PROMPT: &str = r#"You are an expert job posting extractor.

Extract the job posting details from the text below. Only extract the following details:
- Job Title (key: "title")
- Job Description (key: "description")
- Salary Range (key: "salary_range")
- Responsibilities (key: "responsibilities")
- Location (key: "location")
- Qualification (key: "qualification")

For each job posting, if any of the above details are not present, include the key in the JSON with an empty string as its value.

Ignore any partial job details that exist only in a hyperlink.
Return only job postings that are fully described in the visible text.

Return the job postings as a valid JSON list, where each posting is a JSON object with the keys specified above.

If there is only one job posting, return a list with exactly one JSON object.
If there are multiple postings, return a list containing multiple JSON objects.
If no job posting is found, return an empty list: [].

Output format: valid JSON only, without triple backticks or any extra text.

Text:
{dom_content}"#;

/// Inline markdown links, `[text](url)`
const LINK_PATTERN: &str = r"\[.*?\]\(.*?\)";

fn link_regex() -> Option<&'static Regex> {
    static LINK_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    LINK_REGEX.get_or_init(|| Regex::new(LINK_PATTERN).ok()).as_ref()
}

/// Turns converted page text into job postings
#[derive(Clone)]
pub struct JobExtractor {
    oracle: Arc<dyn TextCompletionOracle>,
    policy: RetryPolicy,
    temperature: f32,
    chunk_size: usize,
}

impl JobExtractor {
    pub fn new(oracle: Arc<dyn TextCompletionOracle>, policy: RetryPolicy, chunk_size: usize) -> Self {
        Self {
            oracle,
            policy,
            temperature: 0.0,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Extracts postings from `chunks`
    ///
    /// Oversized chunks are split further. A chunk whose oracle call fails or
    /// whose answer cannot be parsed is dropped; the others still count.
    ///
    /// # Returns
    ///
    /// Postings in chunk order, each chunk's postings in the oracle's order.
    /// Fails only with `ScoutError::Cancelled`.
    pub async fn extract(
        &self,
        chunks: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<JobPosting>, ScoutError> {
        let mut postings = Vec::new();

        for chunk in chunks {
            for piece in split_into_chunks(chunk, self.chunk_size) {
                match self.extract_chunk(&piece, cancel).await {
                    Ok(found) => {
                        tracing::info!("Extracted {} job postings from chunk", found.len());
                        postings.extend(found);
                    }
                    Err(ScoutError::Cancelled) => return Err(ScoutError::Cancelled),
                    Err(e) => tracing::warn!("Dropping chunk: {}", e),
                }
            }
        }

        Ok(postings)
    }

    /// Extracts postings from a single piece of text
    pub async fn extract_text(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobPosting>, ScoutError> {
        self.extract(&[text.to_string()], cancel).await
    }

    async fn extract_chunk(
        &self,
        chunk: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobPosting>, ScoutError> {
        let content = strip_link_markup(chunk);
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prompt = JOB_EXTRACTION_PROMPT.replace("{dom_content}", &content);
        let prompt = prompt.as_str();
        let oracle = self.oracle.as_ref();
        let temperature = self.temperature;

        let response = self
            .policy
            .run(
                "extract jobs",
                cancel,
                OracleError::is_retryable,
                move |_| oracle.complete(prompt, temperature),
            )
            .await
            .map_err(|e| match e {
                RetryError::Cancelled => ScoutError::Cancelled,
                RetryError::Exhausted { last, .. } | RetryError::Rejected(last) => {
                    ScoutError::Extraction(last)
                }
            })?;

        Ok(parse_postings(&response)?)
    }
}

/// Removes `[text](url)` markup so postings are not inferred from link text alone
pub fn strip_link_markup(text: &str) -> String {
    match link_regex() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Strips code fences and a leading `json` tag from an oracle answer
///
/// When the answer contains a fenced block, only the text between the first
/// opening fence and the next closing fence is kept.
pub fn clean_response(response: &str) -> &str {
    let mut text = response.trim();

    if let Some(start) = text.find("```") {
        let fenced = &text[start + 3..];
        text = match fenced.find("```") {
            Some(end) => &fenced[..end],
            None => fenced,
        };
    }
    text = text.trim();

    if text
        .get(..4)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
    {
        text = text[4..].trim_start();
    }

    text.trim()
}

/// Parses an oracle answer into postings
///
/// Accepts a JSON array of objects or a single object. Non-object array
/// items are dropped. Any other JSON value yields no postings.
pub fn parse_postings(response: &str) -> Result<Vec<JobPosting>, serde_json::Error> {
    let value: Value = serde_json::from_str(clean_response(response))?;

    let postings = match &value {
        Value::Array(items) => items.iter().filter_map(JobPosting::from_value).collect(),
        Value::Object(_) => JobPosting::from_value(&value).into_iter().collect(),
        other => {
            tracing::debug!("Ignoring extraction answer of unexpected shape: {}", other);
            Vec::new()
        }
    };

    Ok(postings)
}

/// Splits `text` into pieces of at most `max_chars` characters
///
/// Splits happen on line boundaries; a single line longer than `max_chars`
/// is cut mid-line. Text that already fits is returned as one piece.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();

        if line_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
