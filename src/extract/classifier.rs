//! "Is this link a job posting?" via the oracle

use crate::browser::LinkCandidate;
use crate::oracle::{OracleError, TextCompletionOracle};
use crate::retry::{RetryError, RetryPolicy};
use crate::ScoutError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Prompt sent for every candidate link
pub const LINK_CLASSIFICATION_PROMPT: &str = "You are a helpful AI assistant. \
Determine if the following link likely leads to a job posting.
Respond ONLY with 'YES' if it is likely a job, or '' if not.

Here is the link text: \"{link_text}\"
And here is the link URL: \"{link_href}\"";

/// Decides whether links lead to job postings
///
/// Classification is fail-closed: any oracle failure, after retries, means
/// "not a job link". There is no local heuristic fallback.
#[derive(Clone)]
pub struct LinkClassifier {
    oracle: Arc<dyn TextCompletionOracle>,
    policy: RetryPolicy,
    temperature: f32,
}

impl LinkClassifier {
    pub fn new(oracle: Arc<dyn TextCompletionOracle>, policy: RetryPolicy) -> Self {
        Self {
            oracle,
            policy,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Fills the classification prompt
    pub fn build_prompt(link_text: &str, link_href: &str) -> String {
        LINK_CLASSIFICATION_PROMPT
            .replace("{link_text}", link_text)
            .replace("{link_href}", link_href)
    }

    /// Classifies `link`, surfacing oracle failures
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The oracle answered exactly `YES`
    /// * `Ok(false)` - Any other answer, or a link with neither text nor href
    /// * `Err(ScoutError::Classification)` - The oracle kept failing
    /// * `Err(ScoutError::Cancelled)` - The crawl was cancelled meanwhile
    pub async fn try_classify(
        &self,
        link: &LinkCandidate,
        cancel: &CancellationToken,
    ) -> Result<bool, ScoutError> {
        let text = link.text.trim();
        let href = link.href.trim();
        if text.is_empty() && href.is_empty() {
            return Ok(false);
        }

        tracing::debug!("Evaluating link: text='{}', href='{}'", text, href);

        let prompt = Self::build_prompt(text, href);
        let prompt = prompt.as_str();
        let oracle = self.oracle.as_ref();
        let temperature = self.temperature;

        let response = self
            .policy
            .run(
                "classify link",
                cancel,
                OracleError::is_retryable,
                move |_| oracle.complete(prompt, temperature),
            )
            .await;

        match response {
            Ok(answer) => {
                tracing::trace!("Oracle answered '{}' for {}", answer, href);
                Ok(is_affirmative(&answer))
            }
            Err(RetryError::Cancelled) => Err(ScoutError::Cancelled),
            Err(RetryError::Exhausted { last, .. }) | Err(RetryError::Rejected(last)) => {
                Err(ScoutError::Classification {
                    href: href.to_string(),
                    source: last,
                })
            }
        }
    }

    /// Classifies `link`, treating every failure as "not a job link"
    pub async fn classify(&self, link: &LinkCandidate, cancel: &CancellationToken) -> bool {
        match self.try_classify(link, cancel).await {
            Ok(is_job) => is_job,
            Err(e) => {
                tracing::warn!("{}; treating link as non-job", e);
                false
            }
        }
    }
}

/// True only for the exact token `YES`, ignoring case and surrounding whitespace
pub fn is_affirmative(response: &str) -> bool {
    response.trim().eq_ignore_ascii_case("YES")
}
