//! The job-posting record

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six keys every posting carries, in output order
pub const CANONICAL_KEYS: [&str; 6] = [
    "title",
    "description",
    "salary_range",
    "responsibilities",
    "location",
    "qualification",
];

/// One extracted job posting
///
/// All six fields are always present; data the oracle did not provide is the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub description: String,
    pub salary_range: String,
    pub responsibilities: String,
    pub location: String,
    pub qualification: String,
}

impl JobPosting {
    /// Builds a posting from one item of the oracle's JSON answer
    ///
    /// Keys are matched case-insensitively, with spaces and hyphens treated
    /// as underscores. Unknown keys are ignored.
    ///
    /// # Returns
    ///
    /// `None` if `value` is not a JSON object
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut posting = Self::default();

        for (key, value) in object {
            let key = key.trim().to_lowercase().replace([' ', '-'], "_");
            let text = value_to_text(value);
            match key.as_str() {
                "title" => posting.title = text,
                "description" => posting.description = text,
                "salary_range" => posting.salary_range = text,
                "responsibilities" => posting.responsibilities = text,
                "location" => posting.location = text,
                "qualification" => posting.qualification = text,
                _ => {}
            }
        }

        Some(posting)
    }

    /// Returns `(key, value)` pairs in canonical order
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            (CANONICAL_KEYS[0], self.title.as_str()),
            (CANONICAL_KEYS[1], self.description.as_str()),
            (CANONICAL_KEYS[2], self.salary_range.as_str()),
            (CANONICAL_KEYS[3], self.responsibilities.as_str()),
            (CANONICAL_KEYS[4], self.location.as_str()),
            (CANONICAL_KEYS[5], self.qualification.as_str()),
        ]
    }

    /// True if every field is empty
    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.trim().is_empty())
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    }
}
