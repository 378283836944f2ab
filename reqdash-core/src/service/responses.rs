//! Response Parsing Module
//!
//! Wire schemas for requirements service responses. Absent or malformed
//! fields decode to defined defaults instead of failing the whole response.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{RequirementRecord, ReviewStatus, CATEGORY_SEPARATOR};
use crate::service::client::ServiceError;

/// A requirement as returned by analysis
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRequirement {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, alias = "text", deserialize_with = "lenient_text")]
    pub requirement: Option<String>,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
}

impl WireRequirement {
    /// Converts to a record, normalizing the status to a known value
    pub fn into_record(self) -> RequirementRecord {
        let status = ReviewStatus::normalize(self.status.as_ref().and_then(Value::as_str));
        let mut record = RequirementRecord::new(
            self.id,
            self.requirement.unwrap_or_default(),
            self.categories.unwrap_or_default(),
        );
        record.status = status;
        record
    }
}

/// Response from upload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadResponse {
    /// The stored filename, if the service reported a usable one
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.trim().is_empty())
    }
}

/// Response from analyze
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub requirements: Option<Vec<WireRequirement>>,
}

impl AnalyzeResponse {
    pub fn into_records(self) -> Vec<RequirementRecord> {
        self.requirements
            .unwrap_or_default()
            .into_iter()
            .map(WireRequirement::into_record)
            .collect()
    }
}

/// Response from classify
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifyResponse {
    #[serde(default, deserialize_with = "lenient_categories")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

impl ClassifyResponse {
    pub fn categories(&self) -> String {
        self.category.clone().unwrap_or_default()
    }
}

/// Response from the stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatsResponse {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub approved: u64,
    #[serde(default, rename = "inReview", deserialize_with = "lenient_count")]
    pub in_review: u64,
}

/// Counts that are missing, null, negative or non-numeric read as zero
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_u64).unwrap_or(0))
}

/// Ids may arrive as strings or numbers; anything else is treated as absent
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Text fields keep strings only
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Categories arrive as one joined string or as a list of labels.
/// Non-string labels are dropped; any other shape is treated as absent.
fn lenient_categories<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(labels)) => Some(
            labels
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(CATEGORY_SEPARATOR),
        ),
        _ => None,
    })
}

/// Parse a response body from the service
pub fn parse_response<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| {
        ServiceError::InvalidResponse(format!(
            "Failed to parse {} response: {}. Body: {}",
            operation,
            e,
            snippet(body)
        ))
    })
}

/// Pulls the `error` message out of a failed response body
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => snippet(body),
    }
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(200).collect()
}
