use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Separator between category labels in the canonical categories string
pub const CATEGORY_SEPARATOR: &str = ", ";

/// Review status of a requirement
///
/// Any status may move to any other; there is no terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ReviewStatus {
    #[default]
    Review,
    Approved,
    Disapproved,
}

impl ReviewStatus {
    /// All statuses in display order
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Review,
        ReviewStatus::Approved,
        ReviewStatus::Disapproved,
    ];

    /// Wire representation used by the requirements service
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Review => "Review",
            ReviewStatus::Approved => "Approved",
            ReviewStatus::Disapproved => "Disapproved",
        }
    }

    /// Parses a status, falling back to `Review` for anything unrecognized
    pub fn normalize(value: Option<&str>) -> Self {
        value
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "review" => Ok(ReviewStatus::Review),
            "approved" => Ok(ReviewStatus::Approved),
            "disapproved" => Ok(ReviewStatus::Disapproved),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// A single requirement held by the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRecord {
    /// Identifier assigned by the service, or generated locally for
    /// classified requirements the service did not identify.
    /// `None` when an analyzed record arrived without one.
    pub id: Option<String>,

    /// The requirement statement
    pub text: String,

    /// Category labels joined with `", "`
    pub categories: String,

    pub status: ReviewStatus,
}

impl RequirementRecord {
    /// Creates a record in the initial `Review` status
    pub fn new(id: Option<String>, text: String, categories: String) -> Self {
        Self {
            id: id.filter(|id| !id.trim().is_empty()),
            text,
            categories,
            status: ReviewStatus::Review,
        }
    }

    /// Category labels in display order, one tag per segment
    pub fn category_tags(&self) -> Vec<&str> {
        self.categories
            .split(CATEGORY_SEPARATOR)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Whether the record should appear in listings
    pub fn is_listable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Fields of a record that `update_at` may change. The id is never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub text: Option<String>,
    pub categories: Option<String>,
    pub status: Option<ReviewStatus>,
}

impl RecordPatch {
    pub fn status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub(crate) fn apply(self, record: &mut RequirementRecord) {
        if let Some(text) = self.text {
            record.text = text;
        }
        if let Some(categories) = self.categories {
            record.categories = categories;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

/// A document selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a document from disk, naming it after the file
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Not a file path: {:?}", path))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        Ok(Self { name, bytes })
    }
}
