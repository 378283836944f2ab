//! Requirements Service Module
//!
//! The remote service owns durable requirement records, statistics, file
//! storage and classification. The dashboard reaches it only through the
//! [`RequirementsService`] trait so tests can substitute an in-memory fake.

pub mod client;
pub mod responses;

use async_trait::async_trait;

use crate::models::{ReviewStatus, UploadFile};

pub use client::{HttpRequirementsService, ServiceError};
pub use responses::{
    AnalyzeResponse, ClassifyResponse, StatsResponse, UploadResponse, WireRequirement,
};

#[async_trait]
pub trait RequirementsService: Send + Sync {
    /// Stores a document and returns the name it was stored under
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ServiceError>;

    /// Extracts and classifies the requirements in a stored document
    async fn analyze(&self, filename: &str) -> Result<AnalyzeResponse, ServiceError>;

    /// Classifies a single requirement statement
    async fn classify(&self, text: &str) -> Result<ClassifyResponse, ServiceError>;

    /// Records a new review status for a requirement
    async fn update_status(&self, id: &str, status: ReviewStatus) -> Result<(), ServiceError>;

    /// Aggregate counts by status
    async fn stats(&self) -> Result<StatsResponse, ServiceError>;
}
