pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod pending;
pub mod service;
pub mod stats;
pub mod storage;

// Re-export commonly used types
pub use collection::RequirementCollection;
pub use config::{get_config_dir, get_config_path, DashboardConfig};
pub use controller::{LifecycleController, StatusChange};
pub use error::{DashboardError, Operation};
pub use models::{RecordPatch, RequirementRecord, ReviewStatus, UploadFile};
pub use pending::PendingUploadCache;
pub use service::{HttpRequirementsService, RequirementsService, ServiceError};
pub use stats::{StatsReconciler, StatsSnapshot, StatsSource};
pub use storage::{PendingUpload, SessionStorage};
