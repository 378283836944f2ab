use std::fmt;
use thiserror::Error;

use crate::service::ServiceError;

/// The remote step a workflow was performing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Analysis,
    Classification,
    StatusUpdate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Upload => write!(f, "upload"),
            Operation::Analysis => write!(f, "analysis"),
            Operation::Classification => write!(f, "classification"),
            Operation::StatusUpdate => write!(f, "status update"),
        }
    }
}

/// Errors surfaced by dashboard workflows. None of them leave the
/// dashboard state inconsistent.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Rejected before any remote call was made
    #[error("{0}")]
    Validation(String),

    #[error("{operation} failed: {source}")]
    Remote {
        operation: Operation,
        #[source]
        source: ServiceError,
    },
}

impl DashboardError {
    pub(crate) fn no_file_selected() -> Self {
        DashboardError::Validation("no file selected".to_string())
    }

    pub(crate) fn no_pending_upload() -> Self {
        DashboardError::Validation("no pending upload".to_string())
    }

    pub(crate) fn remote(operation: Operation, source: ServiceError) -> Self {
        DashboardError::Remote { operation, source }
    }

    /// The failed remote step, if any
    pub fn operation(&self) -> Option<Operation> {
        match self {
            DashboardError::Validation(_) => None,
            DashboardError::Remote { operation, .. } => Some(*operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(DashboardError::no_file_selected().to_string(), "no file selected");

        let err = DashboardError::remote(Operation::Upload, ServiceError::MissingField("filename"));
        assert_eq!(err.to_string(), "upload failed: Response is missing `filename`");
        assert_eq!(err.operation(), Some(Operation::Upload));

        let err = DashboardError::remote(
            Operation::Analysis,
            ServiceError::Status {
                status: 500,
                message: "Internal server error".into(),
            },
        );
        assert!(err.to_string().starts_with("analysis failed"));
    }
}
