use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResourceKind {
    Folder,
    File,
    Spreadsheet,
    Sheet,
}

/// Failures reported by the storage and spreadsheet services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: ResourceKind, id: String },
    #[error("A sheet named '{name}' already exists")]
    NameCollision { name: String },
    #[error("Service request failed: {details}")]
    Unclassified { details: String },
}

impl ServiceError {
    pub fn not_found<S: Into<String>>(kind: ResourceKind, id: S) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn name_collision<S: Into<String>>(name: S) -> Self {
        ServiceError::NameCollision { name: name.into() }
    }

    pub fn unclassified<S: Into<String>>(details: S) -> Self {
        ServiceError::Unclassified {
            details: details.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}
