use thiserror::Error;

/// Failure reported by a host bridge implementation.
///
/// Cloneable so that one failed upstream stream can be reported to every
/// subscriber that shares it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),
}

impl BridgeError {
    /// Whether the host should prompt the user to grant access again.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, BridgeError::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
