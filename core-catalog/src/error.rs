use bridge_traits::BridgeError;
use thiserror::Error;

/// Failures surfaced by catalog traversal, lookup and search.
///
/// Cloneable because one failed subscription is reported to every caller
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Malformed identifier text or components. Always a caller bug.
    #[error("Invalid media identifier: {0}")]
    InvalidIdentifier(String),

    /// Children were requested for a leaf (track).
    #[error("Not browsable: {0}")]
    NotBrowsable(String),

    /// Structurally valid identifier naming a node that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Passed through verbatim from the host media store.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Media source unavailable: {0}")]
    SourceUnavailable(String),

    /// Invalid catalog tree declaration, detected while building the tree.
    #[error("Catalog configuration error: {0}")]
    Configuration(String),
}

impl From<BridgeError> for CatalogError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::PermissionDenied(reason) => CatalogError::PermissionDenied(reason),
            other => CatalogError::SourceUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
