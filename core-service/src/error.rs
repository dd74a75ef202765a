use core_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl CoreError {
    /// The catalog failure behind this error, if any.
    pub fn as_catalog(&self) -> Option<&CatalogError> {
        match self {
            CoreError::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
