use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("INVALID_WINDOW: {0}")]
    InvalidWindow(String),
    #[error("CATALOG_UNAVAILABLE: {0}")]
    CatalogUnavailable(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
