use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, OrgIdError>;

#[derive(Debug, Error)]
pub enum OrgIdError {
    /// The institution source is missing or malformed; the process must not serve.
    #[error("boot failure: {0}")]
    Boot(String),

    /// The gold-standard dataset for one evaluation run could not be loaded.
    #[error("dataset failure: {0}")]
    Dataset(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl OrgIdError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Boot(_) => "BOOT_FAILURE",
            Self::Dataset(_) => "DATASET_FAILURE",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Toml(_) => "TOML_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_payload(&self, operation: impl Into<String>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
            details: None,
        }
    }
}
