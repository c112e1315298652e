use thiserror::Error;

use crate::types::Infeasibility;

#[derive(Error, Debug)]
pub enum FinancingError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("missing configuration: {field}")]
    MissingConfiguration {
        field: String,
    },

    #[error("financing for {client} is not feasible: {reason}")]
    InfeasibleFinancing {
        client: String,
        reason: Infeasibility,
    },

    #[error("export error: {message}")]
    Export {
        message: String,
    },

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FinancingError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FinancingError::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        FinancingError::MissingConfiguration {
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinancingError>;
