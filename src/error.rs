//! Error types for ordering operations and CLI reports.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidPermutation,

    // Not found errors
    TaskNotFound,
    SubtaskNotFound,
    GroupNotFound,
    TagNotFound,
    QuoteNotFound,
    ItemNotFound,
    PartitionNotFound,

    // Conflict errors
    AlreadyExists,

    // Internal errors
    StorageWriteFailure,
    StorageReadFailure,
    DatabaseError,
    InternalError,
}

/// Failures raised by the ordered collection manager.
///
/// Validation failures (`InvalidPermutation`, `ItemNotFound`,
/// `PartitionNotFound`) are raised before any write is issued.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("ordered ids are not a permutation of {scope}: {reason}")]
    InvalidPermutation { scope: String, reason: String },

    #[error("item {item_id} is not in {partition}")]
    ItemNotFound { item_id: String, partition: String },

    #[error("partition not found: {0}")]
    PartitionNotFound(String),

    #[error("storage write failed: {0}")]
    StorageWriteFailure(#[source] anyhow::Error),

    #[error("storage read failed: {0}")]
    StorageReadFailure(#[source] anyhow::Error),
}

impl OrderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::InvalidPermutation { .. } => ErrorCode::InvalidPermutation,
            OrderError::ItemNotFound { .. } => ErrorCode::ItemNotFound,
            OrderError::PartitionNotFound(_) => ErrorCode::PartitionNotFound,
            OrderError::StorageWriteFailure(_) => ErrorCode::StorageWriteFailure,
            OrderError::StorageReadFailure(_) => ErrorCode::StorageReadFailure,
        }
    }

    /// True for failures that were rejected before touching storage.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            OrderError::StorageWriteFailure(_) | OrderError::StorageReadFailure(_)
        )
    }
}

/// Result type for ordering operations.
pub type OrderResult<T> = std::result::Result<T, OrderError>;

/// Structured error for CLI output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn subtask_not_found(subtask_id: &str) -> Self {
        Self::new(
            ErrorCode::SubtaskNotFound,
            format!("Subtask not found: {}", subtask_id),
        )
    }

    pub fn group_not_found(group_id: &str) -> Self {
        Self::new(
            ErrorCode::GroupNotFound,
            format!("Subtask group not found: {}", group_id),
        )
    }

    pub fn tag_not_found(tag_id: &str) -> Self {
        Self::new(ErrorCode::TagNotFound, format!("Tag not found: {}", tag_id))
    }

    pub fn quote_not_found(quote_id: &str) -> Self {
        Self::new(
            ErrorCode::QuoteNotFound,
            format!("Quote not found: {}", quote_id),
        )
    }

    pub fn already_exists(what: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("{} already exists: {}", what, name),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorReport {}

impl From<OrderError> for ErrorReport {
    fn from(err: OrderError) -> Self {
        let report = ErrorReport::new(err.code(), err.to_string());
        match err {
            OrderError::StorageWriteFailure(source) | OrderError::StorageReadFailure(source) => {
                report.with_details(format!("{:#}", source))
            }
            _ => report,
        }
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ErrorReport {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ErrorReport>() {
            Ok(report) => return report,
            Err(err) => err,
        };
        match err.downcast::<OrderError>() {
            Ok(order_err) => order_err.into(),
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => ErrorReport::database(sql_err),
                Err(err) => ErrorReport::internal(format!("{:#}", err)),
            },
        }
    }
}
