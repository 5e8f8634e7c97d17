//! Pipeline error taxonomy
//!
//! `IngestError` is what a single item can fail with. The batch runner turns
//! it into a [`FailedItem`](shared::FailedItem); HTTP handlers that operate on
//! a single order convert it into [`AppError`] instead.
//!
//! | Variant | Batch effect | Retryable |
//! |---------|--------------|-----------|
//! | Adapter | per-item failure | no |
//! | ResolutionNotFound | per-item failure | no |
//! | Store | per-item failure | yes |
//! | Upstream | per-item failure | yes |
//! | Config | aborts before any item runs | no |

use shared::FailureKind;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::RepoError;
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid payload field '{field}': {reason}")]
    Adapter { field: String, reason: String },

    #[error("Order reference '{reference}' not found after {attempts} attempt(s)")]
    ResolutionNotFound { reference: String, attempts: usize },

    #[error("Store error: {0}")]
    Store(#[from] RepoError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn adapter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Adapter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Required field absent or empty
    pub fn missing(field: impl Into<String>) -> Self {
        Self::adapter(field, "required field is missing")
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Adapter { .. } => FailureKind::Adapter,
            Self::ResolutionNotFound { .. } => FailureKind::ResolutionNotFound,
            Self::Store(_) => FailureKind::Store,
            Self::Upstream(_) => FailureKind::Upstream,
            // Never reaches a batch; classified with the store for completeness
            Self::Config(_) => FailureKind::Store,
        }
    }

    /// Transient failures a caller may re-drive with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Upstream(_))
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Adapter { field, reason } => {
                let code = match field.as_str() {
                    "uuid" | "orderNumber" | "guid" | "displayNumber" => ErrorCode::MissingIdentity,
                    _ => ErrorCode::MalformedPayload,
                };
                AppError::with_message(code, format!("Invalid payload field '{field}': {reason}"))
                    .with_detail("field", field)
            }
            IngestError::ResolutionNotFound {
                reference,
                attempts,
            } => AppError::with_message(
                ErrorCode::OrderResolutionFailed,
                format!("Order reference '{reference}' could not be resolved"),
            )
            .with_detail("reference", reference)
            .with_detail("attempts", attempts),
            IngestError::Store(RepoError::NotFound(what)) => AppError::not_found(what),
            IngestError::Store(RepoError::Validation(msg)) => AppError::validation(msg),
            IngestError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                AppError::database(e.to_string())
            }
            IngestError::Upstream(e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::UpstreamTimeout, e.to_string())
            }
            IngestError::Upstream(e) => AppError::upstream(e.to_string()),
            IngestError::Config(msg) => AppError::config(msg),
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_retryable() {
        let e = IngestError::missing("uuid");
        assert_eq!(e.kind(), FailureKind::Adapter);
        assert!(!e.is_retryable());

        let e = IngestError::from(RepoError::Database("connection reset".into()));
        assert_eq!(e.kind(), FailureKind::Store);
        assert!(e.is_retryable());

        let e = IngestError::from(UpstreamError::Timeout(15_000));
        assert_eq!(e.kind(), FailureKind::Upstream);
        assert!(e.is_retryable());

        let e = IngestError::ResolutionNotFound {
            reference: "0042".into(),
            attempts: 2,
        };
        assert_eq!(e.kind(), FailureKind::ResolutionNotFound);
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = IngestError::missing("uuid").into();
        assert_eq!(app.code, ErrorCode::MissingIdentity);

        let app: AppError = IngestError::adapter("quantity", "must be positive").into();
        assert_eq!(app.code, ErrorCode::MalformedPayload);

        let app: AppError = IngestError::from(UpstreamError::Timeout(500)).into();
        assert_eq!(app.code, ErrorCode::UpstreamTimeout);

        let app: AppError = IngestError::from(UpstreamError::Transport("reset".into())).into();
        assert_eq!(app.code, ErrorCode::UpstreamFailed);

        let app: AppError = IngestError::from(RepoError::NotFound("order 7".into())).into();
        assert_eq!(app.code, ErrorCode::NotFound);

        let app: AppError =
            IngestError::from(RepoError::Validation("external_order_id is empty".into())).into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);

        let app: AppError = IngestError::ResolutionNotFound {
            reference: "42".into(),
            attempts: 1,
        }
        .into();
        assert_eq!(app.code, ErrorCode::OrderResolutionFailed);
    }
}
