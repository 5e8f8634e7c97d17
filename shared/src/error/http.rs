//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound
            | Self::OrderNotFound
            | Self::OrderResolutionFailed
            | Self::ReviewNotFound => StatusCode::NOT_FOUND,

            Self::MalformedPayload | Self::MissingIdentity => StatusCode::UNPROCESSABLE_ENTITY,

            // Source API trouble is the caller's to retry
            Self::UpstreamFailed => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,

            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,

            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::ReviewNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::OrderResolutionFailed.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_status() {
        assert_eq!(ErrorCode::UpstreamFailed.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::UpstreamTimeout.http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_bad_request_default() {
        assert_eq!(ErrorCode::InvalidRequest.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::UnrecognizedEnvelope.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_status() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
