//! Unified error codes for the order sync platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Ingestion errors (payload shape, identity fields)
//! - 4xxx: Order errors
//! - 5xxx: Upstream source API errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Ingest ====================
    /// Payload could not be mapped to a canonical order
    MalformedPayload = 1001,
    /// Webhook body matched none of the known envelope shapes
    UnrecognizedEnvelope = 1002,
    /// Payload is missing an identity field (uuid / order number)
    MissingIdentity = 1003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Every identity resolution attempt came back empty
    OrderResolutionFailed = 4002,
    /// Pending review entry not found
    ReviewNotFound = 4101,

    // ==================== 5xxx: Upstream ====================
    /// Source API returned a non-success status or malformed body
    UpstreamFailed = 5001,
    /// Source API call timed out
    UpstreamTimeout = 5002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Ingest
            ErrorCode::MalformedPayload => "Payload could not be normalized",
            ErrorCode::UnrecognizedEnvelope => "Unrecognized webhook envelope",
            ErrorCode::MissingIdentity => "Payload is missing an identity field",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderResolutionFailed => "Order reference could not be resolved",
            ErrorCode::ReviewNotFound => "Pending review not found",

            // Upstream
            ErrorCode::UpstreamFailed => "Source API request failed",
            ErrorCode::UpstreamTimeout => "Source API request timed out",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Ingest
            1001 => Ok(ErrorCode::MalformedPayload),
            1002 => Ok(ErrorCode::UnrecognizedEnvelope),
            1003 => Ok(ErrorCode::MissingIdentity),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderResolutionFailed),
            4101 => Ok(ErrorCode::ReviewNotFound),

            // Upstream
            5001 => Ok(ErrorCode::UpstreamFailed),
            5002 => Ok(ErrorCode::UpstreamTimeout),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
