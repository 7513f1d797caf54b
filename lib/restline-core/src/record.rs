//! Built-in records.

use serde::{Deserialize, Serialize};

use crate::DataMap;

/// Structured error payload a service sends alongside a non-2xx status.
///
/// Every field is optional on the wire; missing fields decode to `None`.
/// The record doubles as an ordinary entity type, so a call may also
/// declare `ErrorResponse` as its response entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorResponse {
    /// HTTP status the service reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Application-specific numeric error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_error_code: Option<i32>,
    /// Structured error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<DataMap>,
    /// Stack trace of the failure on the service side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Class name of the exception raised on the service side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_class: Option<String>,
}

impl ErrorResponse {
    /// Returns `true` if the service sent a numeric error code.
    #[must_use]
    pub const fn has_service_error_code(&self) -> bool {
        self.service_error_code.is_some()
    }
}

/// Entity type for calls whose response carries no meaningful body.
///
/// Decodes from an empty body or from any record, ignoring its fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRecord {}
