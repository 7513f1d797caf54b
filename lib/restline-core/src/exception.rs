//! Server-reported failures.
//!
//! A [`ResponseException`] is one value seen through two contracts:
//!
//! - [`ServiceError`]: the structured view (status, service error code,
//!   message, details, stack trace, exception class, source).
//! - [`RestException`]: the raw view, handing back the untouched
//!   [`RestResponse`] for callers that decode it themselves.
//!
//! ```ignore
//! use restline::{RestException, ServiceError};
//!
//! match future.get_response() {
//!     Err(Error::Response(e)) => {
//!         println!("{} -> {:?}", e.status(), e.service_error_message());
//!         let raw = e.response();
//!     }
//!     _ => {}
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{DataMap, ErrorResponse, RestResponse, headers};

/// Structured view over a server-reported failure.
pub trait ServiceError {
    /// HTTP status of the response.
    fn status(&self) -> u16;

    /// Error message sent by the service.
    fn service_error_message(&self) -> Option<&str>;

    /// Returns `true` if the service sent a numeric error code (zero included).
    fn has_service_error_code(&self) -> bool {
        self.service_error_code().is_some()
    }

    /// Numeric error code sent by the service.
    fn service_error_code(&self) -> Option<i32>;

    /// Structured error details sent by the service.
    fn error_details(&self) -> Option<&DataMap>;

    /// Value of the error marker header, naming who produced the payload.
    fn error_source(&self) -> Option<&str>;

    /// Stack trace of the failure on the service side.
    fn service_error_stack_trace(&self) -> Option<&str>;

    /// Class name of the exception raised on the service side.
    fn service_exception_class(&self) -> Option<&str>;
}

/// Raw view over a failed response.
pub trait RestException {
    /// The response exactly as the transport delivered it.
    fn response(&self) -> &RestResponse;
}

/// A non-2xx response, decoded as far as its payload allows.
///
/// Cloning is cheap: every clone shares one response and error record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseException {
    inner: Arc<Parts>,
}

#[derive(Debug, Clone, PartialEq)]
struct Parts {
    response: RestResponse,
    error: ErrorResponse,
}

impl ResponseException {
    /// Creates an exception from a raw response and its decoded error record.
    ///
    /// Never fails: an empty record leaves every structured field unset.
    #[must_use]
    pub fn new(response: RestResponse, error: ErrorResponse) -> Self {
        Self {
            inner: Arc::new(Parts { response, error }),
        }
    }

    /// Creates an exception whose structured fields are all unset.
    #[must_use]
    pub fn opaque(response: RestResponse) -> Self {
        Self::new(response, ErrorResponse::default())
    }

    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.inner.response.status()
    }

    /// The decoded error record.
    #[must_use]
    pub fn error_response(&self) -> &ErrorResponse {
        &self.inner.error
    }

    /// Returns `true` if the response carried the application error marker.
    #[must_use]
    pub fn is_application_error(&self) -> bool {
        crate::translate::has_error_marker(&self.inner.response)
    }

    /// Consume into the raw response.
    #[must_use]
    pub fn into_response(self) -> RestResponse {
        Arc::unwrap_or_clone(self.inner).response
    }
}

impl ServiceError for ResponseException {
    fn status(&self) -> u16 {
        self.inner.response.status()
    }

    fn service_error_message(&self) -> Option<&str> {
        self.inner.error.message.as_deref()
    }

    fn service_error_code(&self) -> Option<i32> {
        self.inner.error.service_error_code
    }

    fn error_details(&self) -> Option<&DataMap> {
        self.inner.error.error_details.as_ref()
    }

    fn error_source(&self) -> Option<&str> {
        self.inner.response.header(headers::HEADER_ERROR_RESPONSE)
    }

    fn service_error_stack_trace(&self) -> Option<&str> {
        self.inner.error.stack_trace.as_deref()
    }

    fn service_exception_class(&self) -> Option<&str> {
        self.inner.error.exception_class.as_deref()
    }
}

impl RestException for ResponseException {
    fn response(&self) -> &RestResponse {
        &self.inner.response
    }
}

impl fmt::Display for ResponseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status())?;
        if let Some(message) = &self.inner.error.message {
            write!(f, ": {message}")?;
        }
        if let Some(code) = self.inner.error.service_error_code {
            write!(f, " (service error code {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResponseException {}
