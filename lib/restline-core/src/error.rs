//! Error types for restline.
//!
//! Every failure a caller can observe is a variant of [`Error`]:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`Error::Connection`], [`Error::Tls`], [`Error::RequestTimeout`], [`Error::Shutdown`] | transport failures, surfaced unchanged |
//! | [`Error::Response`] | the server answered with a non-2xx status |
//! | [`Error::Decoding`], [`Error::Encoding`] | payload did not match the codec or declared type |
//! | [`Error::Timeout`], [`Error::Interrupted`] | local waits on a [`crate::ResponseFuture`] |
//! | [`Error::InvalidRequest`], [`Error::InvalidUrl`] | misuse of the dispatch API |
//! | [`Error::Execution`] | wrapper produced by [`crate::ResponseFuture::get`] |

use derive_more::{Display, Error, From};

use crate::ResponseException;

/// Main error type for restline operations.
#[derive(Debug, Clone, PartialEq, Display, Error, From)]
pub enum Error {
    /// The server answered with a non-success status.
    #[display("{_0}")]
    #[from]
    Response(ResponseException),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// The transport gave up waiting for the remote service.
    #[display("request timeout")]
    #[from(skip)]
    RequestTimeout,

    /// The transport was shut down before the request could be sent.
    #[display("transport is shut down")]
    #[from(skip)]
    Shutdown,

    /// The response payload could not be decoded into the declared shape.
    #[display("decoding error at '{path}': {message}")]
    #[from(skip)]
    Decoding {
        /// Path to the offending field (e.g. `errorDetails.city`), empty for syntax errors.
        path: String,
        /// Error message.
        message: String,
    },

    /// A request record could not be encoded.
    #[display("encoding error: {_0}")]
    #[from(skip)]
    Encoding(#[error(not(source))] String),

    /// A local wait elapsed before the call completed.
    #[display("timed out waiting for response")]
    #[from(skip)]
    Timeout,

    /// The completion side was dropped before resolving the call.
    #[display("interrupted while waiting for response")]
    #[from(skip)]
    Interrupted,

    /// The dispatch API was used in an unsupported way.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// The call failed; the underlying failure is the source.
    #[display("execution failed: {_0}")]
    #[from(skip)]
    Execution(Box<Error>),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a decoding error with path context.
    #[must_use]
    pub fn decoding(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decoding {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Wrap a failure the way [`crate::ResponseFuture::get`] reports it.
    #[must_use]
    pub fn execution(cause: Self) -> Self {
        Self::Execution(Box::new(cause))
    }

    /// Returns `true` if a local wait timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the transport itself failed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Tls(_) | Self::RequestTimeout | Self::Shutdown
        )
    }

    /// Returns `true` if this is a decoding error.
    #[must_use]
    pub const fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding { .. })
    }

    /// The wrapped failure for [`Error::Execution`], `self` otherwise.
    #[must_use]
    pub fn cause(&self) -> &Self {
        match self {
            Self::Execution(cause) => cause,
            other => other,
        }
    }

    /// Consume into the wrapped failure for [`Error::Execution`], `self` otherwise.
    #[must_use]
    pub fn into_cause(self) -> Self {
        match self {
            Self::Execution(cause) => *cause,
            other => other,
        }
    }

    /// The response exception, if this is (or wraps) a server-reported failure.
    #[must_use]
    pub fn response_exception(&self) -> Option<&ResponseException> {
        match self.cause() {
            Self::Response(exception) => Some(exception),
            _ => None,
        }
    }

    /// Returns the HTTP status code if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response_exception().map(ResponseException::status)
    }
}
