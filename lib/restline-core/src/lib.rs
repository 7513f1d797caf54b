//! Core types for the restline RPC client.
//!
//! This crate holds everything that does not touch the network:
//! - [`Request`] and [`RequestBuilder`] - typed requests on a resource
//! - [`Response`] - decoded successful responses
//! - [`ResponseFuture`] - the handle every call returns
//! - [`ResponseException`], [`ServiceError`], [`RestException`] - server-reported failures
//! - [`ErrorTranslator`] and [`EntityDecoder`] - raw response processing
//! - [`RequestContext`] and [`ContextPropagator`] - per-call attributes
//! - [`Transport`] - the boundary to whatever sends the bytes
//! - [`Error`] and [`Result`] - error handling

mod codec;
mod context;
mod decoder;
mod error;
mod exception;
mod future;
pub mod headers;
mod method;
pub mod prelude;
mod record;
mod request;
mod response;
mod rest;
mod transport;
mod translate;

pub use codec::{DataCodec, DataMap, JsonDataCodec, from_data_map, to_data_map};
pub use context::{ContextPropagator, RequestContext};
pub use decoder::EntityDecoder;
pub use error::{Error, Result};
pub use exception::{ResponseException, RestException, ServiceError};
pub use future::{Callback, ResponseCompleter, ResponseFuture};
pub use method::ResourceMethod;
pub use record::{EmptyRecord, ErrorResponse};
pub use request::{IntoRequest, Request, RequestBuilder};
pub use response::Response;
pub use rest::{RestRequest, RestRequestBuilder, RestResponse};
pub use translate::{ErrorTranslator, ResponseKind};
pub use transport::{ShutdownCallback, Transport, TransportCallback};
