//! Typed RPC-over-HTTP client.
//!
//! Build a [`Request`], hand it to a [`RestClient`], and read the outcome
//! from the returned [`ResponseFuture`]: block on it, `.await` it, or
//! register a callback.
//!
//! # Example
//!
//! ```ignore
//! use restline::prelude::*;
//! use restline::{HyperTransport, RestClient};
//!
//! #[derive(Debug, Deserialize)]
//! struct Greeting {
//!     id: u64,
//!     message: String,
//! }
//!
//! let client = RestClient::new(HyperTransport::new()?, "https://api.example.com")?;
//!
//! let future = client.send_request(
//!     Request::<Greeting>::builder(ResourceMethod::Get, "greetings").key(42),
//! );
//!
//! match future.await {
//!     Ok(response) => println!("{}", response.entity().message),
//!     Err(Error::Response(e)) => println!("{:?}", e.service_error_message()),
//!     Err(other) => return Err(other),
//! }
//! ```

mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use client::{RestClient, RestClientBuilder};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use connector::https_connector;
pub use transport::{
    BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture, ShutdownCallback,
    Transport, TransportCallback,
};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use restline_core::{
    Callback, ContextPropagator, DataCodec, DataMap, EmptyRecord, EntityDecoder, Error,
    ErrorResponse, ErrorTranslator, IntoRequest, JsonDataCodec, Request, RequestBuilder,
    RequestContext, ResourceMethod, Response, ResponseCompleter, ResponseException,
    ResponseFuture, ResponseKind, RestException, RestRequest, RestRequestBuilder, RestResponse,
    Result, ServiceError, from_data_map, headers, to_data_map,
};
