//! Prelude module for convenient imports.
//!
//! ```ignore
//! use restline_core::prelude::*;
//! ```

pub use crate::{
    EmptyRecord, Error, ErrorResponse, IntoRequest, Request, RequestBuilder, RequestContext,
    ResourceMethod, Response, ResponseException, ResponseFuture, RestException, Result,
    ServiceError,
};
