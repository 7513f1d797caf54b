//! The boundary between the client and whatever moves bytes.

use std::sync::Arc;

use crate::{RequestContext, RestRequest, RestResponse, future::Callback};

/// Receives the raw outcome of one request.
pub type TransportCallback = Callback<RestResponse>;

/// Receives the outcome of a shutdown.
pub type ShutdownCallback = Callback<()>;

/// Sends raw requests and reports raw responses.
///
/// Implementations must invoke the callback exactly once per request, with
/// `Ok` for any response that arrived (whatever its status) and `Err` only
/// for transport failures. They may call it synchronously or from another
/// thread.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use restline_core::{
///     RequestContext, RestRequest, RestResponse, ShutdownCallback, Transport,
///     TransportCallback,
/// };
///
/// #[derive(Debug)]
/// struct Teapot;
///
/// impl Transport for Teapot {
///     fn send(&self, _: RestRequest, _: &RequestContext, callback: TransportCallback) {
///         callback(Ok(RestResponse::new(418, HashMap::new(), "".into())));
///     }
///
///     fn shutdown(&self, callback: ShutdownCallback) {
///         callback(Ok(()));
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Send `request`, reporting its outcome to `callback`.
    fn send(&self, request: RestRequest, context: &RequestContext, callback: TransportCallback);

    /// Release resources, reporting completion to `callback`.
    fn shutdown(&self, callback: ShutdownCallback);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: RestRequest, context: &RequestContext, callback: TransportCallback) {
        (**self).send(request, context, callback);
    }

    fn shutdown(&self, callback: ShutdownCallback) {
        (**self).shutdown(callback);
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: RestRequest, context: &RequestContext, callback: TransportCallback) {
        (**self).send(request, context, callback);
    }

    fn shutdown(&self, callback: ShutdownCallback) {
        (**self).shutdown(callback);
    }
}
