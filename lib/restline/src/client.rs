//! The request dispatcher.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{
    ContextPropagator, DataCodec, EntityDecoder, ErrorTranslator, IntoRequest, JsonDataCodec,
    Request, RequestContext, Response, ResponseCompleter, ResponseFuture, RestRequest, Result,
    RestResponse, ShutdownCallback, Transport, headers,
};

/// Sends typed requests through a [`Transport`] and hands back futures.
///
/// Every `send_request*` call returns immediately with a [`ResponseFuture`]
/// that resolves exactly once: with a decoded [`Response`], with
/// [`crate::Error::Response`] when the server reported a failure, or with
/// the transport's own error.
///
/// # Example
///
/// ```ignore
/// use restline::prelude::*;
/// use restline::{HyperTransport, RestClient};
///
/// let client = RestClient::new(HyperTransport::new()?, "https://api.example.com")?;
///
/// let request = Request::<Greeting>::builder(ResourceMethod::Get, "greetings").key(1);
/// let greeting = client.send_request(request).await?;
/// ```
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    uri_prefix: Url,
    propagator: ContextPropagator,
    codec: Arc<dyn DataCodec>,
    translator: ErrorTranslator,
    decoder: EntityDecoder,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("uri_prefix", &self.inner.uri_prefix.as_str())
            .field("propagator", &self.inner.propagator)
            .field("codec", &self.inner.codec)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if `uri_prefix` is not an absolute URL.
    pub fn new(transport: impl Transport, uri_prefix: impl Into<String>) -> Result<Self> {
        Self::builder(transport, uri_prefix).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder(transport: impl Transport, uri_prefix: impl Into<String>) -> RestClientBuilder {
        RestClientBuilder::new(transport, uri_prefix)
    }

    /// URI every request path is resolved against.
    #[must_use]
    pub fn uri_prefix(&self) -> &Url {
        &self.inner.uri_prefix
    }

    /// Send `request` with an empty context.
    pub fn send_request<T, R>(&self, request: R) -> ResponseFuture<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        R: IntoRequest<T>,
    {
        let (completer, future) = ResponseFuture::channel();
        self.dispatch(request, None, completer);
        future
    }

    /// Send `request`, propagating attributes of `context` as headers.
    pub fn send_request_with_context<T, R>(&self, request: R, context: &RequestContext) -> ResponseFuture<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        R: IntoRequest<T>,
    {
        let (completer, future) = ResponseFuture::channel();
        self.dispatch(request, Some(context), completer);
        future
    }

    /// Send `request` and also report its outcome to `callback`.
    ///
    /// The callback receives exactly what the returned future resolves to.
    pub fn send_request_with_callback<T, R, F>(
        &self,
        request: R,
        context: Option<&RequestContext>,
        callback: F,
    ) -> ResponseFuture<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        R: IntoRequest<T>,
        F: FnOnce(Result<Response<T>>) + Send + 'static,
    {
        let (completer, future) = ResponseFuture::channel();
        future.on_complete(callback);
        self.dispatch(request, context, completer);
        future
    }

    /// Shut the transport down, reporting completion to `callback`.
    pub fn shutdown(&self, callback: ShutdownCallback) {
        debug!(uri_prefix = %self.inner.uri_prefix, "shutting down");
        self.inner.transport.shutdown(callback);
    }

    fn dispatch<T, R>(&self, request: R, context: Option<&RequestContext>, completer: ResponseCompleter<T>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
        R: IntoRequest<T>,
    {
        let empty;
        let context = match context {
            Some(context) => context,
            None => {
                empty = RequestContext::new();
                &empty
            }
        };

        let wire = request
            .into_request()
            .and_then(|request| self.inner.build_rest_request(&request, context));
        let wire = match wire {
            Ok(wire) => wire,
            Err(err) => {
                debug!(error = %err, "request rejected before dispatch");
                completer.complete(Err(err));
                return;
            }
        };

        debug!(method = %wire.method(), url = %wire.url(), "dispatching request");

        let inner = Arc::clone(&self.inner);
        self.inner.transport.send(
            wire,
            context,
            Box::new(move |result| {
                let outcome = result.and_then(|raw| inner.process(raw));
                match &outcome {
                    Ok(response) => debug!(status = response.status(), "request completed"),
                    Err(err) if err.is_transport() => warn!(error = %err, "transport failure"),
                    Err(err) => debug!(error = %err, status = ?err.status(), "request failed"),
                }
                completer.complete(outcome);
            }),
        );
    }
}

impl Inner {
    fn build_rest_request<T>(&self, request: &Request<T>, context: &RequestContext) -> Result<RestRequest> {
        let mut url = self.resolve(request.path())?;
        if !request.query_params().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_params());
        }

        let mut wire_headers = self.propagator.compute_headers(context)?;
        for (name, value) in request.headers() {
            set_header(&mut wire_headers, name, value.clone());
        }
        set_header(
            &mut wire_headers,
            headers::HEADER_RESOURCE_METHOD,
            request.method().to_string(),
        );
        if headers::find(&wire_headers, http::header::ACCEPT.as_str()).is_none() {
            wire_headers.insert(
                http::header::ACCEPT.to_string(),
                self.codec.content_type().to_string(),
            );
        }

        let mut builder = RestRequest::builder(request.method().http_method(), url);
        if let Some(input) = request.input() {
            if headers::find(&wire_headers, http::header::CONTENT_TYPE.as_str()).is_none() {
                wire_headers.insert(
                    http::header::CONTENT_TYPE.to_string(),
                    self.codec.content_type().to_string(),
                );
            }
            builder = builder.body(self.codec.map_to_bytes(input)?);
        }

        Ok(builder.headers(wire_headers).build())
    }

    /// `uri_prefix` + `/` + `path`, with no doubled slash at the seam.
    fn resolve(&self, path: &str) -> Result<Url> {
        let base = self.uri_prefix.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        };
        Ok(Url::parse(&joined)?)
    }

    fn process<T: DeserializeOwned>(&self, raw: RestResponse) -> Result<Response<T>> {
        let raw = self.translator.translate(raw)?;
        self.decoder.decode_response(raw)
    }
}

/// Replace any header named `name`, ignoring case.
fn set_header(headers: &mut std::collections::HashMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// Builder for [`RestClient`].
pub struct RestClientBuilder {
    transport: Arc<dyn Transport>,
    uri_prefix: String,
    propagator: ContextPropagator,
    codec: Arc<dyn DataCodec>,
}

impl fmt::Debug for RestClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClientBuilder")
            .field("uri_prefix", &self.uri_prefix)
            .field("propagator", &self.propagator)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl RestClientBuilder {
    /// Create a builder sending through `transport` to `uri_prefix`.
    #[must_use]
    pub fn new(transport: impl Transport, uri_prefix: impl Into<String>) -> Self {
        Self {
            transport: Arc::new(transport),
            uri_prefix: uri_prefix.into(),
            propagator: ContextPropagator::default(),
            codec: Arc::new(JsonDataCodec),
        }
    }

    /// Replace the context propagator.
    #[must_use]
    pub fn propagator(mut self, propagator: ContextPropagator) -> Self {
        self.propagator = propagator;
        self
    }

    /// Never turn the context attribute `key` into a header.
    #[must_use]
    pub fn reserve_context_key(mut self, key: impl Into<String>) -> Self {
        self.propagator = self.propagator.reserve(key);
        self
    }

    /// Only turn context attributes starting with `prefix` into headers.
    #[must_use]
    pub fn context_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.propagator = self.propagator.with_header_prefix(prefix);
        self
    }

    /// Encode inputs and decode bodies with `codec`.
    #[must_use]
    pub fn codec(mut self, codec: impl DataCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the URI prefix is not an absolute URL.
    pub fn build(self) -> Result<RestClient> {
        let uri_prefix = Url::parse(&self.uri_prefix)?;

        Ok(RestClient {
            inner: Arc::new(Inner {
                transport: self.transport,
                uri_prefix,
                propagator: self.propagator,
                translator: ErrorTranslator::new(Arc::clone(&self.codec)),
                decoder: EntityDecoder::new(Arc::clone(&self.codec)),
                codec: self.codec,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::{EmptyRecord, Error, ResourceMethod, TransportCallback};

    /// Records requests and answers each with an empty 200.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<RestRequest>>,
    }

    impl Transport for Recorder {
        fn send(&self, request: RestRequest, _: &RequestContext, callback: TransportCallback) {
            self.sent.lock().expect("lock").push(request);
            callback(Ok(RestResponse::new(200, HashMap::new(), Bytes::new())));
        }

        fn shutdown(&self, callback: ShutdownCallback) {
            callback(Ok(()));
        }
    }

    fn client(prefix: &str) -> (RestClient, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let client = RestClient::new(Arc::clone(&recorder), prefix).expect("client");
        (client, recorder)
    }

    fn last(recorder: &Recorder) -> RestRequest {
        recorder.sent.lock().expect("lock").last().cloned().expect("a request")
    }

    #[test]
    fn joins_prefix_and_path() {
        for (prefix, path) in [
            ("http://localhost:1338", "greetings/1"),
            ("http://localhost:1338/", "greetings/1"),
            ("http://localhost:1338/", "/greetings/1"),
        ] {
            let (client, recorder) = client(prefix);
            let request = Request::<EmptyRecord>::builder(ResourceMethod::Get, path);
            client.send_request(request).get_response().expect("response");

            check!(last(&recorder).url().as_str() == "http://localhost:1338/greetings/1");
        }
    }

    #[test]
    fn prefix_with_base_path() {
        let (client, recorder) = client("https://api.example.com/v2/");
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Finder, "greetings")
            .finder("search")
            .query("tone", "FRIENDLY SARCASTIC");
        client.send_request(request).get_response().expect("response");

        check!(
            last(&recorder).url().as_str()
                == "https://api.example.com/v2/greetings?q=search&tone=FRIENDLY+SARCASTIC"
        );
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let_assert!(Err(Error::InvalidUrl(_)) = RestClient::new(Recorder::default(), "not a url"));
    }

    #[test]
    fn wire_headers() {
        let (client, recorder) = client("http://localhost");
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Create, "greetings")
            .header("accept", "application/x-custom")
            .input_map(json!({"message": "hi"}).as_object().cloned().expect("object"));
        client.send_request(request).get_response().expect("response");

        let sent = last(&recorder);
        check!(sent.method() == &http::Method::POST);
        check!(sent.header("X-RestLi-Method") == Some("create"));
        check!(sent.header("Accept") == Some("application/x-custom"));
        check!(sent.header("Content-Type") == Some("application/json"));
        check!(sent.body() == Some(&Bytes::from(r#"{"message":"hi"}"#)));
    }

    #[test]
    fn request_headers_win_over_context() {
        let (client, recorder) = client("http://localhost");
        let context = RequestContext::new()
            .with_local_attr("X-Tenant", "from-context")
            .with_local_attr("X-Trace", "t1");
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Get, "greetings")
            .header("x-tenant", "from-request");
        client
            .send_request_with_context(request, &context)
            .get_response()
            .expect("response");

        let sent = last(&recorder);
        check!(sent.header("X-Tenant") == Some("from-request"));
        check!(sent.header("X-Trace") == Some("t1"));
        check!(sent.headers().keys().filter(|k| k.eq_ignore_ascii_case("x-tenant")).count() == 1);
    }

    #[test]
    fn build_failure_skips_transport() {
        let (client, recorder) = client("http://localhost");
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Get, "greetings")
            .input_map(crate::DataMap::new());

        let (tx, rx) = std::sync::mpsc::channel();
        let future = client.send_request_with_callback(request, None, move |result| {
            tx.send(result.is_err()).expect("send");
        });

        let_assert!(Err(Error::InvalidRequest(_)) = future.get_response());
        check!(rx.recv().expect("callback"));
        check!(recorder.sent.lock().expect("lock").is_empty());
    }

    #[test]
    fn invalid_context_fails_dispatch() {
        let (client, recorder) = client("http://localhost");
        let context = RequestContext::new().with_local_attr("bad header", "v");
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Get, "greetings");

        let future = client.send_request_with_context(request, &context);
        let_assert!(Err(Error::InvalidRequest(_)) = future.get_response());
        check!(recorder.sent.lock().expect("lock").is_empty());
    }

    #[test]
    fn debug_output() {
        let (client, _) = client("http://localhost:1338");
        let debug = format!("{client:?}");
        check!(debug.contains("RestClient"));
        check!(debug.contains("http://localhost:1338/"));
    }
}
