//! [`Transport`] implementation using hyper-util.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::debug;

use crate::middleware::{ConcurrencyLimitLayer, LoggingLayer};
#[cfg(feature = "middleware-metrics")]
use crate::middleware::MetricsLayer;
use crate::{
    Error, RequestContext, RestRequest, RestResponse, Result, ShutdownCallback, Transport,
    TransportCallback, TransportConfig, TransportConfigBuilder, connector::https_connector,
};

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<RestRequest, RestResponse, Error>;

/// Future type of the middleware stack.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<RestResponse>> + Send + 'static>>;

/// Makes a [`BoxedService`] shareable across threads.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: RestRequest) -> ServiceFuture {
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.oneshot(request).await })
    }
}

/// Bare hyper client at the bottom of the middleware stack.
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    request_timeout: Duration,
}

impl RawHyperClient {
    fn new(config: &TransportConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config));

        Self {
            inner,
            request_timeout: config.request_timeout,
        }
    }

    fn build_hyper_request(request: RestRequest) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Flatten response headers. Repeated fields are joined with `", "` in
    /// arrival order, and values that are not valid UTF-8 are decoded lossily.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        let mut extracted: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            match extracted.entry(name.to_string()) {
                Entry::Occupied(mut entry) => {
                    let joined = entry.get_mut();
                    joined.push_str(", ");
                    joined.push_str(&value);
                }
                Entry::Vacant(slot) => {
                    slot.insert(value.into_owned());
                }
            }
        }
        extracted
    }

    async fn execute(&self, request: RestRequest) -> Result<RestResponse> {
        let hyper_request = Self::build_hyper_request(request)?;

        tokio::time::timeout(self.request_timeout, self.exchange(hyper_request))
            .await
            .map_err(|_| Error::RequestTimeout)?
    }

    async fn exchange(&self, request: http::Request<Full<Bytes>>) -> Result<RestResponse> {
        let response = self
            .inner
            .request(request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(RestResponse::new(status, headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<RestRequest> for RawHyperClient {
    type Response = RestResponse;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: RestRequest) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

/// Tracks in-flight requests so shutdown can wait for them.
#[derive(Debug, Default)]
struct Lifecycle {
    closed: AtomicBool,
    in_flight: AtomicUsize,
    drained: Notify,
}

impl Lifecycle {
    /// Register a request; `None` once shutdown has begun.
    fn enter(self: &Arc<Self>) -> Option<InFlight> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(self));
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        Some(guard)
    }

    async fn drain(&self) {
        loop {
            let mut notified = pin!(self.drained.notified());
            notified.as_mut().enable();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct InFlight(Arc<Lifecycle>);

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.drained.notify_waiters();
        }
    }
}

/// Hyper-backed [`Transport`] with connection pooling, TLS and tower middleware.
///
/// Requests run on the tokio runtime captured at build time, so
/// [`Transport::send`] never blocks. After [`Transport::shutdown`] new sends
/// fail with [`Error::Shutdown`]; the shutdown callback fires once every
/// request already in flight has completed.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use restline::{HyperTransport, RestClient};
///
/// let transport = HyperTransport::builder()
///     .request_timeout(Duration::from_secs(5))
///     .with_logging()
///     .build()?;
/// let client = RestClient::new(transport, "https://api.example.com")?;
/// ```
pub struct HyperTransport {
    service: SyncService,
    config: TransportConfig,
    runtime: Handle,
    lifecycle: Arc<Lifecycle>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .field("in_flight", &self.lifecycle.in_flight.load(Ordering::Relaxed))
            .field("closed", &self.lifecycle.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] outside a tokio runtime.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Returns `true` once shutdown has begun.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.closed.load(Ordering::SeqCst)
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: RestRequest, _context: &RequestContext, callback: TransportCallback) {
        let Some(guard) = self.lifecycle.enter() else {
            debug!(url = %request.url(), "transport is shut down, refusing request");
            callback(Err(Error::Shutdown));
            return;
        };

        let exchange = self.service.call(request);
        self.runtime.spawn(async move {
            let result = exchange.await;
            callback(result);
            drop(guard);
        });
    }

    fn shutdown(&self, callback: ShutdownCallback) {
        self.lifecycle.closed.store(true, Ordering::SeqCst);
        let lifecycle = Arc::clone(&self.lifecycle);

        self.runtime.spawn(async move {
            lifecycle.drain().await;
            debug!("transport shut down");
            callback(Ok(()));
        });
    }
}

/// Builder for [`HyperTransport`].
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: TransportConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
    runtime: Option<Handle>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Set the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.request_timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Allow or forbid HTTP/2.
    #[must_use]
    pub fn http2(mut self, enabled: bool) -> Self {
        self.config = self.config.http2(enabled);
        self
    }

    /// Run requests on `runtime` instead of the runtime current at build time.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Add a Tower layer around the raw exchange.
    ///
    /// Layers are applied in order: first added = outermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<RestRequest, Response = RestResponse, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<RestRequest>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Log every exchange at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log every exchange at debug level, with headers.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Cap the number of concurrent exchanges.
    #[must_use]
    pub fn with_concurrency_limit(self, max: usize) -> Self {
        self.layer(ConcurrencyLimitLayer::new(max))
    }

    /// Record request metrics.
    #[cfg(feature = "middleware-metrics")]
    #[must_use]
    pub fn with_metrics(self) -> Self {
        self.layer(MetricsLayer::new())
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if no runtime was given and the
    /// builder is not running inside a tokio runtime.
    pub fn build(self) -> Result<HyperTransport> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| {
                Error::invalid_request(
                    "HyperTransport needs a tokio runtime: build it inside one or pass .runtime(handle)",
                )
            })?,
        };

        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(&config));

        // Wrap in reverse so the first layer added ends up outermost.
        for layer_fn in self.layers.iter().rev() {
            service = layer_fn(service);
        }

        Ok(HyperTransport {
            service: SyncService::new(service),
            config,
            runtime,
            lifecycle: Arc::default(),
        })
    }
}
