//! Metrics middleware using the `metrics` crate facade.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};

use crate::{Error, RestRequest, RestResponse, Result};

const LABEL_METHOD: &str = "method";
const LABEL_RESOURCE_METHOD: &str = "resource_method";
const LABEL_OUTCOME: &str = "outcome";

const METRIC_REQUESTS_TOTAL: &str = "restline_requests_total";
const METRIC_REQUEST_DURATION: &str = "restline_request_duration_seconds";
const METRIC_REQUESTS_IN_FLIGHT: &str = "restline_requests_in_flight";

/// Layer that records request metrics.
///
/// - `restline_requests_total` (counter), labeled by HTTP method, resource
///   method and outcome (the status code, or `error`). Requests without a
///   recognized `X-RestLi-Method` header are labeled `unknown`.
/// - `restline_request_duration_seconds` (histogram)
/// - `restline_requests_in_flight` (gauge)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsLayer {
    _private: (),
}

impl MetricsLayer {
    /// Create a new metrics layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = Metrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Metrics { inner }
    }
}

/// Service that records request metrics.
#[derive(Debug, Clone)]
pub struct Metrics<S> {
    inner: S,
}

impl<S> Service<RestRequest> for Metrics<S>
where
    S: Service<RestRequest, Response = RestResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = RestResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RestRequest) -> Self::Future {
        let method = request.method().to_string();
        let resource_method = request
            .resource_method()
            .map_or_else(|| "unknown".to_string(), |m| m.to_string());
        let start = Instant::now();
        let mut inner = self.inner.clone();

        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).increment(1.0);

        Box::pin(async move {
            let result = inner.call(request).await;

            metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).decrement(1.0);
            metrics::histogram!(
                METRIC_REQUEST_DURATION,
                LABEL_RESOURCE_METHOD => resource_method.clone()
            )
            .record(start.elapsed().as_secs_f64());

            let outcome = match &result {
                Ok(response) => response.status().to_string(),
                Err(_) => "error".to_string(),
            };
            metrics::counter!(
                METRIC_REQUESTS_TOTAL,
                LABEL_METHOD => method,
                LABEL_RESOURCE_METHOD => resource_method,
                LABEL_OUTCOME => outcome
            )
            .increment(1);

            result
        })
    }
}
