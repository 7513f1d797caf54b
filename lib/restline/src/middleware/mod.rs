//! Tower middleware layers for [`crate::HyperTransport`].
//!
//! Layers wrap the raw exchange of one [`crate::RestRequest`] for one
//! [`crate::RestResponse`], below error translation and entity decoding.
//! The first layer added is the outermost one.
//!
//! | Layer | Helper | Feature |
//! |-------|--------|---------|
//! | [`LoggingLayer`] | `.with_logging()` | always |
//! | [`ConcurrencyLimitLayer`] | `.with_concurrency_limit()` | always |
//! | `MetricsLayer` | `.with_metrics()` | `middleware-metrics` |
//!
//! ```ignore
//! use restline::HyperTransport;
//!
//! let transport = HyperTransport::builder()
//!     .with_logging()
//!     .with_concurrency_limit(64)
//!     .build()?;
//! ```

mod logging;
#[cfg(feature = "middleware-metrics")]
mod metrics;

pub use logging::{LogLevel, Logging, LoggingLayer};
#[cfg(feature = "middleware-metrics")]
pub use metrics::{Metrics, MetricsLayer};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
