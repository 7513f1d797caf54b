//! Transports: the [`Transport`] boundary and its hyper-based implementation.

mod hyper;

pub use self::hyper::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};
pub use restline_core::{ShutdownCallback, Transport, TransportCallback};
