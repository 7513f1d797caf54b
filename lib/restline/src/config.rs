//! Settings for [`crate::HyperTransport`].
//!
//! The client itself has no timeouts: callers bound their own waits through
//! [`crate::ResponseFuture::get_timeout`] and friends. The values here only
//! shape how the transport talks to the network. When one of them trips, the
//! call fails with a transport error ([`crate::Error::RequestTimeout`] or
//! [`crate::Error::Connection`]) rather than a local timeout.

use std::time::Duration;

/// Network settings of a [`crate::HyperTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound on one exchange, from sending the request to the last
    /// body byte. Exceeding it fails the call with
    /// [`crate::Error::RequestTimeout`].
    pub request_timeout: Duration,
    /// Upper bound on establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Pooled keep-alive connections kept per remote host.
    pub pool_idle_per_host: usize,
    /// How long a pooled connection may sit unused before it is closed.
    pub pool_idle_timeout: Duration,
    /// Offer `h2` during ALPN. When off, every connection speaks HTTP/1.1.
    pub http2: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            http2: true,
        }
    }
}

impl TransportConfig {
    /// Starts from the defaults above.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`]; unset values keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    http2: Option<bool>,
}

impl TransportConfigBuilder {
    /// Bound on a full request/response exchange.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Bound on opening a connection.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Pooled connections kept per host. Zero disables keep-alive reuse.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Idle lifetime of a pooled connection.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Offer or withhold HTTP/2.
    #[must_use]
    pub const fn http2(mut self, enabled: bool) -> Self {
        self.http2 = Some(enabled);
        self
    }

    /// Resolve unset values against [`TransportConfig::default`].
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let TransportConfig {
            request_timeout,
            connect_timeout,
            pool_idle_per_host,
            pool_idle_timeout,
            http2,
        } = TransportConfig::default();

        TransportConfig {
            request_timeout: self.request_timeout.unwrap_or(request_timeout),
            connect_timeout: self.connect_timeout.unwrap_or(connect_timeout),
            pool_idle_per_host: self.pool_idle_per_host.unwrap_or(pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(pool_idle_timeout),
            http2: self.http2.unwrap_or(http2),
        }
    }
}
