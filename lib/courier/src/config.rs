//! Settings of the pooled hyper transport.

use std::time::Duration;

/// Settings of [`HyperTransport`](crate::HyperTransport).
///
/// These bound the transport only. A single call can be given a tighter
/// limit covering the body as well with `Request::timeout`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Time allowed between handing the request to hyper and receiving the
    /// response head, failing with `Error::Timeout`. The body is not covered.
    pub timeout: Duration,
    /// Time allowed for the TCP connect, applied by the connector. Expiry is
    /// reported as a connection error.
    pub connect_timeout: Duration,
    /// Idle connections kept in the pool for each host.
    pub pool_idle_per_host: usize,
    /// How long a pooled connection may stay idle before it is closed.
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl TransportConfig {
    /// Builder starting from the defaults.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`], unset fields keep their default.
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl TransportConfigBuilder {
    /// Set the response head timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the idle connections kept per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set how long pooled connections may stay idle.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Finish, filling unset fields from [`TransportConfig::default`].
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_per_host, 32);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn builder_keeps_unset_defaults() {
        let config = TransportConfig::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_per_host(4)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_per_host, 4);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_overrides_every_field() {
        let config = TransportConfig::builder()
            .timeout(Duration::from_secs(1))
            .connect_timeout(Duration::from_millis(200))
            .pool_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_millis(200));
        assert_eq!(config.pool_idle_per_host, 0);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(5));
    }
}
