//! Client configuration.
//!
//! # Environment Variables
//!
//! [`ClientOptions::from_env`] reads:
//!
//! - `RELAYLOG_DSN` - The client key. Unset or empty disables reporting.
//! - `RELAYLOG_SAMPLE_RATE` - Fraction of events to send, `0.0` to `1.0`.
//! - `RELAYLOG_ENVIRONMENT`, `RELAYLOG_RELEASE`, `RELAYLOG_DIST`,
//!   `RELAYLOG_SERVER_NAME` - The [`Identity`] stamped on every report.
//!
//! The accepted severities are read separately, by
//! [`SeveritySet::from_env`](crate::SeveritySet::from_env).

use core::fmt;
use std::sync::Arc;

use rootcause::Report;

use crate::{error::ClientInitError, transport::TransportFactory};

/// Default capacity of the client's send queue.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100;

/// Identifies the running process on every report.
///
/// Captured once when a [`Hook`](crate::Hook) is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    /// Distribution of the release, e.g. a build number.
    pub dist: Option<String>,
    /// Deployment environment, e.g. `production`.
    pub environment: Option<String>,
    /// Release identifier, e.g. a version or commit.
    pub release: Option<String>,
    /// Host name.
    pub server_name: Option<String>,
}

impl Identity {
    /// Reads the identity from the `RELAYLOG_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            dist: env_string("RELAYLOG_DIST"),
            environment: env_string("RELAYLOG_ENVIRONMENT"),
            release: env_string("RELAYLOG_RELEASE"),
            server_name: env_string("RELAYLOG_SERVER_NAME"),
        }
    }
}

/// Configuration for a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientOptions {
    /// The client key. `None` or empty disables the client.
    pub dsn: Option<String>,
    /// Fraction of events to send, `0.0` to `1.0`.
    pub sample_rate: f32,
    /// Events that may wait for delivery before new ones are dropped.
    pub max_queue_size: usize,
    /// Identification stamped on every report.
    pub identity: Identity,
    /// Builds the transport for the DSN. Required when a DSN is set.
    pub transport: Option<Arc<dyn TransportFactory>>,
}

impl ClientOptions {
    /// Creates options with reporting disabled and all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from the `RELAYLOG_*` environment variables.
    ///
    /// No transport is set; add one with [`ClientOptions::transport`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientInitError::InvalidSampleRate`] if `RELAYLOG_SAMPLE_RATE`
    /// is set but is not a number.
    pub fn from_env() -> Result<Self, Report<ClientInitError>> {
        let mut options = Self {
            dsn: env_string("RELAYLOG_DSN"),
            identity: Identity::from_env(),
            ..Self::default()
        };
        if let Some(rate) = env_string("RELAYLOG_SAMPLE_RATE") {
            options.sample_rate = rate.trim().parse().map_err(|_| {
                Report::new(ClientInitError::InvalidSampleRate)
                    .attach(format!("RELAYLOG_SAMPLE_RATE={rate}"))
            })?;
        }
        Ok(options)
    }

    /// Sets the client key.
    #[must_use]
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    /// Sets the sample rate.
    #[must_use]
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the queue capacity.
    #[must_use]
    pub fn max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Sets the identity.
    #[must_use]
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Sets the transport factory.
    #[must_use]
    pub fn transport(mut self, factory: impl TransportFactory) -> Self {
        let factory: Arc<dyn TransportFactory> = Arc::new(factory);
        self.transport = Some(factory);
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dsn: None,
            sample_rate: 1.0,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            identity: Identity::default(),
            transport: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("dsn", &self.dsn)
            .field("sample_rate", &self.sample_rate)
            .field("max_queue_size", &self.max_queue_size)
            .field("identity", &self.identity)
            .field("transport", &self.transport.as_ref().map(|_| ".."))
            .finish()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var_os(name)
        .map(|v| v.to_string_lossy().into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert!(options.dsn.is_none());
        assert_eq!(options.sample_rate, 1.0);
        assert_eq!(options.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
        assert!(options.transport.is_none());
    }

    #[test]
    fn test_debug_hides_transport() {
        let options = ClientOptions::new()
            .dsn("https://k@h/1")
            .transport(|_: &crate::Dsn| -> Box<dyn crate::Transport> { unreachable!() });
        let rendered = format!("{options:?}");
        assert!(rendered.contains("transport: Some(\"..\")"), "{rendered}");
    }
}
