/// Reasons a [`Client`](crate::Client) cannot be built from its
/// [`ClientOptions`](crate::ClientOptions).
///
/// Returned as the context of a [`rootcause::Report`], with the offending value
/// attached.
#[derive(Debug, thiserror::Error)]
pub enum ClientInitError {
    /// The DSN is not a valid report endpoint.
    #[error("invalid DSN: {0}")]
    InvalidDsn(&'static str),
    /// The sample rate is not a number in `0.0..=1.0`.
    #[error("sample rate must be between 0.0 and 1.0")]
    InvalidSampleRate,
    /// The queue capacity is zero.
    #[error("queue size must be greater than zero")]
    InvalidQueueSize,
    /// A DSN was configured but nothing can deliver to it.
    #[error("a DSN is configured but no transport factory is set")]
    MissingTransport,
    /// The background worker could not be started.
    #[error("failed to spawn the transport worker")]
    WorkerSpawn(#[source] std::io::Error),
}
