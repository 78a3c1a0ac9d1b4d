//! The delivery seam between a [`Client`](crate::Client) and the backend.
//!
//! The client owns queueing, sampling and flushing. A [`Transport`] only has
//! to deliver one event at a time; it is always called from the client's
//! worker thread, never from the logging call site.

use std::sync::Arc;

use rootcause::Report;

use crate::{dsn::Dsn, event::ReportEvent};

/// Delivers report events to a backend.
pub trait Transport: Send + Sync + 'static {
    /// Delivers one event.
    ///
    /// Errors are logged by the client's worker and the event is dropped.
    fn send(&self, event: ReportEvent) -> Result<(), Report>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, event: ReportEvent) -> Result<(), Report> {
        (**self).send(event)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, event: ReportEvent) -> Result<(), Report> {
        (**self).send(event)
    }
}

/// Creates the [`Transport`] for a configured [`Dsn`].
///
/// Any `Fn(&Dsn) -> Box<dyn Transport>` closure is a factory.
///
/// # Examples
///
/// ```
/// use relaylog::{ClientOptions, ReportEvent, Transport};
///
/// struct Stdout;
///
/// impl Transport for Stdout {
///     fn send(&self, event: ReportEvent) -> Result<(), rootcause::Report> {
///         println!("{event}");
///         Ok(())
///     }
/// }
///
/// let options = ClientOptions::new()
///     .dsn("https://key@reports.example.com/1")
///     .transport(|_dsn: &relaylog::Dsn| Box::new(Stdout) as Box<dyn Transport>);
/// ```
pub trait TransportFactory: Send + Sync + 'static {
    /// Builds a transport delivering to `dsn`.
    fn create_transport(&self, dsn: &Dsn) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&Dsn) -> Box<dyn Transport> + Send + Sync + 'static,
{
    fn create_transport(&self, dsn: &Dsn) -> Box<dyn Transport> {
        self(dsn)
    }
}
