//! The report client: a bounded queue drained by one worker thread.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
        mpsc::{self, Receiver, SyncSender, TrySendError},
    },
    thread,
    time::Duration,
};

use rootcause::Report;
use tracing::{debug, trace, warn};

use crate::{
    dsn::Dsn,
    error::ClientInitError,
    event::ReportEvent,
    options::ClientOptions,
    transport::Transport,
};

/// Name of the thread that delivers events.
pub const WORKER_THREAD_NAME: &str = "relaylog-transport";

/// Something report events can be handed to.
///
/// Implementations must not block the caller of [`send`](Self::send) beyond
/// the cost of enqueueing, and must absorb delivery failures themselves.
pub trait ReportClient: Send + Sync + 'static {
    /// Hands an event over for delivery. Never reports failure to the caller.
    fn send(&self, event: ReportEvent);

    /// Waits until every event handed over so far has been delivered, or
    /// until `timeout` elapses.
    ///
    /// Returns `false` if the timeout was reached, in which case some events
    /// may not have been delivered.
    fn flush(&self, timeout: Duration) -> bool;
}

impl<C: ReportClient + ?Sized> ReportClient for Arc<C> {
    fn send(&self, event: ReportEvent) {
        (**self).send(event);
    }

    fn flush(&self, timeout: Duration) -> bool {
        (**self).flush(timeout)
    }
}

#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self) {
        *self.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self, timeout: Duration) -> bool {
        let count = self.lock();
        let (count, _) = self
            .drained
            .wait_timeout_while(count, timeout, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count == 0
    }
}

/// The default [`ReportClient`].
///
/// Events are sampled, stamped with the SDK identifier and queued; a worker
/// thread hands them to the [`Transport`] one at a time. A full queue drops
/// the new event. A client built without a DSN is disabled and drops
/// everything.
///
/// Dropping the client does not flush it. The worker delivers what is
/// already queued and then exits on its own.
pub struct Client {
    sender: Option<SyncSender<ReportEvent>>,
    pending: Arc<Pending>,
    sample_rate: f32,
    sdk_identifier: Option<String>,
    dsn: Option<Dsn>,
}

impl Client {
    /// Builds a client and starts its worker.
    ///
    /// # Errors
    ///
    /// Fails if the DSN is malformed, the sample rate is outside `0.0..=1.0`,
    /// the queue size is zero, a DSN is set without a transport factory, or
    /// the worker thread cannot be spawned.
    pub fn new(options: &ClientOptions) -> Result<Self, Report<ClientInitError>> {
        if !(0.0..=1.0).contains(&options.sample_rate) {
            return Err(Report::new(ClientInitError::InvalidSampleRate)
                .attach(format!("sample_rate: {}", options.sample_rate)));
        }
        if options.max_queue_size == 0 {
            return Err(Report::new(ClientInitError::InvalidQueueSize));
        }

        let pending = Arc::new(Pending::default());

        let Some(raw_dsn) = options.dsn.as_deref().filter(|d| !d.trim().is_empty()) else {
            debug!("no DSN configured, reporting is disabled");
            return Ok(Self {
                sender: None,
                pending,
                sample_rate: options.sample_rate,
                sdk_identifier: None,
                dsn: None,
            });
        };

        let dsn: Dsn = raw_dsn.parse()?;
        let Some(factory) = &options.transport else {
            return Err(
                Report::new(ClientInitError::MissingTransport).attach(format!("DSN: {dsn}"))
            );
        };
        let transport = factory.create_transport(&dsn);

        let (sender, receiver) = mpsc::sync_channel(options.max_queue_size);
        let worker_pending = Arc::clone(&pending);
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || run_worker(receiver, transport, worker_pending))
            .map_err(|e| Report::new(ClientInitError::WorkerSpawn(e)))?;

        Ok(Self {
            sender: Some(sender),
            pending,
            sample_rate: options.sample_rate,
            sdk_identifier: None,
            dsn: Some(dsn),
        })
    }

    /// Sets the SDK identifier stamped on events that carry none.
    pub fn set_sdk_identifier(&mut self, identifier: impl Into<String>) {
        self.sdk_identifier = Some(identifier.into());
    }

    /// Returns the SDK identifier, if one is set.
    #[must_use]
    pub fn sdk_identifier(&self) -> Option<&str> {
        self.sdk_identifier.as_deref()
    }

    /// Returns the parsed DSN, if the client is enabled.
    #[must_use]
    pub fn dsn(&self) -> Option<&Dsn> {
        self.dsn.as_ref()
    }

    /// Returns whether the client delivers events at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    fn sampled_out(&self) -> bool {
        self.sample_rate < 1.0 && fastrand::f32() >= self.sample_rate
    }
}

impl ReportClient for Client {
    fn send(&self, mut event: ReportEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        if self.sampled_out() {
            trace!(report_message = %event.message, "event sampled out");
            return;
        }
        if event.sdk.is_none() {
            event.sdk.clone_from(&self.sdk_identifier);
        }

        self.pending.add();
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.pending.done();
                warn!(report_message = %event.message, "report queue is full, dropping event");
            }
            Err(TrySendError::Disconnected(event)) => {
                self.pending.done();
                warn!(report_message = %event.message, "transport worker is gone, dropping event");
            }
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.pending.wait(timeout)
    }
}

impl core::fmt::Debug for Client {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("enabled", &self.is_enabled())
            .field("dsn", &self.dsn)
            .field("sample_rate", &self.sample_rate)
            .field("sdk_identifier", &self.sdk_identifier)
            .finish_non_exhaustive()
    }
}

fn run_worker(receiver: Receiver<ReportEvent>, transport: Box<dyn Transport>, pending: Arc<Pending>) {
    debug!("transport worker started");
    for event in receiver {
        match panic::catch_unwind(AssertUnwindSafe(|| transport.send(event))) {
            Ok(Ok(())) => {}
            Ok(Err(report)) => warn!(error = %report, "failed to deliver report"),
            Err(_) => warn!("transport panicked, dropping report"),
        }
        pending.done();
    }
    debug!("transport worker stopped");
}
