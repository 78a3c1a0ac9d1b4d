use std::{
    collections::HashSet,
    sync::{Arc, Mutex, mpsc},
    thread,
    time::Duration,
};

use relaylog::{
    ClientOptions, Dsn, FieldValue, Hook, Identity, Level, ReportClient, ReportEvent, Severity,
    SeveritySet, Transport,
};
use relaylog_tracing::RelayLayer;
use tracing::Dispatch;
use tracing_subscriber::{Registry, layer::SubscriberExt};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ReportEvent>>,
}

impl Recorder {
    fn take(&self) -> Vec<ReportEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl ReportClient for Recorder {
    fn send(&self, event: ReportEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}

fn setup(severities: SeveritySet, configure: impl FnOnce(&mut Hook)) -> (Arc<Recorder>, Dispatch) {
    let recorder = Arc::new(Recorder::default());
    let mut hook = Hook::from_client(severities, Arc::clone(&recorder), Identity::default());
    configure(&mut hook);
    let subscriber = Registry::default().with(RelayLayer::new(hook));
    (recorder, Dispatch::new(subscriber))
}

#[test]
fn test_only_accepted_severities_are_forwarded() {
    let (recorder, dispatch) = setup(SeveritySet::DEFAULT_REPORTED, |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::trace!("trace");
        tracing::debug!("debug");
        tracing::info!("info");
        tracing::warn!("warn");
        tracing::error!(attempt = 3, "error");
    });

    let events = recorder.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Level::Error);
    assert_eq!(events[0].message, "error");
    assert_eq!(events[0].extra.get("attempt"), Some(&FieldValue::I64(3)));
}

#[test]
fn test_fatal_field_raises_severity() {
    let (recorder, dispatch) = setup([Severity::Fatal].into(), |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::error!("plain error");
        tracing::error!(fatal = true, "cannot continue");
        tracing::error!(fatal = false, "still plain");
    });

    let events = recorder.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Level::Fatal);
    assert_eq!(events[0].message, "cannot continue");
    assert!(events[0].extra.get("fatal").is_none());
}

#[test]
fn test_fatal_field_is_dropped_when_false() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::warn!(fatal = false, "not fatal");
    });

    let events = recorder.take();
    assert_eq!(events[0].level, Level::Warning);
    assert!(events[0].extra.is_empty());
}

#[test]
fn test_renamed_keys_apply() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |hook| {
        hook.set_key("transaction", "route");
        hook.add_tags([("service", "billing")]);
    });

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::error!(route = "/checkout", transaction = "ignored", "failed");
    });

    let events = recorder.take();
    assert_eq!(events[0].transaction.as_deref(), Some("/checkout"));
    assert_eq!(
        events[0].extra.get("transaction"),
        Some(&FieldValue::Str("ignored".into()))
    );
    assert_eq!(events[0].tags.get("service").map(String::as_str), Some("billing"));
}

#[test]
fn test_span_fields_are_merged() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        let outer = tracing::info_span!("request", user = 7u64, region = "eu");
        let _outer = outer.enter();
        let inner = tracing::info_span!("handler", region = "us", transaction = "checkout");
        let _inner = inner.enter();
        tracing::error!(region = "ap", "failed");
    });

    let events = recorder.take();
    let event = &events[0];
    assert_eq!(event.user.as_ref().and_then(|u| u.id.as_deref()), Some("7"));
    assert_eq!(event.transaction.as_deref(), Some("checkout"));
    assert_eq!(event.extra.get("region"), Some(&FieldValue::Str("ap".into())));
}

#[test]
fn test_recorded_span_fields_are_seen() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        let span = tracing::info_span!("job", attempt = tracing::field::Empty);
        let _guard = span.enter();
        span.record("attempt", 2);
        tracing::error!("retrying");
    });

    let events = recorder.take();
    assert_eq!(events[0].extra.get("attempt"), Some(&FieldValue::I64(2)));
}

#[test]
fn test_dotted_user_fields() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::error!(user.email = "a@example.com", user.id = "u-1", "denied");
    });

    let events = recorder.take();
    let user = events[0].user.clone().unwrap();
    assert_eq!(user.email.as_deref(), Some("a@example.com"));
    assert_eq!(user.id.as_deref(), Some("u-1"));
}

#[test]
fn test_internal_targets_are_ignored() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |_| {});

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::error!(target: "relaylog::client", "queue is full");
        tracing::error!(target: "relaylog_tracing", "also internal");
        tracing::error!(target: "app", "from the app");
        tracing::error!(target: "relaylogger_app", "similar name");
    });

    let events = recorder.take();
    let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, ["from the app", "similar name"]);
}

#[test]
fn test_concurrent_logging() {
    let (recorder, dispatch) = setup(SeveritySet::all(), |_| {});

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let dispatch = dispatch.clone();
            thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    for i in 0..50 {
                        tracing::error!(thread = t, "event {t}-{i}");
                    }
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let messages: HashSet<_> = recorder.take().into_iter().map(|e| e.message).collect();
    assert_eq!(messages.len(), 16 * 50);
    assert!(messages.contains("event 15-49"));
}

struct ChannelTransport(Mutex<mpsc::Sender<ReportEvent>>);

impl Transport for ChannelTransport {
    fn send(&self, event: ReportEvent) -> Result<(), rootcause::Report> {
        self.0
            .lock()
            .unwrap()
            .send(event)
            .map_err(|_| rootcause::report!("receiver dropped"))
    }
}

#[test]
fn test_end_to_end_through_client() {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(Some(tx));
    let options = ClientOptions::new()
        .dsn("https://public@reports.example.com/7")
        .identity(Identity {
            release: Some("shop@2.4.0".into()),
            ..Identity::default()
        })
        .transport(move |_: &Dsn| {
            let tx = tx.lock().unwrap().take().unwrap();
            Box::new(ChannelTransport(Mutex::new(tx))) as Box<dyn Transport>
        });

    let hook = Arc::new(Hook::new(SeveritySet::DEFAULT_REPORTED, options).unwrap());
    let subscriber = Registry::default().with(RelayLayer::new(Arc::clone(&hook)));
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("not reported");
        tracing::error!(fingerprint = "checkout,declined", "payment declined");
    });

    assert!(hook.flush(Duration::from_secs(5)));
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event.message, "payment declined");
    assert_eq!(event.sdk.as_deref(), Some("relaylog.hook"));
    assert_eq!(event.release.as_deref(), Some("shop@2.4.0"));
    assert_eq!(event.fingerprint, ["checkout", "declined"]);
    assert!(rx.try_recv().is_err());
}
