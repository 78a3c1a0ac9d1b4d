#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Forwards `tracing` events to a relaylog [`Hook`].
//!
//! # How It Works
//!
//! You add [`RelayLayer`] to your tracing subscriber alongside your existing
//! layers (formatting, filtering, etc.). Events whose severity the hook
//! accepts are turned into reports; everything else passes through
//! untouched. Span fields are captured in the background and merged into the
//! reports of events inside the span.
//!
//! # Quick Start
//!
//! ```
//! use relaylog::{ClientOptions, Hook, SeveritySet};
//! use relaylog_tracing::RelayLayer;
//! use tracing_subscriber::{Registry, layer::SubscriberExt};
//!
//! let hook = Hook::new(SeveritySet::DEFAULT_REPORTED, ClientOptions::new())
//!     .expect("failed to build hook");
//!
//! let subscriber = Registry::default()
//!     .with(RelayLayer::new(hook)) // Forwards errors as reports
//!     .with(tracing_subscriber::fmt::layer()); // Your normal console output
//! tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
//!
//! #[tracing::instrument(fields(user = 42))]
//! fn example() {
//!     tracing::error!(transaction = "checkout", "something went wrong");
//! }
//! example();
//! ```
//!
//! # Severities
//!
//! | tracing level      | severity |
//! |--------------------|----------|
//! | `TRACE`, `DEBUG`   | `Debug`  |
//! | `INFO`             | `Info`   |
//! | `WARN`             | `Warn`   |
//! | `ERROR`            | `Error`  |
//!
//! An event with the boolean field `fatal = true` is raised to `Fatal`.
//! Panics are reported through [`relaylog::panic`] instead.
//!
//! Events from the `relaylog` and `relaylog_tracing` crates (and their
//! modules) are never forwarded, so the client's own diagnostics cannot loop
//! back into it.

use std::sync::Arc;

use relaylog::{FieldValue, Fields, Hook, Severity};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{layer::Context, registry::LookupSpan};

/// Field holding the event's message.
const MESSAGE_FIELD: &str = "message";
/// Boolean field raising an event to [`Severity::Fatal`].
pub const FATAL_FIELD: &str = "fatal";
/// Crates whose events are never forwarded.
const INTERNAL_CRATES: [&str; 2] = ["relaylog", "relaylog_tracing"];

/// Returns whether `target` is one of [`INTERNAL_CRATES`] or a module in one.
fn is_internal_target(target: &str) -> bool {
    INTERNAL_CRATES.iter().any(|krate| {
        target
            .strip_prefix(krate)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Returns the severity a tracing level is reported at.
#[must_use]
pub fn severity_for(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warn,
        Level::INFO => Severity::Info,
        _ => Severity::Debug,
    }
}

/// Captured field values for a span.
struct CapturedFields(Fields);

struct FieldVisitor<'a> {
    fields: &'a mut Fields,
}

impl FieldVisitor<'_> {
    fn put(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, FieldValue::F64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, FieldValue::U64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, FieldValue::Str(value.to_owned()));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, FieldValue::Str(format!("{value:?}")));
    }
}

/// A tracing layer that forwards events to a [`Hook`].
///
/// The layer is the registration boundary: it only calls [`Hook::run`] for
/// events whose severity [`Hook::accepts`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use relaylog::{ClientOptions, Hook, Severity, SeveritySet};
/// use relaylog_tracing::RelayLayer;
/// use tracing_subscriber::{Registry, layer::SubscriberExt};
///
/// let mut hook = Hook::new(SeveritySet::at_least(Severity::Warn), ClientOptions::new()).unwrap();
/// hook.add_tags([("service", "billing")]);
///
/// // Keep a handle to flush at shutdown.
/// let hook = Arc::new(hook);
/// let subscriber = Registry::default().with(RelayLayer::new(Arc::clone(&hook)));
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::warn!("disk almost full");
/// });
/// assert!(hook.flush(std::time::Duration::from_secs(2)));
/// ```
#[derive(Clone, Debug)]
pub struct RelayLayer {
    hook: Arc<Hook>,
}

impl RelayLayer {
    /// Creates a layer forwarding to `hook`.
    ///
    /// The hook must be fully configured: once it is shared with the layer it
    /// can no longer be changed.
    pub fn new(hook: impl Into<Arc<Hook>>) -> Self {
        Self { hook: hook.into() }
    }

    /// Returns the hook events are forwarded to.
    #[must_use]
    pub fn hook(&self) -> &Arc<Hook> {
        &self.hook
    }
}

impl<S> tracing_subscriber::Layer<S> for RelayLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Fields::default();
        attrs.record(&mut FieldVisitor {
            fields: &mut fields,
        });
        span.extensions_mut().insert(CapturedFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(CapturedFields(fields)) = extensions.get_mut::<CapturedFields>() {
            values.record(&mut FieldVisitor { fields });
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal_target(metadata.target()) {
            return;
        }

        let mut severity = severity_for(metadata.level());
        if !self.hook.accepts(severity) && !self.hook.accepts(Severity::Fatal) {
            return;
        }

        let mut fields = Fields::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(CapturedFields(captured)) = span.extensions().get::<CapturedFields>() {
                    fields.extend(captured.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }
        let mut event_fields = Fields::default();
        event.record(&mut FieldVisitor {
            fields: &mut event_fields,
        });

        if let Some(FieldValue::Bool(fatal)) = event_fields.get(FATAL_FIELD) {
            if *fatal {
                severity = Severity::Fatal;
            }
            event_fields.shift_remove(FATAL_FIELD);
        }
        if !self.hook.accepts(severity) {
            return;
        }

        let message = event_fields
            .shift_remove(MESSAGE_FIELD)
            .map(|m| m.to_string())
            .unwrap_or_default();
        fields.extend(event_fields);

        self.hook.run(severity, &message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(severity_for(&Level::TRACE), Severity::Debug);
        assert_eq!(severity_for(&Level::DEBUG), Severity::Debug);
        assert_eq!(severity_for(&Level::INFO), Severity::Info);
        assert_eq!(severity_for(&Level::WARN), Severity::Warn);
        assert_eq!(severity_for(&Level::ERROR), Severity::Error);
    }

    #[test]
    fn test_internal_targets() {
        assert!(is_internal_target("relaylog"));
        assert!(is_internal_target("relaylog::client"));
        assert!(is_internal_target("relaylog_tracing"));
        assert!(!is_internal_target("relaylogger_app"));
        assert!(!is_internal_target("relaylog_tracing_demo::handlers"));
        assert!(!is_internal_target("app::relaylog"));
    }
}
