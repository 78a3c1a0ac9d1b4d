#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Forwards selected log records to an error-tracking backend.
//!
//! ## Overview
//!
//! A [`Hook`] sits between a structured logger and a [`ReportClient`]. The
//! logger hands it the records whose [`Severity`] the hook accepts; the hook
//! turns each one into a [`ReportEvent`] and passes it on. Sending is
//! fire-and-forget: the logging call site never waits for the network and
//! never sees a delivery failure.
//!
//! The default client, [`Client`], queues events and delivers them from a
//! background thread through a pluggable [`Transport`]. Call
//! [`Hook::flush`] during shutdown to wait for the queue to drain.
//!
//! ## Quick Example
//!
//! ```
//! use std::time::Duration;
//!
//! use relaylog::{ClientOptions, Dsn, Fields, Hook, Identity, ReportEvent, Severity, SeveritySet, Transport};
//!
//! struct Stderr;
//!
//! impl Transport for Stderr {
//!     fn send(&self, event: ReportEvent) -> Result<(), rootcause::Report> {
//!         eprintln!("{event}");
//!         Ok(())
//!     }
//! }
//!
//! let options = ClientOptions::new()
//!     .dsn("https://public@reports.example.com/1")
//!     .identity(Identity {
//!         release: Some("shop@2.4.0".into()),
//!         environment: Some("production".into()),
//!         ..Identity::default()
//!     })
//!     .transport(|_: &Dsn| Box::new(Stderr) as Box<dyn Transport>);
//!
//! let mut hook = Hook::new(SeveritySet::DEFAULT_REPORTED, options)?;
//! hook.set_key("transaction", "route");
//!
//! let mut fields = Fields::default();
//! fields.insert("route".into(), "/checkout".into());
//! hook.run(Severity::Error, "payment declined", fields);
//!
//! assert!(hook.flush(Duration::from_secs(5)));
//! # Ok::<(), rootcause::Report<relaylog::ClientInitError>>(())
//! ```
//!
//! ## Structured Fields
//!
//! Some field names are understood by the backend and get dedicated slots in
//! the report; see the [`keys`] module. Every other field is carried along
//! as extra data. The names can be changed with [`Hook::set_key`].
//!
//! ## Ecosystem
//!
//! - **`relaylog-tracing`** - Registers a hook with a `tracing` subscriber.

mod client;
mod dsn;
mod error;
mod event;
mod hook;
pub mod keys;
mod options;
pub mod panic;
mod severity;
mod transport;

pub use self::{
    client::{Client, ReportClient, WORKER_THREAD_NAME},
    dsn::Dsn,
    error::ClientInitError,
    event::{FieldValue, Fields, ReportEvent, Request, User},
    hook::{Hook, LOGGER_NAME, SDK_IDENTIFIER},
    keys::FieldKeys,
    options::{ClientOptions, DEFAULT_MAX_QUEUE_SIZE, Identity},
    severity::{Level, ParseSeverityError, Severity, SeveritySet},
    transport::{Transport, TransportFactory},
};
