//! Forwarding tracing errors as reports.
//!
//! Errors logged inside instrumented functions are reported together with the
//! fields of the spans they were logged in. The transport prints each report
//! instead of sending it anywhere.
//!
//! If you currently use `tracing_subscriber::fmt::init()`, this shows how to
//! expand that setup to add `RelayLayer`.

use std::{sync::Arc, time::Duration};

use relaylog::{ClientOptions, Dsn, Hook, Identity, ReportEvent, SeveritySet, Transport};
use relaylog_tracing::RelayLayer;
use rootcause::prelude::*;
use tracing::instrument;
use tracing_subscriber::{Registry, layer::SubscriberExt};

#[derive(Debug, thiserror::Error)]
#[error("card declined")]
struct DeclinedError;

struct PrintTransport;

impl Transport for PrintTransport {
    fn send(&self, event: ReportEvent) -> Result<(), Report> {
        println!("report: {event}");
        if let Some(transaction) = &event.transaction {
            println!("  transaction: {transaction}");
        }
        if let Some(user) = &event.user {
            println!("  user: {user:?}");
        }
        Ok(())
    }
}

fn charge(_amount: u64) -> Result<(), Report<DeclinedError>> {
    Err(report!(DeclinedError).attach("issuer returned code 51"))
}

#[instrument(fields(transaction = "checkout", user = user_id))]
fn checkout(user_id: u64, amount: u64) {
    if let Err(report) = charge(amount) {
        tracing::error!(error = %report, amount, "payment failed");
    }
    tracing::error!(fatal = true, "ledger unreachable");
}

fn main() {
    let options = ClientOptions::new()
        .dsn("https://public@reports.example.com/1")
        .identity(Identity {
            release: Some("shop@2.4.0".into()),
            environment: Some("demo".into()),
            ..Identity::default()
        })
        .transport(|_: &Dsn| Box::new(PrintTransport) as Box<dyn Transport>);

    let mut hook =
        Hook::new(SeveritySet::DEFAULT_REPORTED, options).expect("failed to build hook");
    hook.add_tags([("service", "shop")]);
    let hook = Arc::new(hook);

    // This replaces `tracing_subscriber::fmt::init()` to add forwarding
    let subscriber = Registry::default()
        .with(RelayLayer::new(Arc::clone(&hook)))
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber).expect("failed to set default subscriber");

    relaylog::panic::register_panic_hook(Arc::clone(&hook));

    checkout(12345, 4200);

    if !hook.flush(Duration::from_secs(2)) {
        eprintln!("some reports were not delivered in time");
    }
}
