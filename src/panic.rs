//! Reporting panics.
//!
//! ```
//! use std::sync::Arc;
//!
//! use relaylog::{ClientOptions, Hook, SeveritySet};
//!
//! let hook = Arc::new(Hook::new(SeveritySet::DEFAULT_REPORTED, ClientOptions::new()).unwrap());
//! relaylog::panic::register_panic_hook(Arc::clone(&hook));
//! ```

use std::{
    panic::{self, PanicHookInfo},
    sync::Arc,
    thread,
};

use crate::{
    event::{FieldValue, Fields},
    hook::Hook,
    severity::Severity,
};

/// Installs a panic hook that reports every panic at [`Severity::Panic`], then
/// runs the previously installed panic hook.
///
/// Nothing is reported if `hook` does not accept [`Severity::Panic`]. The
/// report is only queued; flush the hook before the process exits if the
/// panic is going to take it down.
pub fn register_panic_hook(hook: Arc<Hook>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if hook.accepts(Severity::Panic) {
            hook.run(Severity::Panic, &panic_message(info), panic_fields(info));
        }
        previous(info);
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    info.payload_as_str().unwrap_or("Box<dyn Any>").to_owned()
}

fn panic_fields(info: &PanicHookInfo<'_>) -> Fields {
    let mut fields = Fields::default();
    if let Some(location) = info.location() {
        fields.insert(
            "location".to_owned(),
            FieldValue::Str(format!("{}:{}:{}", location.file(), location.line(), location.column())),
        );
    }
    if let Some(name) = thread::current().name() {
        fields.insert("thread".to_owned(), FieldValue::from(name));
    }
    fields
}
