//! Logical field names and their key overrides.
//!
//! A log record may carry well-known fields that the backend understands
//! natively. They are found under a logical name, which can be renamed when
//! the default clashes with another logger's conventions.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

/// Holds the HTTP request. The value becomes the request URL. Sub-fields
/// `request.method`, `request.url` and `request.query_string` are also read.
pub const FIELD_REQUEST: &str = "request";
/// Holds the user. The value becomes the user id. Sub-fields `user.id`,
/// `user.email`, `user.username` and `user.ip_address` are also read.
pub const FIELD_USER: &str = "user";
/// Holds the transaction name, as a string.
pub const FIELD_TRANSACTION: &str = "transaction";
/// Holds the grouping fingerprint, as a comma-separated string.
pub const FIELD_FINGERPRINT: &str = "fingerprint";
/// Dropped: the backend records the runtime version itself.
pub const FIELD_RUNTIME_VERSION: &str = "runtime_version";
/// Dropped: the backend records the processor count itself.
pub const FIELD_MAX_PROCS: &str = "max_procs";

/// Overrides from logical field name to the key actually looked up.
///
/// At most one logical name maps to a given key.
#[derive(Clone, Debug, Default)]
pub struct FieldKeys {
    overrides: HashMap<String, String, FxBuildHasher>,
}

impl FieldKeys {
    /// Creates a table with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks `logical` up under `key` from now on.
    ///
    /// An empty `logical` is ignored. An empty `key` removes the override for
    /// `logical`. Any other logical name that was mapped to `key` loses its
    /// override.
    pub fn set(&mut self, logical: &str, key: &str) {
        if logical.is_empty() {
            return;
        }
        if key.is_empty() {
            self.overrides.remove(logical);
            return;
        }
        self.overrides.retain(|_, target| target != key);
        self.overrides.insert(logical.to_owned(), key.to_owned());
    }

    /// Returns the key `logical` is looked up under.
    #[must_use]
    pub fn resolve<'a>(&'a self, logical: &'a str) -> &'a str {
        self.overrides
            .get(logical)
            .map_or(logical, String::as_str)
    }

    /// Returns the number of active overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Returns whether no overrides are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Iterates over the active `(logical, key)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides
            .iter()
            .map(|(logical, key)| (logical.as_str(), key.as_str()))
    }
}
