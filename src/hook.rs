//! The hook turning log records into report events.

use core::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use rootcause::Report;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::{
    client::{Client, ReportClient},
    error::ClientInitError,
    event::{Fields, ReportEvent, Request, User},
    keys::{
        FIELD_FINGERPRINT, FIELD_MAX_PROCS, FIELD_REQUEST, FIELD_RUNTIME_VERSION,
        FIELD_TRANSACTION, FIELD_USER, FieldKeys,
    },
    options::{ClientOptions, Identity},
    severity::{Severity, SeveritySet},
};

/// SDK identifier the hook tags its client with.
pub const SDK_IDENTIFIER: &str = "relaylog.hook";

/// Logger name carried by every report.
pub const LOGGER_NAME: &str = "relaylog";

/// Forwards log records of selected severities to a [`ReportClient`].
///
/// Configuration ([`add_tags`](Self::add_tags), [`set_key`](Self::set_key))
/// needs `&mut self`, so it has to happen before the hook is shared with the
/// threads that log. After that the hook is read-only and [`run`](Self::run)
/// may be called from any number of threads.
///
/// # Examples
///
/// ```
/// use std::{sync::Arc, time::Duration};
///
/// use relaylog::{ClientOptions, Fields, Hook, Severity, SeveritySet};
///
/// // Without a DSN the client is disabled and drops every report.
/// let mut hook = Hook::new(SeveritySet::DEFAULT_REPORTED, ClientOptions::new())?;
/// hook.add_tags([("service", "billing")]);
/// hook.set_key("user", "account_id");
///
/// let hook = Arc::new(hook);
/// if hook.accepts(Severity::Error) {
///     hook.run(Severity::Error, "charge failed", Fields::default());
/// }
/// assert!(hook.flush(Duration::from_secs(2)));
/// # Ok::<(), rootcause::Report<relaylog::ClientInitError>>(())
/// ```
pub struct Hook {
    client: Arc<dyn ReportClient>,
    severities: SeveritySet,
    keys: FieldKeys,
    tags: IndexMap<String, String, FxBuildHasher>,
    identity: Identity,
}

impl Hook {
    /// Builds a hook sending to a new [`Client`] configured by `options`.
    ///
    /// # Errors
    ///
    /// Returns the client's construction error, see [`Client::new`].
    pub fn new(
        severities: SeveritySet,
        options: ClientOptions,
    ) -> Result<Self, Report<ClientInitError>> {
        let mut client = Client::new(&options)?;
        client.set_sdk_identifier(SDK_IDENTIFIER);
        Ok(Self::from_client(severities, client, options.identity))
    }

    /// Builds a hook sending to an existing client.
    ///
    /// To keep a handle to the client, pass a [`std::sync::Arc`] of it.
    pub fn from_client(
        severities: SeveritySet,
        client: impl ReportClient,
        identity: Identity,
    ) -> Self {
        let client = Arc::new(client).unsize(unsize::Coercion!(to dyn ReportClient));
        Self {
            client,
            severities,
            keys: FieldKeys::new(),
            tags: IndexMap::default(),
            identity,
        }
    }

    /// Adds tags to every subsequent report. A tag that is already set is
    /// overwritten.
    pub fn add_tags<K, V>(&mut self, tags: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Looks the logical field `old_key` up under `new_key` from now on.
    ///
    /// Passing `""` for `new_key` restores the default key. Passing `""` for
    /// `old_key` does nothing. See [`FieldKeys::set`].
    pub fn set_key(&mut self, old_key: &str, new_key: &str) {
        self.keys.set(old_key, new_key);
    }

    /// Returns the key the logical field `name` is looked up under.
    #[must_use]
    pub fn key<'a>(&'a self, name: &'a str) -> &'a str {
        self.keys.resolve(name)
    }

    /// Returns whether records of `severity` should be passed to
    /// [`run`](Self::run).
    #[inline]
    #[must_use]
    pub fn accepts(&self, severity: Severity) -> bool {
        self.severities.contains(severity)
    }

    /// Returns the accepted severities.
    #[must_use]
    pub fn severities(&self) -> SeveritySet {
        self.severities
    }

    /// Returns the tags added so far.
    #[must_use]
    pub fn tags(&self) -> &IndexMap<String, String, FxBuildHasher> {
        &self.tags
    }

    /// Returns the shared client handle.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn ReportClient> {
        &self.client
    }

    /// Builds a report for one log record and hands it to the client.
    ///
    /// The caller is expected to have checked [`accepts`](Self::accepts)
    /// already; `run` does not filter.
    pub fn run(&self, severity: Severity, message: &str, fields: Fields) {
        let event = self.to_event(severity, message, fields);
        self.client.send(event);
    }

    /// Builds the report [`run`](Self::run) would send, without sending it.
    #[must_use]
    pub fn to_event(&self, severity: Severity, message: &str, fields: Fields) -> ReportEvent {
        let mut event = ReportEvent::new(severity.level(), message);
        event.dist.clone_from(&self.identity.dist);
        event.environment.clone_from(&self.identity.environment);
        event.release.clone_from(&self.identity.release);
        event.server_name.clone_from(&self.identity.server_name);
        event.tags = self.tags.clone();

        for (name, value) in fields {
            match self.classify(&name) {
                Target::Dropped => {}
                Target::Transaction => event.transaction = Some(value.to_string()),
                Target::Fingerprint => {
                    event.fingerprint = value
                        .to_string()
                        .split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(str::to_owned)
                        .collect();
                }
                Target::Request(member) => {
                    let request = event.request.get_or_insert_with(Request::default);
                    let slot = match member {
                        RequestMember::Url => &mut request.url,
                        RequestMember::Method => &mut request.method,
                        RequestMember::QueryString => &mut request.query_string,
                    };
                    *slot = Some(value.to_string());
                }
                Target::User(member) => {
                    let user = event.user.get_or_insert_with(User::default);
                    let slot = match member {
                        UserMember::Id => &mut user.id,
                        UserMember::Email => &mut user.email,
                        UserMember::Username => &mut user.username,
                        UserMember::IpAddress => &mut user.ip_address,
                    };
                    *slot = Some(value.to_string());
                }
                Target::Extra => {
                    event.extra.insert(name, value);
                }
            }
        }

        event
    }

    fn classify(&self, name: &str) -> Target {
        if name == self.key(FIELD_RUNTIME_VERSION) || name == self.key(FIELD_MAX_PROCS) {
            return Target::Dropped;
        }
        if name == self.key(FIELD_TRANSACTION) {
            return Target::Transaction;
        }
        if name == self.key(FIELD_FINGERPRINT) {
            return Target::Fingerprint;
        }
        if let Some(member) = sub_field(name, self.key(FIELD_REQUEST)) {
            return match member {
                None | Some("url") => Target::Request(RequestMember::Url),
                Some("method") => Target::Request(RequestMember::Method),
                Some("query_string") => Target::Request(RequestMember::QueryString),
                Some(_) => Target::Extra,
            };
        }
        if let Some(member) = sub_field(name, self.key(FIELD_USER)) {
            return match member {
                None | Some("id") => Target::User(UserMember::Id),
                Some("email") => Target::User(UserMember::Email),
                Some("username") => Target::User(UserMember::Username),
                Some("ip_address") => Target::User(UserMember::IpAddress),
                Some(_) => Target::Extra,
            };
        }
        Target::Extra
    }

    /// Waits for the client to deliver everything handed to it so far, for at
    /// most `timeout`. Returns `false` if the timeout was reached.
    ///
    /// Call this during shutdown; nothing flushes automatically.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.client.flush(timeout)
    }
}

/// Where a structured field ends up in the report.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Target {
    Dropped,
    Transaction,
    Fingerprint,
    Request(RequestMember),
    User(UserMember),
    Extra,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RequestMember {
    Url,
    Method,
    QueryString,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum UserMember {
    Id,
    Email,
    Username,
    IpAddress,
}

/// Matches `name` against `key` or `key.<member>`.
///
/// Returns `Some(None)` for an exact match and `Some(Some(member))` for a
/// sub-field.
fn sub_field<'a>(name: &'a str, key: &str) -> Option<Option<&'a str>> {
    let rest = name.strip_prefix(key)?;
    if rest.is_empty() {
        return Some(None);
    }
    rest.strip_prefix('.').map(Some)
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("severities", &self.severities)
            .field("keys", &self.keys)
            .field("tags", &self.tags)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
