//! Report events and the structured field values they are built from.

use core::fmt;
use std::time::SystemTime;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::severity::Level;

/// A structured field value captured from a log record.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    I64(i64),
    /// An unsigned integer.
    U64(u64),
    /// A floating point number.
    F64(f64),
    /// A string, or the `Debug` rendering of a value with no better
    /// representation.
    Str(String),
}

impl FieldValue {
    /// Returns the contained string, if this is a [`FieldValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained boolean, if this is a [`FieldValue::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::F64(v) => write!(f, "{v}"),
            FieldValue::Str(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I64,
    i64 => I64,
    u32 => U64,
    u64 => U64,
    f64 => F64,
    String => Str,
    &str => Str,
}

/// Structured fields of a log record, in the order they were recorded.
pub type Fields = IndexMap<String, FieldValue, FxBuildHasher>;

/// The user a report is attributed to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    /// Backend-unique user id.
    pub id: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub username: Option<String>,
    /// Remote address.
    pub ip_address: Option<String>,
}

/// The HTTP request a report was logged while handling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    /// Request URL.
    pub url: Option<String>,
    /// HTTP method.
    pub method: Option<String>,
    /// Raw query string.
    pub query_string: Option<String>,
}

/// A normalized error report, built once per forwarded log record.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportEvent {
    /// Backend level.
    pub level: Level,
    /// The log message.
    pub message: String,
    /// Name of the component that produced the report.
    pub logger: &'static str,
    /// Distribution of the release.
    pub dist: Option<String>,
    /// Deployment environment.
    pub environment: Option<String>,
    /// Release identifier.
    pub release: Option<String>,
    /// Host name.
    pub server_name: Option<String>,
    /// Tags from the hook's scope.
    pub tags: IndexMap<String, String, FxBuildHasher>,
    /// Request extracted from the record's fields.
    pub request: Option<Request>,
    /// User extracted from the record's fields.
    pub user: Option<User>,
    /// Transaction name extracted from the record's fields.
    pub transaction: Option<String>,
    /// Grouping fingerprint extracted from the record's fields.
    pub fingerprint: Vec<String>,
    /// Fields with no dedicated slot.
    pub extra: Fields,
    /// When the report was built.
    pub timestamp: SystemTime,
    /// SDK identifier, stamped by the client on send.
    pub sdk: Option<String>,
}

impl ReportEvent {
    /// Creates an event with the given level and message and nothing else.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            logger: crate::LOGGER_NAME,
            dist: None,
            environment: None,
            release: None,
            server_name: None,
            tags: IndexMap::default(),
            request: None,
            user: None,
            transaction: None,
            fingerprint: Vec::new(),
            extra: Fields::default(),
            timestamp: SystemTime::now(),
            sdk: None,
        }
    }
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)?;
        for (key, value) in &self.extra {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}
