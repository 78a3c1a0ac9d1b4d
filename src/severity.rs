//! Logger severities, backend levels, and the accepted-severity set.
//!
//! A [`Severity`] is the importance of a log record as the logger sees it. A
//! [`Level`] is the importance of a report as the backend sees it. The backend
//! scale is coarser: it has no separate tier for panics, so both
//! [`Severity::Fatal`] and [`Severity::Panic`] map to [`Level::Fatal`].
//!
//! # Examples
//!
//! ```
//! use relaylog::{Level, Severity, SeveritySet};
//!
//! assert_eq!(Severity::Warn.level(), Level::Warning);
//! assert_eq!(Severity::Panic.level(), Level::Fatal);
//!
//! let accepted: SeveritySet = "error, FATAL".parse().unwrap();
//! assert!(accepted.contains(Severity::Fatal));
//! assert!(!accepted.contains(Severity::Warn));
//! ```

use core::{fmt, str::FromStr};

/// The severity of a log record, ordered from least to most important.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that the program recovered from.
    Warn,
    /// An operation failed.
    Error,
    /// The program cannot continue.
    Fatal,
    /// The program panicked.
    Panic,
}

/// The severity scale of the error-tracking backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warning level.
    Warning,
    /// Error level.
    Error,
    /// Fatal level.
    Fatal,
}

/// Indexed by `Severity as usize`.
static LEVEL_MAP: [Level; 6] = [
    Level::Debug,
    Level::Info,
    Level::Warning,
    Level::Error,
    Level::Fatal,
    Level::Fatal,
];

impl Severity {
    /// Every severity, in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
        Severity::Panic,
    ];

    /// Returns the backend level this severity is reported at.
    #[inline]
    #[must_use]
    pub fn level(self) -> Level {
        LEVEL_MAP[self as usize]
    }

    /// Returns the lowercase name of this severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s))
            .or_else(|| s.eq_ignore_ascii_case("warning").then_some(Severity::Warn))
            .ok_or_else(|| ParseSeverityError(s.to_owned()))
    }
}

impl Level {
    /// Returns the name the backend uses for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of accepted severities.
///
/// The set is fixed once a [`Hook`](crate::Hook) has been built from it.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct SeveritySet(u8);

impl SeveritySet {
    /// The set used when nothing else is configured: error, fatal and panic.
    pub const DEFAULT_REPORTED: SeveritySet =
        SeveritySet::empty().with(Severity::Error).with(Severity::Fatal).with(Severity::Panic);

    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a set containing every severity.
    #[must_use]
    pub const fn all() -> Self {
        Self(0b0011_1111)
    }

    /// Creates a set containing `min` and every severity above it.
    #[must_use]
    pub fn at_least(min: Severity) -> Self {
        Severity::ALL.into_iter().filter(|s| *s >= min).collect()
    }

    /// Returns a copy of this set with `severity` added.
    #[must_use]
    pub const fn with(self, severity: Severity) -> Self {
        Self(self.0 | severity.bit())
    }

    /// Returns whether `severity` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, severity: Severity) -> bool {
        self.0 & severity.bit() != 0
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the severities in the set, in ascending order.
    pub fn iter(self) -> impl Iterator<Item = Severity> {
        Severity::ALL.into_iter().filter(move |s| self.contains(*s))
    }

    /// Reads the set from the `RELAYLOG_LEVELS` environment variable.
    ///
    /// The variable holds a comma-separated list of severity names, matched
    /// case-insensitively. When it is unset, [`SeveritySet::DEFAULT_REPORTED`]
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if any listed name is not a severity.
    pub fn from_env() -> Result<Self, ParseSeverityError> {
        match std::env::var_os("RELAYLOG_LEVELS") {
            Some(var) => var.to_string_lossy().parse(),
            None => Ok(Self::DEFAULT_REPORTED),
        }
    }
}

impl FromIterator<Severity> for SeveritySet {
    fn from_iter<I: IntoIterator<Item = Severity>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl<const N: usize> From<[Severity; N]> for SeveritySet {
    fn from(severities: [Severity; N]) -> Self {
        severities.into_iter().collect()
    }
}

impl FromStr for SeveritySet {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Severity>)
            .collect()
    }
}

impl fmt::Debug for SeveritySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_table_is_total() {
        let expected = [
            (Severity::Debug, Level::Debug),
            (Severity::Info, Level::Info),
            (Severity::Warn, Level::Warning),
            (Severity::Error, Level::Error),
            (Severity::Fatal, Level::Fatal),
            (Severity::Panic, Level::Fatal),
        ];
        for (severity, level) in expected {
            assert_eq!(severity.level(), level, "{severity}");
        }
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!(" warning ".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!(
            "loud".parse::<Severity>(),
            Err(ParseSeverityError("loud".to_owned()))
        );
    }

    #[test]
    fn test_set_membership() {
        let set = SeveritySet::from([Severity::Error, Severity::Panic]);
        assert!(set.contains(Severity::Error));
        assert!(set.contains(Severity::Panic));
        assert!(!set.contains(Severity::Fatal));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            [Severity::Error, Severity::Panic]
        );

        assert!(SeveritySet::empty().is_empty());
        assert_eq!(SeveritySet::all().iter().count(), Severity::ALL.len());
        assert_eq!(
            SeveritySet::at_least(Severity::Error),
            SeveritySet::DEFAULT_REPORTED
        );
    }

    #[test]
    fn test_set_parse() {
        let set: SeveritySet = "error,Fatal, panic,".parse().unwrap();
        assert_eq!(set, SeveritySet::DEFAULT_REPORTED);
        assert!("".parse::<SeveritySet>().unwrap().is_empty());
        assert!("error,nope".parse::<SeveritySet>().is_err());
    }

    #[test]
    fn test_set_debug() {
        let set = SeveritySet::from([Severity::Info, Severity::Warn]);
        assert_eq!(format!("{set:?}"), "{Info, Warn}");
    }
}
