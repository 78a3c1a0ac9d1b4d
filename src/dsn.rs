use core::{fmt, str::FromStr};

use rootcause::Report;
use url::Url;

use crate::error::ClientInitError;

/// A parsed client key, of the form
/// `scheme://public_key@host[:port]/[path/]project_id`.
///
/// # Examples
///
/// ```
/// use relaylog::Dsn;
///
/// let dsn: Dsn = "https://abc123@reports.example.com/api/42".parse().unwrap();
/// assert_eq!(dsn.public_key(), "abc123");
/// assert_eq!(dsn.host(), "reports.example.com");
/// assert_eq!(dsn.path(), "/api/");
/// assert_eq!(dsn.project_id(), "42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    public_key: String,
    host: String,
    port: Option<u16>,
    path: String,
    project_id: String,
}

impl Dsn {
    /// The URL scheme, `http` or `https`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The public key identifying the client to the backend.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The backend host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit port, if one was given.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The path prefix before the project id. Always starts and ends with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The project reports are filed under.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

fn invalid(reason: &'static str, dsn: &str) -> Report<ClientInitError> {
    Report::new(ClientInitError::InvalidDsn(reason)).attach(format!("DSN: {dsn}"))
}

impl FromStr for Dsn {
    type Err = Report<ClientInitError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s.trim())
            .map_err(|e| invalid("not a URL", s).attach(e.to_string()))?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid("scheme must be http or https", s));
        }
        if url.username().is_empty() {
            return Err(invalid("missing public key", s));
        }
        let Some(host) = url.host_str() else {
            return Err(invalid("missing host", s));
        };

        let full_path = url.path().trim_end_matches('/');
        let (prefix, project_id) = full_path.rsplit_once('/').unwrap_or(("", full_path));
        if project_id.is_empty() {
            return Err(invalid("missing project id", s));
        }

        Ok(Dsn {
            scheme: scheme.to_owned(),
            public_key: url.username().to_owned(),
            host: host.to_owned(),
            port: url.port(),
            path: format!("{prefix}/"),
            project_id: project_id.to_owned(),
        })
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}@{}", self.scheme, self.public_key, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}{}", self.path, self.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let dsn: Dsn = "http://key@localhost:9000/7".parse().unwrap();
        assert_eq!(dsn.scheme(), "http");
        assert_eq!(dsn.port(), Some(9000));
        assert_eq!(dsn.path(), "/");
        assert_eq!(dsn.project_id(), "7");
        assert_eq!(dsn.to_string(), "http://key@localhost:9000/7");
    }

    #[test]
    fn test_parse_with_path() {
        let dsn: Dsn = "https://key@example.com/nested/prefix/12/".parse().unwrap();
        assert_eq!(dsn.path(), "/nested/prefix/");
        assert_eq!(dsn.project_id(), "12");
        assert_eq!(dsn.to_string(), "https://key@example.com/nested/prefix/12");
    }

    #[test]
    fn test_rejects_malformed() {
        let cases = [
            ("not a dsn", "not a URL"),
            ("ftp://key@example.com/1", "scheme must be http or https"),
            ("https://example.com/1", "missing public key"),
            ("https://key@example.com/", "missing project id"),
        ];
        for (input, reason) in cases {
            let report = input.parse::<Dsn>().unwrap_err();
            match report.current_context() {
                ClientInitError::InvalidDsn(actual) => assert_eq!(*actual, reason, "{input}"),
                other => panic!("unexpected error for {input}: {other}"),
            }
        }
    }
}
