//! Destination database addressing.
//!
//! URIs take the form `<driver>://<user>:<password>@<host>[:<port>]/<database>`.
//! `Display` never prints the password. Accessors return the decoded parts;
//! the URI itself keeps them percent-encoded.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::Error;

/// Parsed destination URI.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseUri {
    url: Url,
}

impl DatabaseUri {
    /// Parse a destination URI.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let url = Url::parse(input).map_err(|e| Error::InvalidUri(format!("{input}: {e}")))?;
        let uri = Self { url };
        if uri.database().is_empty() {
            return Err(Error::InvalidUri("missing database name".into()));
        }
        Ok(uri)
    }

    /// Assemble a URI from its parts, percent-encoding credentials.
    pub fn build(
        driver: &str, username: &str, password: &str, host: &str, port: Option<u16>, database: &str,
    ) -> Result<Self, Error> {
        let mut url = Url::parse(&format!("{driver}://{host}"))
            .map_err(|e| Error::InvalidUri(format!("{driver}://{host}: {e}")))?;
        let invalid = |part: &str| Error::InvalidUri(format!("cannot set {part} on {driver} uri"));
        url.set_username(username).map_err(|_| invalid("username"))?;
        url.set_password(Some(password)).map_err(|_| invalid("password"))?;
        url.set_port(port).map_err(|_| invalid("port"))?;
        url.set_path(&format!("/{database}"));

        let uri = Self { url };
        if uri.database().is_empty() {
            return Err(Error::InvalidUri("missing database name".into()));
        }
        Ok(uri)
    }

    /// Driver name, the URI scheme (e.g. `sqlite`, `mysql+pymysql`).
    pub fn driver(&self) -> &str {
        self.url.scheme()
    }

    pub fn username(&self) -> Cow<'_, str> {
        decode(self.url.username())
    }

    pub fn password(&self) -> Option<Cow<'_, str>> {
        self.url.password().map(decode)
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Database name, the path without its leading slash.
    ///
    /// An absolute sqlite file path keeps its own slash (`sqlite://host//tmp/out.db`).
    pub fn database(&self) -> Cow<'_, str> {
        let path = self.url.path();
        decode(path.strip_prefix('/').unwrap_or(path))
    }

    /// Full URI including the password.
    pub fn expose(&self) -> &str {
        self.url.as_str()
    }
}

fn decode(part: &str) -> Cow<'_, str> {
    percent_decode_str(part).decode_utf8_lossy()
}

impl fmt::Display for DatabaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut redacted = self.url.clone();
        if redacted.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        f.write_str(redacted.as_str())
    }
}

impl fmt::Debug for DatabaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatabaseUri").field(&self.to_string()).finish()
    }
}
