//! Connection string parsing.
//!
//! Format: `<driver>@<user>:<password>/<host>:<port>/<dbname>`, split on any
//! of `@`, `:` and `/`. Empty fields between adjacent delimiters are skipped,
//! so `postgres://...`-style doubled slashes collapse. Exactly six fields are
//! required. There is no quoting, so none of the fields may contain a
//! delimiter.

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

/// Environment variable holding the connection string.
pub const DB_URL_ENV: &str = "DB_URL";

/// Connection string errors. Any of these is a startup defect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: String },

    #[error(
        "malformed connection string: expected 6 fields \
         (driver@user:password/host:port/dbname), found {found}"
    )]
    Malformed { found: usize },

    #[error("invalid port '{value}' in connection string")]
    InvalidPort { value: String },

    #[error("unsupported driver '{driver}'")]
    UnsupportedDriver { driver: String },
}

fn is_delimiter(c: char) -> bool {
    c == '@' || c == ':' || c == '/'
}

/// Parsed connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub driver: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub dbname: String,
}

impl ConnectionSettings {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = raw.split(is_delimiter).filter(|f| !f.is_empty()).collect();

        let [driver, user, password, host, port, dbname] = fields.as_slice() else {
            return Err(ConfigError::Malformed {
                found: fields.len(),
            });
        };

        let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
            value: (*port).to_owned(),
        })?;

        Ok(Self {
            driver: (*driver).to_owned(),
            user: (*user).to_owned(),
            password: (*password).to_owned(),
            host: (*host).to_owned(),
            port,
            dbname: (*dbname).to_owned(),
        })
    }

    /// Read and parse [`DB_URL_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_var(DB_URL_ENV)
    }

    pub fn from_var(var: &str) -> Result<Self, ConfigError> {
        let raw = std::env::var(var).map_err(|_| ConfigError::Missing {
            var: var.to_owned(),
        })?;
        Self::parse(&raw)
    }

    /// Driver options for PostgreSQL. TLS is disabled.
    pub fn pg_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(PgSslMode::Disable)
    }
}

impl FromStr for ConnectionSettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Keep the password out of logs.
impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("driver", &self.driver)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .finish()
    }
}
