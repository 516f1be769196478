use serde::{Deserialize, Serialize};

use crate::error::SqlBindError;

/// Open flags forwarded to the native session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFlags {
    pub read_only: bool,
    pub create: bool,
    pub shared_cache: bool,
    pub uri: bool,
}

impl Default for ClientFlags {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            shared_cache: false,
            uri: true,
        }
    }
}

/// Options for establishing a [`crate::Connection`].
///
/// `database` names the database file (or `:memory:`). `host`, `user`,
/// `password`, `port` and `unix_socket` are carried for parity with networked
/// client libraries; the embedded engine only accepts a local host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub port: u16,
    pub unix_socket: Option<String>,
    pub flags: ClientFlags,
    pub charset: String,
    pub worker_threads: usize,
    pub statement_cache_capacity: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            password: None,
            database: ":memory:".into(),
            port: 0,
            unix_socket: None,
            flags: ClientFlags::default(),
            charset: "utf8".into(),
            worker_threads: 1,
            statement_cache_capacity: 16,
        }
    }
}

impl ConnectOptions {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(database: impl Into<String>) -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::new(database)
    }

    /// Parse options from a JSON document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `SqlBindError::ConfigError` if the document is malformed or
    /// the resulting options fail validation.
    pub fn from_json(document: &str) -> Result<Self, SqlBindError> {
        let opts: ConnectOptions = serde_json::from_str(document)
            .map_err(|err| SqlBindError::ConfigError(format!("invalid options: {err}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// # Errors
    ///
    /// Returns `SqlBindError::ConfigError` when the worker count is zero or
    /// the database name is empty.
    pub fn validate(&self) -> Result<(), SqlBindError> {
        if self.worker_threads == 0 {
            return Err(SqlBindError::ConfigError(
                "worker_threads must be at least 1".into(),
            ));
        }
        if self.database.is_empty() {
            return Err(SqlBindError::ConfigError("database must not be empty".into()));
        }
        Ok(())
    }
}

/// Fluent builder for [`ConnectOptions`].
#[derive(Debug, Clone)]
pub struct ConnectOptionsBuilder {
    opts: ConnectOptions,
}

impl ConnectOptionsBuilder {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            opts: ConnectOptions::new(database),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.opts.user = Some(user.into());
        self.opts.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn unix_socket(mut self, path: impl Into<String>) -> Self {
        self.opts.unix_socket = Some(path.into());
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: ClientFlags) -> Self {
        self.opts.flags = flags;
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.opts.charset = charset.into();
        self
    }

    #[must_use]
    pub fn worker_threads(mut self, workers: usize) -> Self {
        self.opts.worker_threads = workers;
        self
    }

    #[must_use]
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.statement_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectOptions {
        self.opts
    }

    /// Validate the options and open a connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlBindError` if validation fails or the session cannot be opened.
    pub fn connect(self) -> Result<crate::Connection, SqlBindError> {
        crate::Connection::connect(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fills_defaults() {
        let opts = ConnectOptions::from_json(r#"{"database": "app.db", "worker_threads": 3}"#)
            .expect("valid options");
        assert_eq!(opts.database, "app.db");
        assert_eq!(opts.worker_threads, 3);
        assert_eq!(opts.charset, "utf8");
        assert!(opts.flags.create);
    }

    #[test]
    fn zero_workers_rejected() {
        let err = ConnectOptions::from_json(r#"{"worker_threads": 0}"#).unwrap_err();
        assert!(matches!(err, SqlBindError::ConfigError(_)));
    }
}
