use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

// ─── Constants ───────────────────────────────────────────────────

pub const DEFAULT_PREFIX: &str = "mongodb";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;

/// Width of the sampling window ending at "now".
pub const SAMPLING_WINDOW: Duration = Duration::from_secs(60);

/// Upper bound on connect + ping + query + decode.
pub const COLLECT_BUDGET: Duration = Duration::from_secs(10);

/// Authentication realm used whenever credentials are supplied.
const AUTH_SOURCE: &str = "admin";

// ─── Connection parameters ───────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl ConnectionParams {
    /// The credential pair, but only when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((&self.username, &self.password))
        }
    }

    /// Connection target string handed to the driver.
    ///
    /// Anonymous: `mongodb://host:port/db?readPreference=secondaryPreferred`.
    /// Authenticated adds percent-encoded userinfo and `authSource=admin`.
    pub fn target(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTarget {
            host: self.host.clone(),
            reason,
        };

        let mut target = Url::parse(&format!("mongodb://{}:{}/", self.host, self.port))
            .map_err(|err| invalid(err.to_string()))?;
        if target.host_str() != Some(self.host.as_str()) || target.port() != Some(self.port) {
            return Err(invalid("host must be a bare hostname or address".into()));
        }
        target.set_path(&self.database);

        if let Some((username, password)) = self.credentials() {
            target
                .set_username(username)
                .map_err(|()| invalid("cannot carry a username".into()))?;
            target
                .set_password(Some(password))
                .map_err(|()| invalid("cannot carry a password".into()))?;
            target
                .query_pairs_mut()
                .append_pair("authSource", AUTH_SOURCE);
        }

        target
            .query_pairs_mut()
            .append_pair("readPreference", "secondaryPreferred");

        Ok(target)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .finish()
    }
}

// ─── Plugin configuration ────────────────────────────────────────

/// Everything one invocation needs, frozen after argument parsing.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub prefix: String,
    pub params: ConnectionParams,
}
