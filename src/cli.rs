use clap::Parser;

use crate::config::{ConnectionParams, PluginConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PREFIX};
use crate::error::ConfigError;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Report MongoDB slow query count, total time and average time from the profiler log."
)]
pub struct PluginArgs {
    /// Metric key prefix
    #[arg(long = "metric-key-prefix", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Hostname
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Username
    #[arg(long, default_value = "")]
    pub username: String,

    /// Password
    #[arg(long, env = "MONGODB_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Database name (required)
    #[arg(long)]
    pub database: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl PluginArgs {
    /// Validates and freezes the arguments. Nothing here touches the network.
    pub fn into_config(self) -> Result<PluginConfig, ConfigError> {
        let database = self
            .database
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingDatabase)?;

        let prefix = if self.prefix.is_empty() {
            DEFAULT_PREFIX.to_owned()
        } else {
            self.prefix
        };

        Ok(PluginConfig {
            prefix,
            params: ConnectionParams {
                host: self.host,
                port: self.port,
                username: self.username,
                password: self.password,
                database,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<const N: usize>(args: [&str; N]) -> Result<PluginArgs, clap::Error> {
        PluginArgs::try_parse_from(args)
    }

    #[test]
    fn defaults_match_a_local_server() -> Result<(), Box<dyn std::error::Error>> {
        let args = parse(["mongodb-slow-queries", "--database", "app"])?;
        assert_eq!(args.prefix, "mongodb");
        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, 27017);
        assert_eq!(args.username, "");
        assert!(!args.verbose);

        let config = args.into_config()?;
        assert_eq!(config.params.database, "app");
        Ok(())
    }

    #[test]
    fn missing_database_is_a_config_error() -> Result<(), clap::Error> {
        let args = parse(["mongodb-slow-queries"])?;
        assert!(matches!(args.into_config(), Err(ConfigError::MissingDatabase)));

        let args = parse(["mongodb-slow-queries", "--database", ""])?;
        assert!(matches!(args.into_config(), Err(ConfigError::MissingDatabase)));
        Ok(())
    }

    #[test]
    fn explicit_flags_are_carried_through() -> Result<(), Box<dyn std::error::Error>> {
        let args = parse([
            "mongodb-slow-queries",
            "--metric-key-prefix",
            "orders-db",
            "--host",
            "db.internal",
            "--port",
            "27018",
            "--username",
            "monitor",
            "--password",
            "s3cret",
            "--database",
            "orders",
            "-v",
        ])?;
        assert!(args.verbose);

        let config = args.into_config()?;
        assert_eq!(config.prefix, "orders-db");
        assert_eq!(
            config.params,
            ConnectionParams {
                host: "db.internal".into(),
                port: 27018,
                username: "monitor".into(),
                password: "s3cret".into(),
                database: "orders".into(),
            }
        );
        assert_eq!(config.params.credentials(), Some(("monitor", "s3cret")));
        Ok(())
    }

    #[test]
    fn empty_prefix_falls_back_to_default() -> Result<(), Box<dyn std::error::Error>> {
        let args = parse(["mongodb-slow-queries", "--metric-key-prefix", "", "--database", "app"])?;
        assert_eq!(args.into_config()?.prefix, DEFAULT_PREFIX);
        Ok(())
    }

    #[test]
    fn port_must_be_numeric() {
        assert!(parse(["mongodb-slow-queries", "--port", "mongo", "--database", "app"]).is_err());
    }
}
