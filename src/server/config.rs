//! Server configuration
//!
//! Built-in defaults, overridden by an optional `config.toml` (or the file
//! named on the command line), overridden by `FTSERVER_*` environment
//! variables. Everything here is fixed for the lifetime of the process.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transfer::ReadLimits;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_NAME: &str = "config";
/// Prefix of environment overrides, e.g. `FTSERVER_MAX_PAYLOAD_BYTES`.
pub const ENV_PREFIX: &str = "FTSERVER";

const DEFAULT_ROOT_DIR: &str = ".";
const DEFAULT_LISTEN_BACKLOG: u32 = 5;
const DEFAULT_MAX_COMMAND_LENGTH: usize = 4096;
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
const DEFAULT_COMMAND_IDLE_MILLIS: u64 = 250;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 1;
const DEFAULT_MAX_ACCEPT_FAILURES: u32 = 16;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host to bind the control listener to. Unset means every local
    /// address family.
    #[serde(default)]
    pub bind_host: Option<String>,

    /// Directory whose entries are listed and served
    pub root_dir: String,

    pub listen_backlog: u32,

    /// Longest accepted command line, in bytes, excluding the line terminator
    pub max_command_length: usize,

    /// Largest listing or file the server will send, in bytes
    pub max_payload_bytes: usize,

    /// How long a client has to send its command
    pub read_timeout_secs: u64,

    /// Pause that ends a command sent without a line terminator
    pub command_idle_millis: u64,

    pub connect_timeout_secs: u64,
    pub write_timeout_secs: u64,

    /// Sessions served at once; 1 serves clients strictly one after another
    pub max_concurrent_sessions: usize,

    /// Consecutive accept failures after which the listener is considered dead
    pub max_accept_failures: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: None,
            root_dir: DEFAULT_ROOT_DIR.to_string(),
            listen_backlog: DEFAULT_LISTEN_BACKLOG,
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            command_idle_millis: DEFAULT_COMMAND_IDLE_MILLIS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
            max_concurrent_sessions: DEFAULT_MAX_CONCURRENT_SESSIONS,
            max_accept_failures: DEFAULT_MAX_ACCEPT_FAILURES,
        }
    }
}

impl ServerConfig {
    /// Load configuration with environment overrides.
    ///
    /// An explicitly named file must exist; the default `config.toml` is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let builder = Config::builder()
            .set_default("root_dir", DEFAULT_ROOT_DIR)?
            .set_default("listen_backlog", DEFAULT_LISTEN_BACKLOG as i64)?
            .set_default("max_command_length", DEFAULT_MAX_COMMAND_LENGTH as i64)?
            .set_default("max_payload_bytes", DEFAULT_MAX_PAYLOAD_BYTES as i64)?
            .set_default("read_timeout_secs", DEFAULT_READ_TIMEOUT_SECS as i64)?
            .set_default("command_idle_millis", DEFAULT_COMMAND_IDLE_MILLIS as i64)?
            .set_default("connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT_SECS as i64)?
            .set_default("write_timeout_secs", DEFAULT_WRITE_TIMEOUT_SECS as i64)?
            .set_default(
                "max_concurrent_sessions",
                DEFAULT_MAX_CONCURRENT_SESSIONS as i64,
            )?
            .set_default("max_accept_failures", DEFAULT_MAX_ACCEPT_FAILURES as i64)?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.root_dir.is_empty() {
            return Err(config::ConfigError::Message(
                "root_dir cannot be empty".into(),
            ));
        }

        if self.listen_backlog == 0 {
            return Err(config::ConfigError::Message(
                "listen_backlog must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 || self.max_payload_bytes == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length and max_payload_bytes must be greater than 0".into(),
            ));
        }

        if self.read_timeout_secs == 0
            || self.command_idle_millis == 0
            || self.connect_timeout_secs == 0
            || self.write_timeout_secs == 0
        {
            return Err(config::ConfigError::Message(
                "timeouts must be greater than 0".into(),
            ));
        }

        if self.max_concurrent_sessions == 0 {
            return Err(config::ConfigError::Message(
                "max_concurrent_sessions must be greater than 0".into(),
            ));
        }

        if self.max_accept_failures == 0 {
            return Err(config::ConfigError::Message(
                "max_accept_failures must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root_dir)
    }

    /// Limits for reading a client's command
    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            max_len: self.max_command_length,
            first_byte_timeout: Duration::from_secs(self.read_timeout_secs),
            idle_timeout: Duration::from_millis(self.command_idle_millis),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn write_config(contents: &str) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "ftserver-config-{}-{}.toml",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_config(
            r#"
bind_host = "127.0.0.1"
root_dir = "/srv/files"
max_command_length = 128
max_payload_bytes = 1000
"#,
        );

        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.bind_host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.root_path(), PathBuf::from("/srv/files"));
        assert_eq!(config.read_limits().max_len, 128);
        assert_eq!(config.max_payload_bytes, 1000);
        // Untouched keys keep their defaults
        assert_eq!(config.max_concurrent_sessions, DEFAULT_MAX_CONCURRENT_SESSIONS);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_values_rejected() {
        let path = write_config("max_concurrent_sessions = 0\n");
        assert!(ServerConfig::load(Some(&path)).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_named_file_is_an_error() {
        let path = std::env::temp_dir().join("ftserver-config-does-not-exist.toml");
        assert!(ServerConfig::load(Some(&path)).is_err());
    }
}
