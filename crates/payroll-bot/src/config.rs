//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default SQLite location.
pub const DEFAULT_SQLITE_PATH: &str = "./data/payroll.db";

/// Bot process configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// SQLite path or `sqlite:` URL as configured.
    pub sqlite_path: String,
    /// SQLite URL derived from `sqlite_path`.
    pub sqlite_url: String,
    /// Identity of the console user.
    pub user_id: i64,
    /// Display name of the console user.
    pub user_name: String,
    pub worker_count: usize,
    pub queue_size: usize,
    pub max_conversations: usize,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SQLITE_PATH` | SQLite path or URL | `./data/payroll.db` |
    /// | `PAYROLL_USER_ID` | Numeric identity of the console user | (required) |
    /// | `PAYROLL_USER_NAME` | Display name of the console user | `worker` |
    /// | `WORKER_COUNT` | Worker pool size | `4` |
    /// | `QUEUE_SIZE` | Worker pool queue capacity | `32` |
    /// | `MAX_CONVERSATIONS` | Conversations tracked before eviction | `10000` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sqlite_path = lookup("SQLITE_PATH").unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string());
        let sqlite_url = sqlite_url_from_path(&sqlite_path);

        let user_id = lookup("PAYROLL_USER_ID").ok_or(ConfigError::MissingUserId)?;
        let user_id = user_id
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid("PAYROLL_USER_ID", &user_id))?;

        let user_name = lookup("PAYROLL_USER_NAME").unwrap_or_else(|| "worker".to_string());

        Ok(Self {
            sqlite_path,
            sqlite_url,
            user_id,
            user_name,
            worker_count: positive(&lookup, "WORKER_COUNT", 4)?,
            queue_size: positive(&lookup, "QUEUE_SIZE", 32)?,
            max_conversations: positive(&lookup, "MAX_CONVERSATIONS", 10000)?,
        })
    }

    /// Directory that must exist before the database file can be created.
    ///
    /// `None` for URLs and in-memory databases.
    pub fn database_dir(&self) -> Option<PathBuf> {
        if self.sqlite_path.starts_with("sqlite:") {
            return None;
        }
        PathBuf::from(&self.sqlite_path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.to_path_buf())
    }
}

fn positive<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::invalid(var, &raw)),
    }
}

/// Turn a filesystem path into a SQLite URL that creates the file if needed.
pub fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PAYROLL_USER_ID environment variable is required")]
    MissingUserId,

    #[error("Invalid {var} value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("PAYROLL_USER_ID", "7")])).unwrap();
        assert_eq!(config.user_id, 7);
        assert_eq!(config.user_name, "worker");
        assert_eq!(config.sqlite_url, "sqlite:./data/payroll.db?mode=rwc");
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.queue_size, 32);
        assert_eq!(config.max_conversations, 10000);
        assert_eq!(config.database_dir(), Some(PathBuf::from("./data")));
    }

    #[test]
    fn test_missing_user_id() {
        let result = BotConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingUserId)));
    }

    #[test]
    fn test_invalid_numbers() {
        let result = BotConfig::from_lookup(lookup(&[("PAYROLL_USER_ID", "abc")]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: "PAYROLL_USER_ID", .. })));

        let result = BotConfig::from_lookup(lookup(&[("PAYROLL_USER_ID", "1"), ("WORKER_COUNT", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: "WORKER_COUNT", .. })));
    }

    #[test]
    fn test_sqlite_url_passthrough() {
        let config = BotConfig::from_lookup(lookup(&[
            ("PAYROLL_USER_ID", "1"),
            ("SQLITE_PATH", "sqlite::memory:"),
        ]))
        .unwrap();
        assert_eq!(config.sqlite_url, "sqlite::memory:");
        assert_eq!(config.database_dir(), None);
    }
}
