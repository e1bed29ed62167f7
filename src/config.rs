use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite://ecommerce.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Echo every SQL statement through the logger.
    pub log_sql: bool,
    pub max_connections: u32,
    pub seed_on_start: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        if database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is set but empty");
        }
        let log_sql = env_flag("DATABASE_LOG_SQL");
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);
        let seed_on_start = env_flag("SEED_ON_START");
        Ok(Self {
            database_url,
            log_sql,
            max_connections,
            seed_on_start,
        })
    }

    pub fn for_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            log_sql: false,
            max_connections: 5,
            seed_on_start: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
