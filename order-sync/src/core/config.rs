//! Service configuration
//!
//! # 环境变量
//!
//! | 变量 | 默认值 | 说明 |
//! |------|--------|------|
//! | ENVIRONMENT | development | development / staging / production |
//! | HTTP_PORT | 8080 | HTTP 端口 |
//! | DATABASE_URL | - | Postgres; in-memory store when unset in development |
//! | DATABASE_MAX_CONNECTIONS | 5 | 连接池大小 |
//! | BUSINESS_TIMEZONE | America/New_York | IANA timezone for business dates |
//! | POS_API_URL | - | POS API base URL; polling disabled when unset |
//! | POS_API_TOKEN | - | POS bearer token (secret) |
//! | POS_LOCATION_ID | - | POS location header value |
//! | POS_PAGE_SIZE | 100 | orders per page |
//! | POS_PAGE_DELAY_MS | 250 | delay between pages |
//! | POS_POLL_INTERVAL_SECS | 300 | 0 disables the background poller |
//! | MARKETPLACE_API_URL | - | GraphQL endpoint; lookups disabled when unset |
//! | MARKETPLACE_API_TOKEN | - | marketplace bearer token (secret) |
//! | UPSTREAM_TIMEOUT_MS | 15000 | per external call |
//! | BATCH_CONCURRENCY | 1 | records in flight per batch |
//! | LOG_LEVEL | info | 日志级别 |
//! | LOG_DIR | - | daily rolling log files |

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::IngestError;

#[derive(Debug, Clone)]
pub struct PosConfig {
    pub api_url: String,
    pub api_token: String,
    pub location_id: String,
    pub page_size: u32,
    pub page_delay: Duration,
    /// `None` disables the background poller
    pub poll_interval: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub api_url: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    pub http_port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub business_timezone: Tz,
    pub pos: Option<PosConfig>,
    pub marketplace: Option<MarketplaceConfig>,
    pub upstream_timeout_ms: u64,
    pub batch_concurrency: usize,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, IngestError> {
    match env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| IngestError::Config(format!("{name} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development
    fn require_secret(name: &str, environment: &str) -> Result<String, IngestError> {
        match env_opt(name) {
            Some(v) => Ok(v),
            None if environment == "development" => Ok(format!("dev-{name}-not-for-production")),
            None => Err(IngestError::Config(format!(
                "{name} must be set in {environment} environment"
            ))),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, IngestError> {
        let environment = env_opt("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let database_url = env_opt("DATABASE_URL");
        if database_url.is_none() && environment != "development" {
            return Err(IngestError::Config(format!(
                "DATABASE_URL must be set in {environment} environment"
            )));
        }

        let tz_name = env_opt("BUSINESS_TIMEZONE").unwrap_or_else(|| "America/New_York".into());
        let business_timezone = tz_name
            .parse::<Tz>()
            .map_err(|_| IngestError::Config(format!("unknown BUSINESS_TIMEZONE: {tz_name}")))?;

        let pos = match env_opt("POS_API_URL") {
            Some(api_url) => {
                let interval_secs: u64 = env_parse("POS_POLL_INTERVAL_SECS", 300)?;
                Some(PosConfig {
                    api_url,
                    api_token: Self::require_secret("POS_API_TOKEN", &environment)?,
                    location_id: env_opt("POS_LOCATION_ID").ok_or_else(|| {
                        IngestError::Config("POS_LOCATION_ID must be set with POS_API_URL".into())
                    })?,
                    page_size: env_parse("POS_PAGE_SIZE", 100)?,
                    page_delay: Duration::from_millis(env_parse("POS_PAGE_DELAY_MS", 250)?),
                    poll_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
                })
            }
            None => None,
        };

        let marketplace = match env_opt("MARKETPLACE_API_URL") {
            Some(api_url) => Some(MarketplaceConfig {
                api_url,
                api_token: Self::require_secret("MARKETPLACE_API_TOKEN", &environment)?,
            }),
            None => None,
        };

        Ok(Self {
            http_port: env_parse("HTTP_PORT", 8080)?,
            database_url,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 5)?,
            business_timezone,
            pos,
            marketplace,
            upstream_timeout_ms: env_parse("UPSTREAM_TIMEOUT_MS", 15_000)?,
            batch_concurrency: env_parse::<usize>("BATCH_CONCURRENCY", 1)?.max(1),
            log_level: env_opt("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            environment,
        })
    }

    /// Defaults for tests and local runs: in-memory store, no upstream APIs
    pub fn development() -> Self {
        Self {
            environment: "development".into(),
            http_port: 8080,
            database_url: None,
            database_max_connections: 5,
            business_timezone: chrono_tz::America::New_York,
            pos: None,
            marketplace: None,
            upstream_timeout_ms: 15_000,
            batch_concurrency: 1,
            log_level: "info".into(),
            log_dir: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = Config::development();
        assert!(config.is_development());
        assert!(config.database_url.is_none());
        assert!(config.pos.is_none());
        assert_eq!(config.upstream_timeout(), Duration::from_secs(15));
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn test_env_parse_default_when_unset() {
        let v: u32 = env_parse("ORDER_SYNC_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn test_require_secret_rules() {
        let dev = Config::require_secret("ORDER_SYNC_TEST_UNSET_SECRET", "development").unwrap();
        assert!(dev.starts_with("dev-"));
        assert!(Config::require_secret("ORDER_SYNC_TEST_UNSET_SECRET", "production").is_err());
    }
}
