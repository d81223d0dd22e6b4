/// Configuration management for the API server
///
/// Loads configuration from environment variables into a typed struct,
/// once at startup. Everything downstream receives the config (or the
/// clients built from it) by injection; nothing re-reads the environment.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `REDIS_URL`: Redis connection string (optional; cache disabled without it)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `ADMIN_TOKEN`: Bearer token for admin routes (optional; admin routes open without it)
/// - `SIGNUP_BASE_URL`: Base URL for invitation links (default: http://localhost:3000)
/// - `MAILER_ENDPOINT`: Email HTTP API endpoint (optional; emails dropped without it)
/// - `MAILER_API_KEY`: Bearer token for the email API (optional)
/// - `MAILER_FROM`: From address (default: hello@tandem.example)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use tandem_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Outbound email configuration
    pub mailer: MailerConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Bearer token required on admin routes; `None` leaves them open
    /// (development only)
    pub admin_token: Option<String>,

    /// Base URL embedded in invitation signup links
    pub signup_base_url: String,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Cache configuration
///
/// A missing URL is a fully supported mode: the cache layer degrades to
/// passthrough and every read computes directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL, if configured
    pub url: Option<String>,
}

/// Outbound email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Email HTTP API endpoint; without it emails are logged and dropped
    pub endpoint: Option<String>,

    /// Bearer token for the email API
    pub api_key: Option<String>,

    /// From address
    pub from: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or values fail
    /// to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
        if admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set; admin routes are unauthenticated");
        }

        let signup_base_url =
            env::var("SIGNUP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let production = env::var("API_PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                admin_token,
                signup_base_url,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            cache: CacheConfig {
                url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
            },
            mailer: MailerConfig {
                endpoint: env::var("MAILER_ENDPOINT").ok().filter(|e| !e.is_empty()),
                api_key: env::var("MAILER_API_KEY").ok(),
                from: env::var("MAILER_FROM")
                    .unwrap_or_else(|_| "hello@tandem.example".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                admin_token: Some("secret".to_string()),
                signup_base_url: "http://localhost:3000".to_string(),
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            cache: CacheConfig { url: None },
            mailer: MailerConfig {
                endpoint: None,
                api_key: None,
                from: "hello@tandem.example".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        let config = test_config();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_cache_may_be_unconfigured() {
        let config = test_config();
        assert!(config.cache.url.is_none());
    }
}
