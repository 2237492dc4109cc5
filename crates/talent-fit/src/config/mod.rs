use secrecy::SecretString;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub chat_ops: ChatOpsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig {
            url: non_empty_var("DATABASE_URL"),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
        };

        let ai = AiConfig {
            openai_api_key: secret_var("OPENAI_API_KEY"),
            embedding_model: env::var("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimensions: parse_var("EMBEDDING_DIMENSIONS", 1536)?,
            chat_api_key: secret_var("CHAT_API_KEY"),
            chat_api_base_url: env::var("CHAT_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.x.ai/v1".to_string()),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "grok-4-fast".to_string()),
        };

        let chat_ops = ChatOpsConfig {
            bot_token: secret_var("SLACK_BOT_TOKEN"),
            default_channel_id: non_empty_var("SLACK_DEFAULT_CHANNEL_ID"),
            api_base_url: env::var("SLACK_API_BASE_URL")
                .unwrap_or_else(|_| "https://slack.com/api".to_string()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            ai,
            chat_ops,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == AppEnvironment::Production
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn secret_var(key: &str) -> Option<SecretString> {
    non_empty_var(key).map(SecretString::from)
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Postgres connection settings. No URL means the in-memory stores are used.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Embedding and chat-completion provider settings.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub openai_api_key: Option<SecretString>,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub chat_api_key: Option<SecretString>,
    pub chat_api_base_url: String,
    pub chat_model: String,
}

/// Slack bot settings. A missing token leaves the chat-ops channel inert.
#[derive(Debug, Clone)]
pub struct ChatOpsConfig {
    pub bot_token: Option<SecretString>,
    pub default_channel_id: Option<String>,
    pub api_base_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
