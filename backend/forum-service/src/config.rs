/// Configuration management for Forum Service
///
/// This module handles loading and managing configuration from environment variables
/// (optionally seeded from a `.env` file).
use serde::{Deserialize, Serialize};

/// Labels the classifier may return that block a write.
pub const DEFAULT_HARMFUL_LABELS: &[&str] = &[
    "toxic",
    "threat",
    "insult",
    "obscene",
    "severe_toxic",
    "identity_hate",
];

const DEV_JWT_SECRET: &str = "dev-only-forum-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Bearer token verification
    pub auth: AuthConfig,
    /// External text classifier
    pub classifier: ClassifierConfig,
    /// Moderation policy
    pub moderation: ModerationConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of HTTP workers
    pub workers: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Min connections in pool
    pub min_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout_secs: u64,
}

/// JWT verification settings. Tokens are issued by the identity service.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Accepted clock skew in seconds
    pub leeway_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// External classifier endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Moderation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Labels that block a write when above the threshold (exact match)
    pub harmful_labels: Vec<String>,
    /// Confidence must be strictly greater than this to reject
    pub threshold: f64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            harmful_labels: DEFAULT_HARMFUL_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            threshold: 0.8,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("FORUM_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("FORUM_SERVICE_PORT", 8090)?,
                workers: parse_env_or_default("FORUM_SERVICE_WORKERS", 4)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if is_production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if is_production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/forum".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_or_default("DATABASE_MIN_CONNECTIONS", 1)?,
                acquire_timeout_secs: parse_env_or_default("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
            },
            auth: {
                let jwt_secret = match std::env::var("JWT_SECRET") {
                    Ok(value) if !value.trim().is_empty() => value,
                    _ if is_production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => DEV_JWT_SECRET.to_string(),
                };

                AuthConfig {
                    jwt_secret,
                    leeway_secs: parse_env_or_default("JWT_LEEWAY_SECS", 30)?,
                }
            },
            classifier: ClassifierConfig {
                endpoint: std::env::var("CLASSIFIER_ENDPOINT").unwrap_or_else(|_| {
                    "https://api-inference.huggingface.co/models/unitary/toxic-bert".to_string()
                }),
                api_key: std::env::var("CLASSIFIER_API_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                timeout_ms: parse_env_or_default("CLASSIFIER_TIMEOUT_MS", 5_000)?,
            },
            moderation: ModerationConfig {
                harmful_labels: match std::env::var("MODERATION_HARMFUL_LABELS") {
                    Ok(raw) => parse_label_list(&raw),
                    Err(_) => ModerationConfig::default().harmful_labels,
                },
                threshold: parse_env_or_default("MODERATION_THRESHOLD", 0.8)?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
