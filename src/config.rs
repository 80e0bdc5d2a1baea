use serde::Deserialize;
use std::env;

use crate::constants::DEFAULT_SIGNING_TOKEN_TTL_DAYS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // RealtyFeed upstream
    pub realtyfeed_api_url: String,
    pub realtyfeed_token_url: String,
    pub realtyfeed_client_id: String,
    pub realtyfeed_client_secret: String,
    pub realtyfeed_api_key: Option<String>,

    // Signing links
    pub public_base_url: String,
    pub signing_token_ttl_days: i64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            realtyfeed_api_url: env::var("REALTYFEED_API_URL")?,
            realtyfeed_token_url: env::var("REALTYFEED_TOKEN_URL")?,
            realtyfeed_client_id: env::var("REALTYFEED_CLIENT_ID")?,
            realtyfeed_client_secret: env::var("REALTYFEED_CLIENT_SECRET")?,
            realtyfeed_api_key: env::var("REALTYFEED_API_KEY").ok(),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            signing_token_ttl_days: env::var("SIGNING_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_SIGNING_TOKEN_TTL_DAYS),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.realtyfeed_api_url.trim().is_empty() {
            anyhow::bail!("REALTYFEED_API_URL is empty");
        }
        if self.realtyfeed_token_url.trim().is_empty() {
            anyhow::bail!("REALTYFEED_TOKEN_URL is empty");
        }
        if self.realtyfeed_client_id.trim().is_empty()
            || self.realtyfeed_client_secret.trim().is_empty()
        {
            anyhow::bail!("RealtyFeed client credentials are missing");
        }

        if self.signing_token_ttl_days <= 0 {
            anyhow::bail!("SIGNING_TOKEN_TTL_DAYS must be > 0");
        }

        if self.realtyfeed_client_secret.contains("changeme") {
            tracing::warn!("Detected placeholder RealtyFeed client secret");
        }
        if self.public_base_url.starts_with("http://localhost") && self.environment == "production"
        {
            tracing::warn!("PUBLIC_BASE_URL points at localhost in production");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
