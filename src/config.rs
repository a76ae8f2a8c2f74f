// src/config.rs

use std::{collections::HashSet, env, net::SocketAddr, path::PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

/// Default upper bound on the age of Telegram init data (24 hours).
pub const DEFAULT_INIT_DATA_MAX_AGE: u64 = 86_400;

/// Default lifetime of an API session token.
pub const DEFAULT_JWT_EXPIRATION: u64 = 86_400;

/// Number of rows shown by `/top` and the default leaderboard page.
pub const LEADERBOARD_DEFAULT_LIMIT: i64 = 10;
pub const LEADERBOARD_MAX_LIMIT: i64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Base URL of the Mini App. Always ends with `/`.
    pub webapp_url: Url,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub init_data_max_age: u64,
    pub admin_ids: HashSet<i64>,
    pub bot_enabled: bool,
    pub log_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let bot_token = require("BOT_TOKEN")?;
        let webapp_url = parse_webapp_url(&require("WEBAPP_URL")?)?;
        let database_url = require("DATABASE_URL")?;

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e| invalid("BIND_ADDR", e))?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| derive_jwt_secret(&bot_token));

        let jwt_expiration = parse_or("JWT_EXPIRATION", get("JWT_EXPIRATION"), DEFAULT_JWT_EXPIRATION)?;
        let init_data_max_age = parse_or(
            "INIT_DATA_MAX_AGE",
            get("INIT_DATA_MAX_AGE"),
            DEFAULT_INIT_DATA_MAX_AGE,
        )?;

        let admin_ids = match get("ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => HashSet::new(),
        };

        let bot_enabled = parse_or("BOT_ENABLED", get("BOT_ENABLED"), true)?;

        Ok(Self {
            bot_token,
            webapp_url,
            database_url,
            bind_addr,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "static".to_string()).into(),
            jwt_secret,
            jwt_expiration,
            init_data_max_age,
            admin_ids,
            bot_enabled,
            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()).into(),
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.admin_ids.contains(&telegram_id)
    }

    /// Public URL of a rendered share card.
    pub fn share_image_url(&self, slug: &str) -> Url {
        // `webapp_url` always ends with a slash, so joining a relative path cannot fail
        // unless the slug itself is garbage; fall back to the base in that case.
        self.webapp_url
            .join(&format!("share/{slug}.png"))
            .unwrap_or_else(|_| self.webapp_url.clone())
    }

    /// Origin the Mini App is served from, for CORS.
    pub fn webapp_origin(&self) -> String {
        self.webapp_url.origin().ascii_serialization()
    }
}

fn invalid(key: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e| invalid(key, e)),
        None => Ok(default),
    }
}

fn parse_webapp_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| invalid("WEBAPP_URL", e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("WEBAPP_URL", "scheme must be http or https"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_admin_ids(raw: &str) -> Result<HashSet<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.parse::<i64>().map_err(|e| invalid("ADMIN_IDS", format!("{id:?}: {e}"))))
        .collect()
}

fn derive_jwt_secret(bot_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"quizbot-session:");
    hasher.update(bot_token.as_bytes());
    hex::encode(hasher.finalize())
}
