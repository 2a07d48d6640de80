use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context};
use log::LevelFilter;

use crate::{
    apple::{AppleCredentials, DEFAULT_API_URL, DEFAULT_ARTWORK_SIZE},
    artwork::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT},
    matcher::DEFAULT_THRESHOLD,
    spotify::{SpotifyCredentials, DEFAULT_REDIRECT_URI, DEFAULT_TOKEN_CACHE},
};

pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyCredentials,
    pub apple: AppleCredentials,
    pub apple_api_url: String,
    pub threshold: u8,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub backoff_unit: Duration,
    pub artwork_size: u32,
    pub dry_run: bool,
    pub log_dir: PathBuf,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let required = |key: &str| -> Result<String, anyhow::Error> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} not set", key))
        };

        let spotify = SpotifyCredentials {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: lookup("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            token_cache: lookup("SPOTIFY_TOKEN_CACHE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_CACHE)),
        };

        let secret_key = match (lookup("APPLE_SECRET_KEY"), lookup("APPLE_SECRET_KEY_PATH")) {
            (Some(key), _) if !key.trim().is_empty() => key,
            (_, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read APPLE_SECRET_KEY_PATH {}", path))?,
            _ => bail!("APPLE_SECRET_KEY or APPLE_SECRET_KEY_PATH not set"),
        };
        let apple = AppleCredentials {
            key_id: required("APPLE_KEY_ID")?,
            team_id: required("APPLE_TEAM_ID")?,
            secret_key,
            music_user_token: required("APPLE_MUSIC_USER_TOKEN")?,
        };

        let threshold: u8 = parse_or(&lookup, "FUZZY_MATCH_THRESHOLD", DEFAULT_THRESHOLD)?;
        if threshold > 100 {
            bail!("FUZZY_MATCH_THRESHOLD must be between 0 and 100, got {}", threshold);
        }

        let max_retries: u32 = parse_or(&lookup, "MAX_DOWNLOAD_RETRIES", DEFAULT_MAX_RETRIES)?;
        if max_retries == 0 {
            bail!("MAX_DOWNLOAD_RETRIES must be at least 1");
        }

        let request_timeout = Duration::from_secs(parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT.as_secs(),
        )?);
        if request_timeout.is_zero() {
            bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }

        let backoff_unit = Duration::from_millis(parse_or(
            &lookup,
            "BACKOFF_UNIT_MS",
            DEFAULT_BACKOFF_UNIT.as_millis() as u64,
        )?);

        let artwork_size: u32 = parse_or(&lookup, "ARTWORK_SIZE", DEFAULT_ARTWORK_SIZE)?;
        if artwork_size == 0 {
            bail!("ARTWORK_SIZE must be at least 1");
        }

        let dry_run = lookup("SYNC_DRY_RUN")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "" | "0" | "false" | "no"))
            .unwrap_or(false);

        let (log_dir, log_level) = log_settings(&lookup);

        Ok(Self {
            spotify,
            apple,
            apple_api_url: lookup("APPLE_MUSIC_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            threshold,
            max_retries,
            request_timeout,
            backoff_unit,
            artwork_size,
            dry_run,
            log_dir,
            log_level,
        })
    }
}

/// Log directory and level. Needs no credentials, so logging can be set up
/// before the rest of the configuration is validated.
pub fn log_settings(lookup: &impl Fn(&str) -> Option<String>) -> (PathBuf, LevelFilter) {
    let log_dir = lookup("LOG_DIR")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
    let log_level = lookup("RUST_LOG")
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(LevelFilter::Info);
    (log_dir, log_level)
}

pub fn log_settings_from_env() -> (PathBuf, LevelFilter) {
    log_settings(&|key: &str| std::env::var(key).ok())
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {} {:?}: {}", key, value, e)),
        None => Ok(default),
    }
}
