mod apple;
mod artwork;
mod config;
mod library;
mod logging;
mod matcher;
mod playlist;
mod spotify;
mod sync;

use anyhow::Context;
use apple::{client::AppleMusic, AppleMusicSource};
use artwork::{ArtworkFetcher, ReqwestHttp};
use config::Config;
use matcher::NameMatcher;
use playlist::SyncOutcome;
use spotify::SpotifyTarget;
use sync::SyncOrchestrator;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to load .env");
        }
    }

    let (log_dir, log_level) = config::log_settings_from_env();
    if let Err(e) = logging::init(&log_dir, log_level) {
        eprintln!("failed to initialize logging: {:#}", e);
    }

    let config = match Config::from_env().context("Invalid configuration") {
        Ok(config) => config,
        Err(e) => {
            log::error!("Application failed: {:#}", e);
            return Err(e);
        }
    };

    match run(config).await {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Sync process failed: {:#}", e);
            Err(e)
        }
    }
}

async fn run(config: Config) -> Result<SyncOutcome, anyhow::Error> {
    let developer_token = apple::token::developer_token(&config.apple, chrono::Utc::now())
        .context("Failed to initialize Apple Music client")?;
    let apple = AppleMusic::new(
        config.apple_api_url.clone(),
        developer_token,
        config.apple.music_user_token.clone(),
        config.request_timeout,
    )?;
    log::info!("Apple Music client initialized successfully");

    let credentials = config.spotify.clone();
    let spotify = tokio::task::spawn_blocking(move || spotify::authorize(&credentials))
        .await?
        .context("Failed to initialize Spotify client")?;

    let source = AppleMusicSource::new(apple, config.artwork_size);
    let target = SpotifyTarget::new(spotify, config.request_timeout)?;
    let fetcher = ArtworkFetcher::new(
        Box::new(ReqwestHttp::new(config.request_timeout)?),
        config.max_retries,
        config.backoff_unit,
    );

    if config.dry_run {
        log::info!("Dry run: artwork will be matched and downloaded but not uploaded");
    }

    SyncOrchestrator::new(Box::new(source), Box::new(target), fetcher)
        .with_matcher(NameMatcher::new(config.threshold))
        .dry_run(config.dry_run)
        .run()
        .await
}
