use std::{path::PathBuf, time::Duration};

use anyhow::anyhow;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rspotify::{
    prelude::{BaseClient, Id, OAuthClient},
    scopes, AuthCodeSpotify, Credentials, OAuth,
};

use crate::{library::TargetLibrary, playlist::Playlist};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const DEFAULT_TOKEN_CACHE: &str = ".spotify_token_cache.json";
pub const API_BASE_URL: &str = "https://api.spotify.com/v1";

#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_cache: PathBuf,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("token_cache", &self.token_cache)
            .finish_non_exhaustive()
    }
}

/// Builds an authorized client, prompting on the terminal when the token
/// cache is missing or stale. Blocks.
pub fn authorize(credentials: &SpotifyCredentials) -> Result<AuthCodeSpotify, anyhow::Error> {
    let creds = Credentials::new(&credentials.client_id, &credentials.client_secret);
    let oauth = OAuth {
        redirect_uri: credentials.redirect_uri.clone(),
        scopes: scopes!(
            "playlist-read-private",
            "playlist-modify-public",
            "playlist-modify-private",
            "ugc-image-upload"
        ),
        ..Default::default()
    };

    let mut spotify = AuthCodeSpotify::new(creds, oauth);
    spotify.config.token_cached = true;
    spotify.config.token_refreshing = true;
    spotify.config.cache_path = credentials.token_cache.clone();

    let url = spotify.get_authorize_url(false)?;
    spotify.prompt_for_token(&url)?;
    log::info!("Spotify client initialized successfully");
    Ok(spotify)
}

pub fn cover_image_url(playlist_id: &str) -> String {
    format!("{}/playlists/{}/images", API_BASE_URL, playlist_id)
}

/// Spotify playlists as a sync target.
pub struct SpotifyTarget {
    spotify: AuthCodeSpotify,
    http: reqwest::Client,
}

impl SpotifyTarget {
    pub fn new(spotify: AuthCodeSpotify, timeout: Duration) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { spotify, http })
    }

    /// Access token for calls rspotify does not wrap, refreshed first if it
    /// has expired.
    async fn access_token(&self) -> Result<String, anyhow::Error> {
        let spotify = self.spotify.clone();
        tokio::task::spawn_blocking(move || -> Result<String, anyhow::Error> {
            let expired = {
                let token = spotify.get_token();
                let guard = token
                    .lock()
                    .map_err(|_| anyhow!("Spotify token lock poisoned"))?;
                guard.as_ref().map_or(true, |t| t.is_expired())
            };
            if expired {
                log::debug!("Spotify access token expired, refreshing");
                spotify.refresh_token()?;
            }

            let token = spotify.get_token();
            let guard = token
                .lock()
                .map_err(|_| anyhow!("Spotify token lock poisoned"))?;
            guard
                .as_ref()
                .map(|t| t.access_token.clone())
                .ok_or_else(|| anyhow!("Spotify client is not authorized"))
        })
        .await?
    }
}

#[async_trait::async_trait]
impl TargetLibrary for SpotifyTarget {
    async fn playlists(&self) -> Result<Vec<Playlist>, anyhow::Error> {
        let spotify = self.spotify.clone();
        let playlists = tokio::task::spawn_blocking(move || {
            spotify
                .current_user_playlists()
                .map(|item| {
                    item.map(|p| {
                        let artwork_url = p.images.first().map(|i| i.url.clone());
                        Playlist::new(p.name, p.id.id(), artwork_url)
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .await??;

        log::info!("Fetched {} Spotify playlists", playlists.len());
        Ok(playlists)
    }

    async fn upload_cover(&self, playlist_id: &str, jpeg: Vec<u8>) -> Result<(), anyhow::Error> {
        let token = self.access_token().await?;
        let body = BASE64.encode(jpeg);

        self.http
            .put(cover_image_url(playlist_id))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
