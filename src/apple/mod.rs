use anyhow::Context;
use client::{AppleMusic, LIBRARY_PLAYLISTS_PATH};
use models::{library::LibraryPlaylist, Page};

use crate::{library::SourceLibrary, playlist::Playlist};

pub mod client;
pub mod models;
pub mod token;

pub const DEFAULT_API_URL: &str = "https://api.music.apple.com";
pub const DEFAULT_ARTWORK_SIZE: u32 = 600;

#[derive(Clone)]
pub struct AppleCredentials {
    pub key_id: String,
    pub team_id: String,
    /// PEM contents of the `.p8` MusicKit key.
    pub secret_key: String,
    pub music_user_token: String,
}

impl std::fmt::Debug for AppleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppleCredentials")
            .field("key_id", &self.key_id)
            .field("team_id", &self.team_id)
            .finish_non_exhaustive()
    }
}

/// Apple Music library playlists as a sync source.
pub struct AppleMusicSource {
    client: AppleMusic,
    artwork_size: u32,
}

impl AppleMusicSource {
    pub fn new(client: AppleMusic, artwork_size: u32) -> Self {
        Self {
            client,
            artwork_size,
        }
    }
}

#[async_trait::async_trait]
impl SourceLibrary for AppleMusicSource {
    async fn playlists(&self) -> Result<Vec<Playlist>, anyhow::Error> {
        let mut playlists = Vec::new();
        let mut next = Some(LIBRARY_PLAYLISTS_PATH.to_string());

        while let Some(path) = next.take() {
            let page = self
                .client
                .get_library_playlists(&path)
                .await
                .with_context(|| format!("Failed to fetch Apple Music playlists from {}", path))?;
            next = page.next.clone();
            playlists.extend(playlists_from_page(page, self.artwork_size));
        }

        log::info!("Fetched {} Apple Music playlists", playlists.len());
        Ok(playlists)
    }
}

pub fn playlists_from_page(page: Page<LibraryPlaylist>, artwork_size: u32) -> Vec<Playlist> {
    page.data
        .into_iter()
        .filter_map(|item| {
            let Some(attributes) = item.attributes else {
                log::debug!("Apple Music playlist {} has no attributes, skipping", item.id);
                return None;
            };
            let artwork_url = attributes
                .artwork
                .map(|a| resolve_artwork_url(&a.url, a.width, a.height, artwork_size));
            Some(Playlist::new(attributes.name, item.id, artwork_url))
        })
        .collect()
}

/// Fills in the `{w}`, `{h}` and `{f}` placeholders of an Apple artwork URL
/// template. The requested size is capped by the artwork's own dimensions.
pub fn resolve_artwork_url(
    template: &str,
    width: Option<u32>,
    height: Option<u32>,
    size: u32,
) -> String {
    let cap = |dimension: Option<u32>| match dimension {
        Some(d) if d > 0 => d.min(size),
        _ => size,
    };

    template
        .replace("{w}", &cap(width).to_string())
        .replace("{h}", &cap(height).to_string())
        .replace("{f}", "jpg")
}
