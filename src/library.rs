use crate::playlist::Playlist;

/// Service the artwork is copied from.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SourceLibrary: Send + Sync {
    /// Playlists in listing order, with artwork URLs where the service has one.
    async fn playlists(&self) -> Result<Vec<Playlist>, anyhow::Error>;
}

/// Service the artwork is copied to.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TargetLibrary: Send + Sync {
    async fn playlists(&self) -> Result<Vec<Playlist>, anyhow::Error>;

    /// Replaces the cover of `playlist_id` with the given JPEG bytes.
    async fn upload_cover(&self, playlist_id: &str, jpeg: Vec<u8>) -> Result<(), anyhow::Error>;
}
