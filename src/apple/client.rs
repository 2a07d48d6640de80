use std::time::Duration;

use reqwest::Response;

use super::models::{library::LibraryPlaylist, Page};

pub const LIBRARY_PLAYLISTS_PATH: &str = "/v1/me/library/playlists?limit=100";

pub struct AppleMusic {
    base_url: String,
    developer_token: String,
    music_user_token: String,
    client: reqwest::Client,
}

impl AppleMusic {
    pub fn new(
        base_url: String,
        developer_token: String,
        music_user_token: String,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            developer_token,
            music_user_token,
            client,
        })
    }

    /// `path` is absolute from the API root, as Apple's `next` links are.
    pub async fn get(&self, path: &str) -> Result<Response, anyhow::Error> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.developer_token)
            .header("Music-User-Token", &self.music_user_token)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?;

        Ok(response)
    }

    pub async fn get_library_playlists(
        &self,
        path: &str,
    ) -> Result<Page<LibraryPlaylist>, anyhow::Error> {
        let page: Page<LibraryPlaylist> = self.get(path).await?.json().await?;
        Ok(page)
    }
}
