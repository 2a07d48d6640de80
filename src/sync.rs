use std::panic::AssertUnwindSafe;

use anyhow::Context;
use futures::FutureExt;

use crate::{
    artwork::{
        encode::{encode_jpeg, EncodeError, MAX_UPLOAD_BASE64_LEN},
        ArtworkFetcher,
    },
    library::{SourceLibrary, TargetLibrary},
    matcher::NameMatcher,
    playlist::{NameIndex, Playlist, SyncOutcome},
};

/// Why a single playlist was not synced.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("no matching target playlist (best score {score}%)")]
    NoMatch { score: u8 },
    #[error("playlist has no artwork")]
    MissingArtwork,
    #[error("artwork download failed")]
    DownloadFailed,
    #[error("artwork encoding failed: {0}")]
    EncodeFailed(#[from] EncodeError),
    #[error("artwork upload failed: {0:#}")]
    UploadFailed(anyhow::Error),
    #[error("processing panicked")]
    Panicked,
}

pub struct SyncOrchestrator {
    source: Box<dyn SourceLibrary>,
    target: Box<dyn TargetLibrary>,
    fetcher: ArtworkFetcher,
    matcher: NameMatcher,
    dry_run: bool,
    max_upload_len: usize,
}

impl SyncOrchestrator {
    pub fn new(
        source: Box<dyn SourceLibrary>,
        target: Box<dyn TargetLibrary>,
        fetcher: ArtworkFetcher,
    ) -> Self {
        Self {
            source,
            target,
            fetcher,
            matcher: NameMatcher::default(),
            dry_run: false,
            max_upload_len: MAX_UPLOAD_BASE64_LEN,
        }
    }

    pub fn with_matcher(mut self, matcher: NameMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs one full pass.
    ///
    /// Only a failure to list either service aborts the run. Every other
    /// failure is counted against its playlist and the loop moves on.
    pub async fn run(&self) -> Result<SyncOutcome, anyhow::Error> {
        let source_playlists = self
            .source
            .playlists()
            .await
            .context("Failed to list source playlists")?;
        let target_playlists = self
            .target
            .playlists()
            .await
            .context("Failed to list target playlists")?;

        let index: NameIndex = target_playlists.iter().collect();
        if index.is_empty() {
            log::warn!("Target service returned no playlists, nothing can match");
        }
        log::info!(
            "Loaded {} source playlists and {} target playlists",
            source_playlists.len(),
            index.len()
        );

        let mut outcome = SyncOutcome::default();
        for (i, playlist) in source_playlists.iter().enumerate() {
            log::debug!(
                "Processing {} of {}: '{}'",
                i + 1,
                source_playlists.len(),
                playlist.name
            );

            let result = AssertUnwindSafe(self.sync_playlist(playlist, &index))
                .catch_unwind()
                .await
                .unwrap_or(Err(SkipReason::Panicked));

            match &result {
                Ok(target_id) => {
                    log::info!(
                        "Successfully updated artwork for '{}' ({})",
                        playlist.name,
                        target_id
                    );
                }
                Err(reason @ SkipReason::NoMatch { .. }) => {
                    log::warn!("Skipping '{}': {}", playlist.name, reason);
                }
                Err(reason) => {
                    log::error!("Failed to process playlist '{}': {}", playlist.name, reason);
                }
            }
            outcome.record(&result);
        }

        log::info!(
            "Sync complete. Success: {}, Failed: {} ({} playlists)",
            outcome.success_count,
            outcome.fail_count,
            outcome.total()
        );
        Ok(outcome)
    }

    async fn sync_playlist(
        &self,
        playlist: &Playlist,
        index: &NameIndex,
    ) -> Result<String, SkipReason> {
        let matched = self.matcher.best_match(&playlist.name, index);
        let target_id = matched
            .target_id
            .ok_or(SkipReason::NoMatch { score: matched.score })?;

        let url = playlist
            .artwork_url
            .as_deref()
            .ok_or(SkipReason::MissingArtwork)?;
        let artwork = self
            .fetcher
            .fetch(url)
            .await
            .ok_or(SkipReason::DownloadFailed)?;

        let jpeg = encode_jpeg(&artwork, self.max_upload_len)?;

        if self.dry_run {
            log::info!(
                "Dry run: would upload {} bytes of artwork for '{}' to {}",
                jpeg.len(),
                playlist.name,
                target_id
            );
            return Ok(target_id);
        }

        self.target
            .upload_cover(&target_id, jpeg)
            .await
            .map_err(SkipReason::UploadFailed)?;
        Ok(target_id)
    }
}
