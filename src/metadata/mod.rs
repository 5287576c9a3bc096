pub mod embedder;
pub mod html;
pub mod lyrics;
pub mod providers;

use std::path::Path;
use crate::api::UNKNOWN_ALBUM;
use crate::errors::Result;

/// Maps (title, artist) to a release title. `Ok(None)` means the service had no match.
#[async_trait::async_trait]
pub trait AlbumLookup {
    async fn lookup_album(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

/// Finds cover image bytes for an album name.
#[async_trait::async_trait]
pub trait CoverArtSource {
    async fn fetch_cover(&self, album: &str) -> Result<Option<Vec<u8>>>;
}

#[async_trait::async_trait]
pub trait LyricsSource {
    async fn fetch_lyrics(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

/// Writes cover art and lyrics into an audio container in place.
pub trait TagWriter {
    fn embed(&self, file_path: &Path, cover: Option<&[u8]>, lyrics: Option<&str>) -> Result<()>;
}

/// An explicit album override wins unless it is the placeholder; otherwise ask the
/// lookup service and fall back to the placeholder on any failure.
pub async fn resolve_album(
    album_override: Option<&str>,
    title: &str,
    artist: &str,
    lookup: &(dyn AlbumLookup + Send + Sync),
) -> String {
    if let Some(album) = album_override {
        if album != UNKNOWN_ALBUM {
            return album.to_string();
        }
    }

    match lookup.lookup_album(title, artist).await {
        Ok(Some(album)) => {
            log::info!("📀 [ALBUM] {} - {} -> {}", artist, title, album);
            album
        }
        Ok(None) => {
            log::warn!("⚠️ [ALBUM] No release found for {} - {}", artist, title);
            UNKNOWN_ALBUM.to_string()
        }
        Err(e) => {
            log::warn!("⚠️ [ALBUM] Lookup failed for {} - {}: {}", artist, title, e);
            UNKNOWN_ALBUM.to_string()
        }
    }
}
