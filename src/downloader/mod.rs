pub mod http_pool;
pub mod manager;
pub mod ytdlp;

use std::path::{Path, PathBuf};
use crate::api::TrackMetadata;
use crate::errors::Result;

/// Resolves source URLs and fetches their audio.
#[async_trait::async_trait]
pub trait MediaExtractor {
    /// Title, artist, album and duration, without downloading media.
    async fn fetch_metadata(&self, url: &str) -> Result<TrackMetadata>;

    /// Flattens a playlist into its entry URLs, in playlist order.
    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>>;

    /// Downloads best audio to `output_path` (extension included) and returns the written file.
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<PathBuf>;

    fn get_name(&self) -> &str;
}
