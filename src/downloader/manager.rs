use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::api::{RunReport, TrackRequest};
use crate::config::AppConfig;
use crate::downloader::http_pool::HttpPool;
use crate::downloader::ytdlp::YtDlpExtractor;
use crate::downloader::MediaExtractor;
use crate::errors::Result;
use crate::input::{read_input_file, InputEntry};
use crate::metadata::embedder::LoftyTagWriter;
use crate::metadata::lyrics::LyricsComProvider;
use crate::metadata::providers::{ImageSearchCoverProvider, MusicBrainzProvider};
use crate::metadata::{resolve_album, AlbumLookup, CoverArtSource, LyricsSource, TagWriter};
use crate::processing::{AudioTrimmer, FfmpegTrimmer};
use crate::utils::{ensure_dir_exists, path_component};

/// The external pieces a song passes through.
pub struct Collaborators {
    pub extractor: Arc<dyn MediaExtractor + Send + Sync>,
    pub album_lookup: Arc<dyn AlbumLookup + Send + Sync>,
    pub cover_source: Arc<dyn CoverArtSource + Send + Sync>,
    pub lyrics_source: Arc<dyn LyricsSource + Send + Sync>,
    pub trimmer: Arc<dyn AudioTrimmer + Send + Sync>,
    pub tag_writer: Arc<dyn TagWriter + Send + Sync>,
}

impl Collaborators {
    pub fn from_config(config: &AppConfig, http_pool: &HttpPool) -> Self {
        let client = http_pool.get_client().clone();
        Self {
            extractor: Arc::new(YtDlpExtractor::from_config(config)),
            album_lookup: Arc::new(MusicBrainzProvider::new(client.clone(), &config.musicbrainz_user_agent)),
            cover_source: Arc::new(ImageSearchCoverProvider::new(
                client.clone(),
                &config.scrape_user_agent,
                config.cover_image_index,
            )),
            lyrics_source: Arc::new(LyricsComProvider::new(client, &config.scrape_user_agent)),
            trimmer: Arc::new(FfmpegTrimmer::from_config(config)),
            tag_writer: Arc::new(LoftyTagWriter::new()),
        }
    }
}

/// Runs songs one after another: metadata, album resolution, download, trim,
/// cover art, lyrics, tags.
pub struct DownloadManager {
    parts: Collaborators,
    output_dir: PathBuf,
    extension: &'static str,
    cover_file_name: String,
    sanitize_paths: bool,
    enable_cover_art: bool,
    enable_lyrics: bool,
}

impl DownloadManager {
    pub fn new(config: &AppConfig, parts: Collaborators) -> Self {
        log::debug!("Using {} for extraction", parts.extractor.get_name());
        Self {
            parts,
            output_dir: config.output_dir.clone(),
            extension: config.get_format_extension(),
            cover_file_name: config.cover_file_name.clone(),
            sanitize_paths: config.sanitize_paths,
            enable_cover_art: config.enable_cover_art,
            enable_lyrics: config.enable_lyrics,
        }
    }

    /// Processes every link of the input file. A missing file is reported and yields an empty report.
    pub async fn run_input_file(&self, path: &Path) -> Result<RunReport> {
        let mut report = RunReport::default();
        let Some(entries) = read_input_file(path).await? else {
            return Ok(report);
        };

        for entry in entries {
            log::debug!("[RUN] Next link: {}", entry.request().url);
            match entry {
                InputEntry::Song(request) => self.process_song_isolated(&request, &mut report).await,
                InputEntry::Playlist(request) => report.merge(self.process_playlist(&request).await),
            }
        }

        Ok(report)
    }

    /// Expands the playlist and runs each entry with the playlist's overrides.
    /// A failing entry is logged and the rest still run.
    pub async fn process_playlist(&self, request: &TrackRequest) -> RunReport {
        let mut report = RunReport::default();
        let entries = match self.parts.extractor.playlist_entries(&request.url).await {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("❌ [PLAYLIST] Could not expand {}: {}", request.url, e);
                report.record_failure(&request.url, e);
                return report;
            }
        };

        let total = entries.len();
        for (index, url) in entries.into_iter().enumerate() {
            log::info!("📃 [PLAYLIST] Entry {}/{}", index + 1, total);
            self.process_song_isolated(&request.with_url(url), &mut report).await;
        }
        report
    }

    async fn process_song_isolated(&self, request: &TrackRequest, report: &mut RunReport) {
        match self.process_song(request).await {
            Ok(_) => report.record_success(),
            Err(e) => {
                log::error!("❌ [RUN] {} failed: {}", request.url, e);
                report.record_failure(&request.url, e);
            }
        }
    }

    /// Full pipeline for one source URL. Returns the path of the finished audio file.
    pub async fn process_song(&self, request: &TrackRequest) -> Result<PathBuf> {
        let metadata = self.parts.extractor.fetch_metadata(&request.url).await?;

        let artist = request.artist.clone().unwrap_or_else(|| metadata.artist.clone());
        let album = resolve_album(
            request.album.as_deref(),
            &metadata.title,
            &artist,
            self.parts.album_lookup.as_ref(),
        )
        .await;

        let folder = self.album_folder(&artist, &album);
        ensure_dir_exists(&folder).await?;

        let file_name = format!("{}.{}", path_component(&metadata.title, self.sanitize_paths), self.extension);
        let save_path = folder.join(file_name);

        log::info!("Downloading: {} to {}", metadata.title, folder.display());
        let audio_path = self.parts.extractor.download_audio(&request.url, &save_path).await?;

        self.parts.trimmer.trim(&audio_path, metadata.duration).await?;

        let cover_path = folder.join(&self.cover_file_name);
        if self.enable_cover_art {
            self.save_cover(&album, &cover_path).await?;
        }

        let lyrics = if self.enable_lyrics {
            self.find_lyrics(&metadata.title, &artist).await
        } else {
            None
        };

        let cover = if self.enable_cover_art && cover_path.exists() {
            Some(tokio::fs::read(&cover_path).await?)
        } else {
            None
        };

        self.parts
            .tag_writer
            .embed(&audio_path, cover.as_deref(), lyrics.as_deref())?;

        log::info!("🎉 [RUN] Finished {} - {}", artist, metadata.title);
        Ok(audio_path)
    }

    fn album_folder(&self, artist: &str, album: &str) -> PathBuf {
        self.output_dir
            .join(path_component(artist, self.sanitize_paths))
            .join(path_component(album, self.sanitize_paths))
    }

    async fn save_cover(&self, album: &str, cover_path: &Path) -> Result<()> {
        match self.parts.cover_source.fetch_cover(album).await {
            Ok(Some(bytes)) => {
                tokio::fs::write(cover_path, &bytes).await?;
                log::info!("Album art saved: {}", cover_path.display());
            }
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ [COVER] Cover art search failed: {}", e),
        }
        Ok(())
    }

    async fn find_lyrics(&self, title: &str, artist: &str) -> Option<String> {
        match self.parts.lyrics_source.fetch_lyrics(title, artist).await {
            Ok(lyrics) => lyrics,
            Err(e) => {
                log::warn!("⚠️ [LYRICS] Lyrics search failed: {}", e);
                None
            }
        }
    }
}
