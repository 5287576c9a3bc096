use std::ffi::OsString;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::api::{TrackMetadata, UNKNOWN};
use crate::config::AppConfig;
use crate::downloader::MediaExtractor;
use crate::errors::{AppError, Result};
use crate::utils::run_command;

/// yt-dlp driven through its command line
pub struct YtDlpExtractor {
    ytdlp_path: String,
    ffmpeg_location: Option<String>,
    cookies_file: Option<PathBuf>,
    audio_format: &'static str,
}

impl YtDlpExtractor {
    pub fn new() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_location: None,
            cookies_file: None,
            audio_format: "m4a",
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ytdlp_path: config.ytdlp_path.clone(),
            ffmpeg_location: config.ffmpeg_path.clone(),
            cookies_file: config.cookies_file.clone(),
            audio_format: config.get_format_extension(),
        }
    }

    fn download_args(&self, url: &str, output_path: &Path) -> Vec<OsString> {
        // yt-dlp expands %(field)s in the output template, so literal percents are doubled
        let template = output_path
            .with_extension("%(ext)s")
            .to_string_lossy()
            .replace('%', "%%")
            .replace("%%(ext)s", "%(ext)s");

        let mut args: Vec<OsString> = vec![
            "--format".into(),
            "bestaudio/best".into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            self.audio_format.into(),
            "--audio-quality".into(),
            "0".into(),
            "--no-playlist".into(),
            "--output".into(),
            template.into(),
        ];

        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.into());
        }
        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.into());
        }

        args.push(url.into());
        args
    }

    async fn find_downloaded_file(&self, output_path: &Path) -> Result<PathBuf> {
        if output_path.exists() {
            return Ok(output_path.to_path_buf());
        }

        // The post-processor can leave a different container behind when conversion is skipped
        log::warn!("⚠️ [DOWNLOAD] {:?} not found, looking for another audio file with the same name", output_path);
        let stem = output_path.file_stem().map(|s| s.to_os_string());
        let dir = output_path.parent().unwrap_or_else(|| Path::new("."));

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let same_stem = path.file_stem().map(|s| s.to_os_string()) == stem;
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if same_stem && matches!(ext, "m4a" | "mp3" | "flac" | "opus" | "ogg" | "webm" | "wav") {
                log::info!("✅ [DOWNLOAD] Found fallback audio file: {:?}", path);
                return Ok(path);
            }
        }

        Err(AppError::Download(format!("No audio file found after download: {:?}", output_path)))
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn fetch_metadata(&self, url: &str) -> Result<TrackMetadata> {
        log::info!("🔍 [EXTRACT] Fetching metadata for: {}", url);
        let json = run_command(
            &self.ytdlp_path,
            ["--dump-single-json", "--skip-download", "--no-playlist", "--no-warnings", url],
        )
        .await?;

        let metadata = metadata_from_json(&json)?;
        log::info!(
            "✅ [EXTRACT] {} - {} ({:.0}s, album: {})",
            metadata.artist, metadata.title, metadata.duration, metadata.album
        );
        Ok(metadata)
    }

    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>> {
        log::info!("📃 [PLAYLIST] Expanding playlist: {}", url);
        let json = run_command(
            &self.ytdlp_path,
            ["--flat-playlist", "--dump-single-json", "--no-warnings", url],
        )
        .await?;

        let entries = entries_from_json(&json)?;
        log::info!("📃 [PLAYLIST] {} entries", entries.len());
        Ok(entries)
    }

    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<PathBuf> {
        log::info!("⬇️ [DOWNLOAD] {} -> {:?}", url, output_path);
        run_command(&self.ytdlp_path, self.download_args(url, output_path)).await?;
        let path = self.find_downloaded_file(output_path).await?;
        log::info!("✅ [DOWNLOAD] Audio file written: {:?}", path);
        Ok(path)
    }

    fn get_name(&self) -> &str {
        "yt-dlp"
    }
}

/// Subset of yt-dlp's info dict this tool reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistInfo {
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
}

pub fn metadata_from_json(json: &str) -> Result<TrackMetadata> {
    let info: VideoInfo = serde_json::from_str(json.trim())?;
    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());

    Ok(TrackMetadata {
        title: or_unknown(info.title),
        artist: or_unknown(info.artist),
        album: or_unknown(info.album),
        duration: info.duration.unwrap_or(0.0),
    })
}

pub fn entries_from_json(json: &str) -> Result<Vec<String>> {
    let playlist: PlaylistInfo = serde_json::from_str(json.trim())?;
    if let Some(title) = &playlist.title {
        log::debug!("[PLAYLIST] Title: {}", title);
    }

    Ok(playlist
        .entries
        .into_iter()
        .filter_map(|entry| match entry.url.or(entry.webpage_url) {
            Some(url) => Some(url),
            None => {
                log::warn!("⚠️ [PLAYLIST] Skipping entry without URL: {:?}", entry.id);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_reads_music_fields() -> Result<()> {
        let json = r#"{"id":"abc","title":"Song","artist":"Band","album":"Record","duration":215.0,"uploader":"BandVEVO"}"#;
        let metadata = metadata_from_json(json)?;
        assert_eq!(metadata.title, "Song");
        assert_eq!(metadata.artist, "Band");
        assert_eq!(metadata.album, "Record");
        assert_eq!(metadata.duration, 215.0);
        Ok(())
    }

    #[test]
    fn metadata_defaults_missing_fields() -> Result<()> {
        let metadata = metadata_from_json(r#"{"id":"abc","title":"Only Title"}"#)?;
        assert_eq!(metadata.artist, "Unknown");
        assert_eq!(metadata.album, "Unknown");
        assert_eq!(metadata.duration, 0.0);
        Ok(())
    }

    #[test]
    fn playlist_entries_keep_order_and_skip_blank() -> Result<()> {
        let json = r#"{
            "title": "Mix",
            "entries": [
                {"id": "1", "url": "https://www.youtube.com/watch?v=1"},
                {"id": "2"},
                {"id": "3", "webpage_url": "https://www.youtube.com/watch?v=3"}
            ]
        }"#;
        assert_eq!(
            entries_from_json(json)?,
            vec![
                "https://www.youtube.com/watch?v=1".to_string(),
                "https://www.youtube.com/watch?v=3".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn download_args_use_template_and_optional_flags() {
        let mut extractor = YtDlpExtractor::new();
        extractor.cookies_file = Some(PathBuf::from("cookies.txt"));
        let args = extractor.download_args("https://v.example/1", Path::new("Band/Record/100% Song.m4a"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert!(args.contains(&"bestaudio/best".to_string()));
        assert!(args.contains(&"Band/Record/100%% Song.%(ext)s".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "--cookies" && w[1] == "cookies.txt"));
        assert!(!args.contains(&"--ffmpeg-location".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://v.example/1"));
    }

    #[tokio::test]
    async fn find_downloaded_file_falls_back_to_other_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("Song.opus"), b"x")?;
        let found = YtDlpExtractor::new()
            .find_downloaded_file(&dir.path().join("Song.m4a"))
            .await?;
        assert_eq!(found, dir.path().join("Song.opus"));
        Ok(())
    }
}
