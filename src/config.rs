use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::errors::{AppError, Result};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Root under which `<artist>/<album>` folders are created
    pub output_dir: PathBuf,
    pub input_file: PathBuf,
    pub ytdlp_path: String,
    pub ffmpeg_path: Option<String>,
    /// Netscape cookie jar handed to yt-dlp for authenticated downloads
    pub cookies_file: Option<PathBuf>,
    pub audio_format: AudioFormat,
    pub musicbrainz_user_agent: String,
    pub scrape_user_agent: String,
    pub http_timeout_secs: u64,
    pub proxy: Option<String>,
    pub trim_tolerance_secs: f64,
    /// Which `<img>` of the image-search page to take; index 0 is usually the site logo
    pub cover_image_index: usize,
    pub cover_file_name: String,
    pub sanitize_paths: bool,
    pub enable_cover_art: bool,
    pub enable_lyrics: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    M4a,
    Mp3,
    Flac,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            input_file: PathBuf::from("url.txt"),
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: None,
            cookies_file: None,
            audio_format: AudioFormat::M4a,
            musicbrainz_user_agent: "MusicDownloader/1.0 ( myemail@example.com )".to_string(),
            scrape_user_agent: "Mozilla/5.0".to_string(),
            http_timeout_secs: 30,
            proxy: None,
            trim_tolerance_secs: 2.0,
            cover_image_index: 1,
            cover_file_name: "cover.jpg".to_string(),
            sanitize_paths: false,
            enable_cover_art: true,
            enable_lyrics: true,
        }
    }
}

impl AppConfig {
    /// Layers defaults, the config file (if present) and `SONGDL_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::get_config_path()?,
        };
        log::debug!("Reading configuration from {:?}", config_path);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::from(config_path.as_path()).required(false))
            .add_source(config::Environment::with_prefix("SONGDL").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Config(config::ConfigError::Message("Could not find config directory".to_string())))?;

        Ok(config_dir.join("song-organizer").join("config.toml"))
    }

    pub fn get_format_extension(&self) -> &'static str {
        match self.audio_format {
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
        }
    }

    /// ffmpeg encoder used when a downloaded file has to be re-encoded
    pub fn get_format_codec(&self) -> &'static str {
        match self.audio_format {
            AudioFormat::M4a => "aac",
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Flac => "flac",
        }
    }
}
