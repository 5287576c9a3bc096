use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::utils::run_command;

/// Cuts a downloaded file back to the length the source reported.
#[async_trait::async_trait]
pub trait AudioTrimmer {
    /// Returns `true` when the file was re-encoded.
    async fn trim(&self, file_path: &Path, reported_duration: f64) -> Result<bool>;
}

/// The duration to cut to, if any. A reported duration of 0 means "unknown" and never trims.
pub fn trim_target(reported: f64, actual: f64, tolerance: f64) -> Option<f64> {
    if reported > 0.0 && actual > reported + tolerance {
        Some(reported)
    } else {
        None
    }
}

/// Length of the default audio track in seconds.
///
/// Uses the container's frame count when present, otherwise sums packet durations.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AppError::Processing(format!("No audio track in {:?}", path)))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let frames = match params.n_frames {
        Some(frames) => frames,
        None => {
            let mut total = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                    Ok(_) => {}
                    Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                    Err(e) => return Err(e.into()),
                }
            }
            total
        }
    };

    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(frames);
        return Ok(time.seconds as f64 + time.frac);
    }

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| AppError::Processing(format!("Unknown sample rate in {:?}", path)))?;
    Ok(frames as f64 / sample_rate as f64)
}

/// Probes with symphonia and re-encodes with ffmpeg when the file runs long.
pub struct FfmpegTrimmer {
    ffmpeg_path: String,
    codec: &'static str,
    tolerance: f64,
}

impl FfmpegTrimmer {
    pub fn new(ffmpeg_path: impl Into<String>, codec: &'static str, tolerance: f64) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            codec,
            tolerance,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ffmpeg_binary(config.ffmpeg_path.as_deref()),
            config.get_format_codec(),
            config.trim_tolerance_secs,
        )
    }

    async fn cut(&self, file_path: &Path, duration: f64) -> Result<()> {
        let dir = file_path.parent().unwrap_or_else(|| Path::new("."));
        let ext = file_path.extension().and_then(|e| e.to_str()).unwrap_or("m4a");
        let temp = tempfile::Builder::new()
            .prefix(".trim-")
            .suffix(&format!(".{}", ext))
            .tempfile_in(dir)?;

        let duration_arg = format!("{:.3}", duration);
        let args: [&OsStr; 11] = [
            OsStr::new("-y"),
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-i"),
            file_path.as_os_str(),
            OsStr::new("-vn"),
            OsStr::new("-t"),
            OsStr::new(&duration_arg),
            OsStr::new("-c:a"),
            OsStr::new(self.codec),
            temp.path().as_os_str(),
        ];
        run_command(&self.ffmpeg_path, args).await?;

        temp.persist(file_path).map_err(|e| AppError::Io(e.error))?;
        Ok(())
    }
}

/// `ffmpeg_path` may name the binary or the directory holding it, like yt-dlp's `--ffmpeg-location`.
pub fn ffmpeg_binary(ffmpeg_path: Option<&str>) -> String {
    match ffmpeg_path {
        Some(path) if Path::new(path).is_dir() => PathBuf::from(path).join("ffmpeg").to_string_lossy().into_owned(),
        Some(path) => path.to_string(),
        None => "ffmpeg".to_string(),
    }
}

#[async_trait::async_trait]
impl AudioTrimmer for FfmpegTrimmer {
    async fn trim(&self, file_path: &Path, reported_duration: f64) -> Result<bool> {
        let probe_path = file_path.to_path_buf();
        let actual = tokio::task::spawn_blocking(move || probe_duration(&probe_path))
            .await
            .map_err(|e| AppError::Processing(format!("Duration probe panicked: {}", e)))??;

        match trim_target(reported_duration, actual, self.tolerance) {
            Some(target) => {
                log::info!("✂️ [TRIM] {:?}: {:.1}s -> {:.1}s", file_path, actual, target);
                self.cut(file_path, target).await?;
                log::info!("Trimmed: {:?}", file_path);
                Ok(true)
            }
            None => {
                log::debug!("[TRIM] {:?}: {:.1}s within tolerance of {:.1}s", file_path, actual, reported_duration);
                Ok(false)
            }
        }
    }
}
