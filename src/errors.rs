use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Tag error: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    #[error("Decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("Subprocess error: {0}")]
    Subprocess(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
