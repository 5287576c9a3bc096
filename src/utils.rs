use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use crate::errors::{AppError, Result};
use log::{debug, error, info};

/// Runs an external tool to completion and returns its stdout.
///
/// A non-zero exit status is turned into `AppError::Subprocess` carrying stderr.
pub async fn run_command<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("Running {:?}", cmd);

    let output = cmd
        .output()
        .await
        .map_err(|e| AppError::Subprocess(format!("Failed to start {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("{} failed: {}", program, stderr.trim());
        return Err(AppError::Subprocess(format!("{} exited with {}: {}", program, output.status, stderr.trim())));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| AppError::Subprocess(format!("Invalid UTF-8 in {} output: {}", program, e)))
}

/// Sanitizes a filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Path component for an artist, album or title. Raw unless sanitizing is switched on.
pub fn path_component(name: &str, sanitize: bool) -> String {
    if sanitize {
        sanitize_filename(name)
    } else {
        name.to_string()
    }
}

/// Creates a directory if it doesn't exist
pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        tokio::fs::create_dir_all(path).await?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}
