//! Line-oriented input file: an optional `Album name` marker that sets the album
//! for the lines after it, an optional `Links` header, and bare URLs.

use std::path::Path;
use std::sync::OnceLock;
use regex::Regex;
use crate::api::TrackRequest;
use crate::errors::Result;

const ALBUM_MARKER: &str = "Album name";
const LINKS_MARKER: &str = "Links";

#[derive(Debug, Clone, PartialEq)]
pub enum InputEntry {
    Song(TrackRequest),
    Playlist(TrackRequest),
}

impl InputEntry {
    pub fn request(&self) -> &TrackRequest {
        match self {
            InputEntry::Song(request) | InputEntry::Playlist(request) => request,
        }
    }
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://").expect("static regex"))
}

/// Parses the whole input text. Lines that match no known form are dropped.
pub fn parse_input(text: &str) -> Vec<InputEntry> {
    let mut album: Option<String> = None;
    let mut entries = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(ALBUM_MARKER) {
            album = parse_album_override(line);
            log::debug!("[INPUT] Album override set to {:?}", album);
        } else if line.contains(LINKS_MARKER) {
            continue;
        } else if url_pattern().is_match(line) {
            let request = TrackRequest::new(line, None, album.clone());
            if line.contains("playlist") {
                entries.push(InputEntry::Playlist(request));
            } else {
                entries.push(InputEntry::Song(request));
            }
        } else {
            log::debug!("[INPUT] Ignoring line: {}", line);
        }
    }

    entries
}

fn parse_album_override(line: &str) -> Option<String> {
    let rest = line.replace(ALBUM_MARKER, "");
    let rest = rest.trim();
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Reads and parses the input file. `Ok(None)` when the file does not exist.
pub async fn read_input_file(path: &Path) -> Result<Option<Vec<InputEntry>>> {
    if !path.exists() {
        log::error!("[INPUT] Error: '{}' not found.", path.display());
        return Ok(None);
    }

    let text = tokio::fs::read_to_string(path).await?;
    let entries = parse_input(&text);
    log::info!("[INPUT] Read {} link(s) from {}", entries.len(), path.display());
    Ok(Some(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(url: &str, album: Option<&str>) -> InputEntry {
        InputEntry::Song(TrackRequest::new(url, None, album.map(str::to_string)))
    }

    fn playlist(url: &str, album: Option<&str>) -> InputEntry {
        InputEntry::Playlist(TrackRequest::new(url, None, album.map(str::to_string)))
    }

    #[test]
    fn album_marker_applies_to_following_links() {
        let text = "\
https://youtu.be/first
Album name: Test Album
Links:
https://youtu.be/second
https://www.youtube.com/playlist?list=PL123
";
        assert_eq!(
            parse_input(text),
            vec![
                song("https://youtu.be/first", None),
                song("https://youtu.be/second", Some("Test Album")),
                playlist("https://www.youtube.com/playlist?list=PL123", Some("Test Album")),
            ]
        );
    }

    #[test]
    fn later_marker_replaces_earlier_one() {
        let text = "Album name First\nhttps://a.example/1\nAlbum name:   Second  \nhttps://a.example/2\n";
        let entries = parse_input(text);
        assert_eq!(entries[0].request().album.as_deref(), Some("First"));
        assert_eq!(entries[1].request().album.as_deref(), Some("Second"));
    }

    #[test]
    fn empty_marker_clears_override() {
        let text = "Album name: X\nAlbum name\nhttps://a.example/1\n";
        assert_eq!(parse_input(text), vec![song("https://a.example/1", None)]);
    }

    #[test]
    fn non_url_lines_are_ignored() {
        let text = "\n   \nsome notes\nftp://not-http.example\nwww.example.com\n  https://ok.example/v  \n";
        assert_eq!(parse_input(text), vec![song("https://ok.example/v", None)]);
    }

    #[test]
    fn one_song_entry_per_non_playlist_url() {
        let text = (0..5).map(|i| format!("http://v.example/{}\n", i)).collect::<String>();
        let entries = parse_input(&text);
        assert_eq!(entries.len(), 5);
        assert!(entries.iter().all(|e| matches!(e, InputEntry::Song(_))));
    }

    #[test]
    fn artist_is_never_set_from_the_file() {
        let entries = parse_input("Album name: A\nhttps://x.example/1\n");
        assert_eq!(entries[0].request().artist, None);
    }

    #[tokio::test]
    async fn missing_file_yields_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(read_input_file(&dir.path().join("url.txt")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn reads_file_from_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("url.txt");
        std::fs::write(&path, "Album name: Disk\nhttps://x.example/1\n")?;
        let entries = read_input_file(&path).await?.unwrap_or_default();
        assert_eq!(entries, vec![song("https://x.example/1", Some("Disk"))]);
        Ok(())
    }
}
