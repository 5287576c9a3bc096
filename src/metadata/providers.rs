use base64::Engine;
use reqwest::Client;
use serde_json::Value;
use url::Url;
use crate::errors::{AppError, Result};
use crate::metadata::html;
use crate::metadata::{AlbumLookup, CoverArtSource};

const MUSICBRAINZ_RECORDING_URL: &str = "https://musicbrainz.org/ws/2/recording";
const IMAGE_SEARCH_URL: &str = "https://www.google.com/search";

/// MusicBrainz recording search. The service rejects anonymous clients, so the
/// user agent is mandatory and comes from configuration.
#[derive(Debug, Clone)]
pub struct MusicBrainzProvider {
    client: Client,
    user_agent: String,
}

impl MusicBrainzProvider {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

fn lucene_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "+-&|!(){}[]^\"~*?:\\/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Fuzzy recording search: each field is a lowercased term group so stray
/// `AND`/`OR` words in a title are not read as operators. Empty fields are left out.
pub fn recording_query(title: &str, artist: &str) -> String {
    [("recording", title), ("artist", artist)]
        .iter()
        .map(|(field, value)| (field, lucene_escape(value.trim())))
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| format!("{}:({})", field, value.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First release title of the first recording in a `ws/2/recording` response.
pub fn album_from_response(json: &Value) -> Option<String> {
    json["recordings"]
        .as_array()?
        .first()?["releases"]
        .as_array()?
        .first()?["title"]
        .as_str()
        .map(|s| s.to_string())
}

#[async_trait::async_trait]
impl AlbumLookup for MusicBrainzProvider {
    async fn lookup_album(&self, title: &str, artist: &str) -> Result<Option<String>> {
        let query = recording_query(title, artist);
        let url = format!(
            "{}?query={}&fmt=json&limit=1",
            MUSICBRAINZ_RECORDING_URL,
            urlencoding::encode(&query)
        );
        log::debug!("[ALBUM] MusicBrainz URL: {}", url);

        let response = self.client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Metadata(format!("MusicBrainz returned status {}", response.status())));
        }

        let json: Value = response.json().await?;
        Ok(album_from_response(&json))
    }
}

/// Cover art scraped from an image-search results page.
///
/// The page markup is not a contract: the provider takes the `src` of the
/// `<img>` at `image_index` and treats anything else as "no cover".
#[derive(Debug, Clone)]
pub struct ImageSearchCoverProvider {
    client: Client,
    user_agent: String,
    image_index: usize,
}

impl ImageSearchCoverProvider {
    pub fn new(client: Client, user_agent: impl Into<String>, image_index: usize) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            image_index,
        }
    }

    async fn download_image(&self, src: &str) -> Result<Option<Vec<u8>>> {
        if let Some(data) = decode_data_uri(src)? {
            return Ok(Some(data));
        }

        let image_url = Url::parse(IMAGE_SEARCH_URL)?.join(src)?;
        log::info!("🖼️ [COVER] Downloading cover art from: {}", image_url);
        let response = self.client
            .get(image_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!("⚠️ [COVER] Image request returned status {}", response.status());
            return Ok(None);
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}

pub fn search_query(album: &str) -> String {
    format!("{}+album+cover", urlencoding::encode(album))
}

/// `src` of the image at `index`, if the page has that many images and it carries one.
pub fn cover_source(page: &str, index: usize) -> Option<String> {
    let tags = html::find_tags(page, "img");
    html::attr(tags.get(index)?, "src")
}

/// Inline `data:<mime>;base64,<payload>` sources. `Ok(None)` for ordinary URLs.
pub fn decode_data_uri(src: &str) -> Result<Option<Vec<u8>>> {
    let Some(rest) = src.strip_prefix("data:") else {
        return Ok(None);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(AppError::Metadata("Malformed data URI".to_string()));
    };
    if !header.ends_with(";base64") {
        return Err(AppError::Metadata(format!("Unsupported data URI encoding: {}", header)));
    }
    Ok(Some(base64::engine::general_purpose::STANDARD.decode(payload.trim())?))
}

#[async_trait::async_trait]
impl CoverArtSource for ImageSearchCoverProvider {
    async fn fetch_cover(&self, album: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}?tbm=isch&q={}", IMAGE_SEARCH_URL, search_query(album));
        log::info!("🖼️ [COVER] Searching for cover art: {}", album);

        let response = self.client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!("⚠️ [COVER] Image search returned status {}", response.status());
            return Ok(None);
        }

        let page = response.text().await?;
        match cover_source(&page, self.image_index) {
            Some(src) => self.download_image(&src).await,
            None => {
                log::warn!("No album art found.");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn album_is_first_release_of_first_recording() {
        let json = json!({
            "recordings": [
                {"title": "Song", "releases": [{"title": "First Release"}, {"title": "Second"}]},
                {"title": "Song", "releases": [{"title": "Other Recording"}]}
            ]
        });
        assert_eq!(album_from_response(&json).as_deref(), Some("First Release"));
    }

    #[test]
    fn no_recordings_or_releases_is_none() {
        assert_eq!(album_from_response(&json!({"recordings": []})), None);
        assert_eq!(album_from_response(&json!({"recordings": [{"title": "x"}]})), None);
        assert_eq!(album_from_response(&json!({"error": "bad query"})), None);
    }

    #[test]
    fn recording_query_is_fuzzy_and_lowercased() {
        assert_eq!(
            recording_query("Never Gonna Give You Up (Official Music Video)", "Rick Astley"),
            r"recording:(never gonna give you up \(official music video\)) artist:(rick astley)"
        );
    }

    #[test]
    fn recording_query_escapes_operators_and_skips_empty_fields() {
        assert_eq!(recording_query(r#"Say "Hi": Part 1"#, "  "), r#"recording:(say \"hi\"\: part 1)"#);
        assert_eq!(recording_query("Rock AND Roll", "AC/DC"), r"recording:(rock and roll) artist:(ac\/dc)");
    }

    #[test]
    fn cover_source_skips_the_first_image() {
        let page = r#"<img src="/images/branding/logo.png"><img src="https://enc.example/t1.jpg"><img src="https://enc.example/t2.jpg">"#;
        assert_eq!(cover_source(page, 1).as_deref(), Some("https://enc.example/t1.jpg"));
        assert_eq!(cover_source(page, 0).as_deref(), Some("/images/branding/logo.png"));
        assert_eq!(cover_source(page, 5), None);
        assert_eq!(cover_source("<p>no images</p>", 1), None);
    }

    #[test]
    fn search_query_encodes_album() {
        assert_eq!(search_query("A & B"), "A%20%26%20B+album+cover");
    }

    #[test]
    fn data_uri_is_decoded_inline() -> Result<()> {
        assert_eq!(decode_data_uri("data:image/jpeg;base64,/9j/")?, Some(vec![0xff, 0xd8, 0xff]));
        assert_eq!(decode_data_uri("https://enc.example/t1.jpg")?, None);
        assert!(decode_data_uri("data:image/gif,plain").is_err());
        Ok(())
    }
}
