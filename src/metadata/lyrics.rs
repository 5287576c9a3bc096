use reqwest::Client;
use url::Url;
use crate::errors::Result;
use crate::metadata::html;
use crate::metadata::LyricsSource;

const LYRICS_BASE_URL: &str = "https://www.lyrics.com";
const LYRICS_BODY_ID: &str = "lyric-body-text";

/// lyrics.com: search page, then the first `/lyric/` result whose page carries a lyrics body.
pub struct LyricsComProvider {
    client: Client,
    user_agent: String,
}

impl LyricsComProvider {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }

    async fn get_page(&self, url: &str) -> Result<Option<String>> {
        let response = self.client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            log::debug!("❌ [LYRICS] {} returned status: {}", url, response.status());
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}

pub fn search_url(title: &str, artist: &str) -> String {
    format!(
        "{}/serp.php?st={}+{}",
        LYRICS_BASE_URL,
        urlencoding::encode(title),
        urlencoding::encode(artist)
    )
}

/// Result links pointing at a lyric page, absolute, in page order.
pub fn lyric_links(page: &str) -> Vec<String> {
    let Ok(base) = Url::parse(LYRICS_BASE_URL) else {
        return Vec::new();
    };

    html::find_tags(page, "a")
        .into_iter()
        .filter_map(|tag| html::attr(tag, "href"))
        .filter(|href| href.contains("/lyric/"))
        .filter_map(|href| base.join(&href).ok())
        .map(|url| url.to_string())
        .collect()
}

pub fn lyrics_from_page(page: &str) -> Option<String> {
    let text = html::element_text_by_id(page, "pre", LYRICS_BODY_ID)?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[async_trait::async_trait]
impl LyricsSource for LyricsComProvider {
    async fn fetch_lyrics(&self, title: &str, artist: &str) -> Result<Option<String>> {
        log::info!("🎵 [LYRICS] Searching for lyrics: {} - {}", artist, title);
        let Some(results) = self.get_page(&search_url(title, artist)).await? else {
            return Ok(None);
        };

        for link in lyric_links(&results) {
            log::debug!("🔍 [LYRICS] Trying {}", link);
            match self.get_page(&link).await {
                Ok(Some(page)) => {
                    if let Some(lyrics) = lyrics_from_page(&page) {
                        log::info!("✅ [LYRICS] Found lyrics: {} characters", lyrics.len());
                        return Ok(Some(lyrics));
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    log::debug!("❌ [LYRICS] {} failed: {}", link, e);
                    continue;
                }
            }
        }

        log::warn!("⚠️ [LYRICS] No lyrics found for {} - {}", artist, title);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
<div class="sec-lyric">
  <a href="/artist/Band/123">Band</a>
  <a href="/lyric/3551/Band/Song">Song</a>
  <a href="https://www.lyrics.com/lyric/9999/Band/Song+%28Live%29">Song (Live)</a>
  <a name="anchor">no href</a>
</div>"#;

    #[test]
    fn search_url_joins_title_and_artist() {
        assert_eq!(
            search_url("Hey Jude", "The Beatles"),
            "https://www.lyrics.com/serp.php?st=Hey%20Jude+The%20Beatles"
        );
    }

    #[test]
    fn only_lyric_links_are_followed() {
        assert_eq!(
            lyric_links(SEARCH_PAGE),
            vec![
                "https://www.lyrics.com/lyric/3551/Band/Song".to_string(),
                "https://www.lyrics.com/lyric/9999/Band/Song+%28Live%29".to_string(),
            ]
        );
    }

    #[test]
    fn lyrics_body_is_trimmed() {
        let page = r#"<pre id="lyric-body-text" class="lyric-body">
  First line
Second line
</pre>"#;
        assert_eq!(lyrics_from_page(page).as_deref(), Some("First line\nSecond line"));
    }

    #[test]
    fn page_without_body_has_no_lyrics() {
        assert_eq!(lyrics_from_page("<pre>not it</pre>"), None);
        assert_eq!(lyrics_from_page(r#"<pre id="lyric-body-text">   </pre>"#), None);
    }
}
