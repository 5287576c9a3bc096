//! Just enough HTML reading for the two scraped pages: start tags, attributes,
//! one element's text. No DOM is built.

use regex::Regex;

/// Every start tag named `name`, in document order.
pub fn find_tags<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let pattern = format!(r"(?is)<{}\b[^>]*>", regex::escape(name));
    match Regex::new(&pattern) {
        Ok(re) => re.find_iter(html).map(|m| m.as_str()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Value of attribute `name` inside a single start tag, entities decoded.
pub fn attr(tag: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)\s{}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(tag)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| decode_entities(m.as_str()))
}

/// Text content of the first `<name id="id">` element, tags stripped and entities decoded.
pub fn element_text_by_id(html: &str, name: &str, id: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)<{name}\b[^>]*\sid\s*=\s*["']{id}["'][^>]*>(.*?)</{name}\s*>"#,
        name = regex::escape(name),
        id = regex::escape(id)
    );
    let re = Regex::new(&pattern).ok()?;
    let inner = re.captures(html)?.get(1)?.as_str();
    Some(decode_entities(&strip_tags(inner)))
}

pub fn strip_tags(html: &str) -> String {
    match Regex::new(r"(?s)<[^>]*>") {
        Ok(re) => re.replace_all(html, "").into_owned(),
        Err(_) => html.to_string(),
    }
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let re = match Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);") {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    re.replace_all(text, |caps: &regex::Captures| {
        let entity = &caps[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
            }
            _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            _ => None,
        };
        decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_img_tags_in_order() {
        let html = r#"<div><IMG src="/logo.gif"><p>x</p><img class="t" data-src="lazy" src='https://i.example/a.jpg'/></div>"#;
        let tags = find_tags(html, "img");
        assert_eq!(tags.len(), 2);
        assert_eq!(attr(tags[0], "src").as_deref(), Some("/logo.gif"));
        assert_eq!(attr(tags[1], "src").as_deref(), Some("https://i.example/a.jpg"));
    }

    #[test]
    fn attr_does_not_match_prefixed_names() {
        assert_eq!(attr(r#"<img data-src="lazy">"#, "src"), None);
        assert_eq!(attr("<a href=/lyric/1/x>", "href").as_deref(), Some("/lyric/1/x"));
    }

    #[test]
    fn attr_values_are_unescaped() {
        let tag = r#"<a href="/serp.php?st=a&amp;qtype=1">"#;
        assert_eq!(attr(tag, "href").as_deref(), Some("/serp.php?st=a&qtype=1"));
    }

    #[test]
    fn element_text_strips_inner_markup() {
        let html = r#"<body><pre id="other">no</pre><pre class="lyric-body" id="lyric-body-text" dir="ltr">Line one
<a href="/artist/x">Line</a> two &amp; &#39;three&#39;</pre></body>"#;
        assert_eq!(
            element_text_by_id(html, "pre", "lyric-body-text").as_deref(),
            Some("Line one\nLine two & 'three'")
        );
        assert_eq!(element_text_by_id(html, "pre", "missing"), None);
    }

    #[test]
    fn unknown_entities_are_left_alone() {
        assert_eq!(decode_entities("a &bogus; b &#x41;"), "a &bogus; b A");
    }
}
