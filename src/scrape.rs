//! Extraction helpers for scraped pages.
//!
//! The site's HTML is stable but not well-formed enough for strict parsing,
//! so everything here is tolerant scanning: case-insensitive tag detection,
//! local extraction within known blocks, and fixed regex patterns for the
//! few values embedded in links and scripts.

use std::sync::LazyLock;

use regex::Regex;

static USER_ID_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"user\.php\?id=(\d+)").expect("valid regex"));

static AUTH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"auth=([0-9a-f]{32})").expect("valid regex"));

static ID_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id=(\d+)").expect("valid regex"));

static COVER_VIEW_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"coverViewJsonData\[\s*\d+\s*\]\s*=\s*(\{.*\});").expect("valid regex"));

static FIRST_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("valid regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Body markers emitted by the protective network layer in front of the
/// site. Any one of them means the request never reached the application.
const CHALLENGE_MARKERS: &[&str] = &[
    "Checking your browser before accessing",
    "Attention Required! | Cloudflare",
    "cf-browser-verification",
    "cf-challenge",
    "DDoS protection by",
];

/// Returns the first challenge marker found in a response body, if any.
pub fn challenge_marker(body: &str) -> Option<&'static str> {
    CHALLENGE_MARKERS.iter().copied().find(|marker| body.contains(marker))
}

/// Extracts the numeric user id from the first profile link on a page.
pub fn user_id(html: &str) -> Option<u64> {
    USER_ID_LINK.captures(html)?.get(1)?.as_str().parse().ok()
}

/// Extracts the 32-character hexadecimal auth token from a page.
pub fn auth_token(html: &str) -> Option<&str> {
    AUTH_TOKEN.captures(html)?.get(1).map(|m| m.as_str())
}

/// Extracts an `id` query parameter from a URL.
pub fn id_param(url: &str) -> Option<u64> {
    ID_PARAM.captures(url)?.get(1)?.as_str().parse().ok()
}

/// Returns the JSON payloads assigned to `coverViewJsonData[..]` script
/// variables, in document order.
pub fn cover_view_payloads(html: &str) -> Vec<&str> {
    COVER_VIEW_DATA
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// First `href` attribute in a markup fragment.
pub fn first_href(fragment: &str) -> Option<&str> {
    FIRST_HREF.captures(fragment)?.get(1).map(|m| m.as_str())
}

/// Removes all tags from a markup fragment, keeping text content.
pub fn strip_tags(fragment: &str) -> String {
    TAG.replace_all(fragment, "").into_owned()
}

/// Decodes the named entities the site emits plus numeric references.
/// Unknown entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // Entities are short; cap the lookahead so stray ampersands in long
        // text do not scan the rest of the document.
        let semi = tail.find(';').filter(|&idx| idx <= 10);
        let Some(semi) = semi else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        match &tail[1..semi] {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            "nbsp" => out.push(' '),
            entity => match decode_numeric(entity) {
                Some(ch) => out.push(ch),
                None => out.push_str(&tail[..=semi]),
            },
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn decode_numeric(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

/// Case-insensitive substring search from a byte offset.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
        .map(|idx| from + idx)
}

/// Inner content of the first `tag` element whose opening tag contains
/// `class`. An empty `class` matches the first element of that tag.
///
/// Nested elements of the same tag are not tracked; the site does not nest
/// the blocks this is used on.
pub fn element_with_class<'a>(html: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut at = 0;
    while let Some(start) = find_ci(html, &open, at) {
        let tag_end = start + html[start..].find('>')? + 1;
        if class.is_empty() || html[start..tag_end].contains(class) {
            let end = find_ci(html, &close, tag_end)?;
            return Some(&html[tag_end..end]);
        }
        at = tag_end;
    }
    None
}

/// Inner content of every `tag` element, in document order.
pub fn elements<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut found = Vec::new();
    let mut at = 0;
    while let Some(start) = find_ci(html, &open, at) {
        let Some(rel) = html[start..].find('>') else { break };
        let tag_end = start + rel + 1;
        let Some(end) = find_ci(html, &close, tag_end) else { break };
        found.push(&html[tag_end..end]);
        at = end + close.len();
    }
    found
}

/// Value of `attr` on the first `tag` element whose opening tag contains
/// `class`.
pub fn attr_of_element_with_class<'a>(
    html: &'a str,
    tag: &str,
    class: &str,
    attr: &str,
) -> Option<&'a str> {
    let open = format!("<{tag}");
    let mut at = 0;
    while let Some(start) = find_ci(html, &open, at) {
        let tag_end = start + html[start..].find('>')? + 1;
        let attrs = &html[start..tag_end];
        if attrs.contains(class) {
            let needle = format!("{attr}=\"");
            let value_start = find_ci(attrs, &needle, 0)? + needle.len();
            let value = &attrs[value_start..];
            return Some(&value[..value.find('"')?]);
        }
        at = tag_end;
    }
    None
}

/// Text of each `td` cell in a table row, tag-stripped, entity-decoded and
/// trimmed.
pub fn cell_texts(row: &str) -> Vec<String> {
    elements(row, "td")
        .into_iter()
        .map(|cell| decode_entities(&strip_tags(cell)).trim().to_string())
        .collect()
}
