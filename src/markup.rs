//! HTML helpers shared by every phase.
//!
//! Two halves:
//!
//! - **Queries** go through [`scraper`]: title, `<h1>`, meta content, first
//!   paragraph, first content image. Parsing is lenient, so fragments and
//!   whole documents both work.
//! - **Rewrites** are textual (regex + string splicing). The pipeline only
//!   ever inserts or removes whole elements, and splicing keeps every byte
//!   it does not touch, so hand-authored markup survives rebuilds unchanged.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").expect("valid selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static ARTICLE_IMG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main.article-content img").expect("valid selector")
});

static TITLE_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title\s*>").expect("valid regex"));
static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid regex"));
static LD_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script\b[^>]*type\s*=\s*["']?application/ld\+json["']?[^>]*>.*?</script\s*>"#,
    )
    .expect("valid regex")
});
static STYLE_IN_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<head\b[^>]*>.*?<style\b[^>]*>(.*?)</style\s*>").expect("valid regex")
});
static HEAD_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>.*?</head\s*>").expect("valid regex"));
static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").expect("valid regex"));
static SHELL_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<!doctype[^>]*>|</?html(?:\s[^>]*)?>|</?body(?:\s[^>]*)?>").expect("valid regex")
});
static BREADCRUMB_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""@type"\s*:\s*"BreadcrumbList""#).expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid regex")
});

// ============================================================================
// Queries
// ============================================================================

/// Parse a document or fragment for querying.
pub fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn first_non_empty_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Text of the first `<h1>`, if non-empty.
pub fn h1_text(doc: &Html) -> Option<String> {
    first_non_empty_text(doc, &H1)
}

/// Text of `<title>`, if non-empty.
pub fn title_text(doc: &Html) -> Option<String> {
    first_non_empty_text(doc, &TITLE)
}

/// Text of the first `<p>`, if non-empty.
pub fn first_paragraph(doc: &Html) -> Option<String> {
    first_non_empty_text(doc, &PARAGRAPH)
}

/// `content` of the first `<meta name="…">` with the given name.
pub fn meta_name(doc: &Html, name: &str) -> Option<String> {
    meta_by(doc, "name", name)
}

/// `content` of the first `<meta property="…">` with the given property.
pub fn meta_property(doc: &Html, property: &str) -> Option<String> {
    meta_by(doc, "property", property)
}

fn meta_by(doc: &Html, attr: &str, value: &str) -> Option<String> {
    doc.select(&META)
        .find(|m| m.value().attr(attr) == Some(value))
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string)
}

fn has_ancestor(el: &ElementRef<'_>, pred: impl Fn(&scraper::node::Element) -> bool) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| pred(a.value()))
}

fn has_class(el: &scraper::node::Element, class: &str) -> bool {
    el.attr("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

/// First image that belongs to the page content rather than the site chrome.
///
/// Looks inside `main.article-content` first; otherwise considers every
/// image outside `<header>`/`<footer>`. Sources mentioning `logo` are never
/// picked.
pub fn first_content_image(doc: &Html) -> Option<String> {
    let not_logo = |src: &&str| !src.to_ascii_lowercase().contains("logo");

    let in_article = doc
        .select(&ARTICLE_IMG)
        .filter_map(|img| img.value().attr("src"))
        .find(not_logo);
    if let Some(src) = in_article {
        return Some(src.to_string());
    }

    doc.select(&IMG)
        .filter(|img| !has_ancestor(img, |a| matches!(a.name(), "header" | "footer")))
        .filter_map(|img| img.value().attr("src"))
        .find(not_logo)
        .map(str::to_string)
}

/// Sources of all images nested inside an element carrying `class`.
pub fn image_sources_within_class(doc: &Html, class: &str) -> HashSet<String> {
    doc.select(&IMG)
        .filter(|img| has_ancestor(img, |a| has_class(a, class)))
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect()
}

/// Inner text of the first `<style>` inside `<head>`, if any.
pub fn head_style(html: &str) -> Option<String> {
    STYLE_IN_HEAD
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split a comma-separated tag list: trim, drop empties, keep first occurrence.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tag scanning
// ============================================================================

/// A start tag found in raw markup, with its byte range and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    pub range: Range<usize>,
    /// Attributes in source order; values are kept as written (not decoded).
    pub attrs: Vec<(String, Option<String>)>,
}

impl StartTag {
    /// Value of an attribute (case-insensitive name match).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Whether the `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

fn start_tag_regex(tag: &str) -> Regex {
    Regex::new(&format!(r#"(?i)<{tag}\b((?:[^>"']|"[^"]*"|'[^']*')*)/?>"#)).expect("valid regex")
}

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| start_tag_regex("img"));
static META_TAG: LazyLock<Regex> = LazyLock::new(|| start_tag_regex("meta"));

fn parse_attrs(raw: &str) -> Vec<(String, Option<String>)> {
    ATTRIBUTE
        .captures_iter(raw.trim_end_matches('/'))
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| m.as_str().to_string());
            Some((name, value))
        })
        .collect()
}

fn scan_tags(re: &Regex, html: &str) -> Vec<StartTag> {
    re.captures_iter(html)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let attrs = c.get(1).map(|m| parse_attrs(m.as_str())).unwrap_or_default();
            Some(StartTag {
                range: whole.range(),
                attrs,
            })
        })
        .collect()
}

/// Every `<img>` start tag in document order.
pub fn img_tags(html: &str) -> Vec<StartTag> {
    scan_tags(&IMG_TAG, html)
}

/// Every `<meta>` tag in document order.
pub fn meta_tags(html: &str) -> Vec<StartTag> {
    scan_tags(&META_TAG, html)
}

/// Whether any `<meta property="og:…">` exists.
pub fn has_open_graph(html: &str) -> bool {
    meta_tags(html)
        .iter()
        .any(|m| m.attr("property").is_some_and(|p| p.starts_with("og:")))
}

/// Whether byte offset `pos` sits inside an open `<picture>` element.
pub fn inside_picture(html: &str, pos: usize) -> bool {
    let before = html[..pos].to_ascii_lowercase();
    match before.rfind("<picture") {
        Some(open) => before.rfind("</picture").is_none_or(|close| close < open),
        None => false,
    }
}

// ============================================================================
// Rewrites
// ============================================================================

/// Replace byte ranges with new text. Ranges must not overlap.
pub fn splice(html: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(r, _)| r.start);
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&html[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&html[cursor..]);
    out
}

/// Remove every `<meta>` whose `attr` equals `value`. Returns the new markup
/// and the removed tags as written.
pub fn remove_meta(html: &str, attr: &str, value: &str) -> (String, Vec<String>) {
    let matches: Vec<StartTag> = meta_tags(html)
        .into_iter()
        .filter(|m| m.attr(attr) == Some(value))
        .collect();
    let removed = matches
        .iter()
        .map(|m| html[m.range.clone()].to_string())
        .collect();
    let edits = matches
        .into_iter()
        .map(|m| (m.range, String::new()))
        .collect();
    (splice(html, edits), removed)
}

/// Remove every `<meta>` except `<meta charset>`.
pub fn remove_non_charset_meta(html: &str) -> String {
    let edits = meta_tags(html)
        .into_iter()
        .filter(|m| !m.has_attr("charset"))
        .map(|m| (m.range, String::new()))
        .collect();
    splice(html, edits)
}

/// Remove `<title>` elements.
pub fn remove_title(html: &str) -> String {
    TITLE_ELEMENT.replace_all(html, "").into_owned()
}

/// Replace the first `<title>` or, failing that, add one at the top of `<head>`.
pub fn set_title(html: &str, title: &str) -> String {
    let element = format!("<title>{}</title>", escape_text(title));
    if let Some(m) = TITLE_ELEMENT.find(html) {
        return splice(html, vec![(m.range(), element)]);
    }
    insert_after_head_open(html, &element).unwrap_or_else(|| format!("{element}\n{html}"))
}

/// JSON-LD script blocks in document order, with their ranges.
pub fn ld_json_blocks(html: &str) -> Vec<(Range<usize>, &str)> {
    LD_JSON
        .find_iter(html)
        .map(|m| (m.range(), m.as_str()))
        .collect()
}

/// Remove JSON-LD blocks for which `pred` returns true.
pub fn remove_ld_json(html: &str, pred: impl Fn(&str) -> bool) -> String {
    let edits = ld_json_blocks(html)
        .into_iter()
        .filter(|(_, block)| pred(block))
        .map(|(range, _)| (range, String::new()))
        .collect();
    splice(html, edits)
}

/// Whether a script block is itself a schema.org `BreadcrumbList`.
///
/// Only the top-level `@type` counts: a page schema whose `@graph` nests a
/// breadcrumb is not a breadcrumb block. Unparseable blocks fall back to a
/// textual match.
pub fn is_breadcrumb_block(block: &str) -> bool {
    let body = block
        .find('>')
        .zip(block.rfind("</"))
        .and_then(|(open, close)| block.get(open + 1..close))
        .unwrap_or(block);
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match &value["@type"] {
            serde_json::Value::String(t) => t == "BreadcrumbList",
            serde_json::Value::Array(types) => types.iter().any(|t| t == "BreadcrumbList"),
            _ => false,
        },
        Err(_) => BREADCRUMB_TYPE.is_match(block),
    }
}

/// Number of `BreadcrumbList` JSON-LD blocks in the markup.
pub fn count_breadcrumbs(html: &str) -> usize {
    ld_json_blocks(html)
        .iter()
        .filter(|(_, b)| is_breadcrumb_block(b))
        .count()
}

/// Byte offset of the first `</tag>` (case-insensitive). `</head` inside
/// `</header>` does not count.
fn find_close_tag(html: &str, tag: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("</{}", tag.to_ascii_lowercase());
    lower.match_indices(&needle).map(|(pos, _)| pos).find(|&pos| {
        lower[pos + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| c == '>' || c.is_ascii_whitespace())
    })
}

/// Insert `snippet` (followed by a newline) right before the first closing
/// tag `</tag>`. `None` when the tag is absent.
pub fn insert_before_close(html: &str, tag: &str, snippet: &str) -> Option<String> {
    let pos = find_close_tag(html, tag)?;
    Some(splice(html, vec![(pos..pos, format!("{snippet}\n"))]))
}

/// Insert `snippet` right after the `<head…>` start tag.
pub fn insert_after_head_open(html: &str, snippet: &str) -> Option<String> {
    let m = HEAD_OPEN.find(html)?;
    Some(splice(html, vec![(m.end()..m.end(), format!("\n{snippet}"))]))
}

/// Insert into the head (before `</head>`), else before `</body>`, else append.
pub fn insert_into_head(html: &str, snippet: &str) -> String {
    insert_before_close(html, "head", snippet)
        .or_else(|| insert_before_close(html, "body", snippet))
        .unwrap_or_else(|| format!("{html}\n{snippet}"))
}

/// Everything after the `<body…>` start tag, or the whole input without one.
pub fn after_body_open(html: &str) -> &str {
    match BODY_OPEN.find(html) {
        Some(m) => &html[m.end()..],
        None => html,
    }
}

/// Everything before `</body>`, or the whole input without one.
pub fn before_body_close(html: &str) -> &str {
    match find_close_tag(html, "body") {
        Some(pos) => &html[..pos],
        None => html,
    }
}

/// Body content of a fragment that may be a full document: drops the
/// doctype, the `<head>` element and the `html`/`body` wrapper tags.
pub fn strip_document_shell(html: &str) -> String {
    let without_head = HEAD_ELEMENT.replace_all(html, "");
    SHELL_TAGS.replace_all(&without_head, "").trim().to_string()
}

/// A JSON-LD `<script>` element holding `value`, optionally with an `id`.
pub fn ld_json_script(value: &serde_json::Value, id: Option<&str>) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?.replace("</", "<\\/");
    let id = id
        .map(|id| format!(" id=\"{}\"", escape_attr(id)))
        .unwrap_or_default();
    Ok(format!("<script type=\"application/ld+json\"{id}>\n{json}\n</script>"))
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Decode the entities [`escape_attr`] produces (plus `&#39;`), so raw
/// attribute values can be handed to an escaping renderer without doubling.
pub fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
