//! SEO injection over every built page.
//!
//! Four injectors run in order on each HTML file under the site root:
//!
//! 1. [`inject_meta`]: exactly one viewport meta; a description.
//! 2. [`inject_open_graph`]: `og:*` tags when the page has none.
//! 3. [`inject_schema`]: the page's pre-generated JSON-LD file, if any.
//! 4. [`inject_breadcrumb`]: one `BreadcrumbList` built from the path.
//!
//! Each injector is a pure `&str -> String` transformation that returns its
//! input unchanged when the page already carries what it would add, so the
//! pass can be re-run over the same tree any number of times. Files are only
//! rewritten when their content changed.

use crate::config::SiteConfig;
use crate::markup::{self, StartTag};
use maud::html;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SeoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Site root not found: {0}")]
    MissingRoot(PathBuf),
}

/// Marker id of the injected page schema block.
pub const PAGE_SCHEMA_ID: &str = "page-schema";

/// Partials never receive page metadata.
const PARTIAL_FILES: [&str; 2] = ["header.html", "footer.html"];

#[derive(Debug, Default)]
pub struct SeoReport {
    pub updated: Vec<PathBuf>,
    pub unchanged: usize,
    pub skipped: usize,
}

// ============================================================================
// Paths
// ============================================================================

/// Root-relative, `/`-separated path of a page.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Site-relative URL of a page; `index.html` maps to its directory.
///
/// ```
/// use phongsach_build::seo::page_url;
/// assert_eq!(page_url("index.html"), "/");
/// assert_eq!(page_url("ahu/index.html"), "/ahu/");
/// assert_eq!(page_url("ahu/ahu-1.html"), "/ahu/ahu-1.html");
/// ```
pub fn page_url(rel_path: &str) -> String {
    match rel_path.strip_suffix("index.html") {
        Some(dir) if dir.is_empty() || dir.ends_with('/') => format!("/{dir}"),
        _ => format!("/{rel_path}"),
    }
}

/// Name of the pre-generated schema file for a page:
/// `ahu/ahu-1.html` → `schema-ahu-ahu-1.json`.
pub fn schema_file_name(rel_path: &str) -> String {
    let stem = rel_path.strip_suffix(".html").unwrap_or(rel_path);
    format!("schema-{}.json", stem.replace('/', "-"))
}

/// HTML files the SEO pass applies to, sorted.
///
/// Skips configured excluded directories, hidden directories and the
/// header/footer partials.
pub fn html_files(root: &Path, config: &SiteConfig) -> Vec<PathBuf> {
    let excluded = &config.layout.exclude_dirs;
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !excluded.iter().any(|d| *d == name)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("html"))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_none_or(|n| !PARTIAL_FILES.contains(&n))
        })
        .collect()
}

// ============================================================================
// Injectors
// ============================================================================

fn meta_element(attr: &str, key: &str, content: &str) -> String {
    match attr {
        "property" => html! { meta property=(key) content=(content); },
        _ => html! { meta name=(key) content=(content); },
    }
    .into_string()
}

/// Insert right after `<head>`, else wherever [`markup::insert_into_head`]
/// can.
fn insert_at_head_start(html: &str, snippet: &str) -> String {
    markup::insert_after_head_open(html, snippet)
        .unwrap_or_else(|| markup::insert_into_head(html, snippet))
}

fn named_meta(html: &str, name: &str) -> Vec<StartTag> {
    markup::meta_tags(html)
        .into_iter()
        .filter(|m| m.attr("name") == Some(name))
        .collect()
}

/// Remove tags, each with the newline that directly follows it.
fn remove_tags(html: &str, ranges: impl IntoIterator<Item = std::ops::Range<usize>>) -> String {
    let edits = ranges
        .into_iter()
        .map(|range| {
            let end = if html[range.end..].starts_with('\n') {
                range.end + 1
            } else {
                range.end
            };
            (range.start..end, String::new())
        })
        .collect();
    markup::splice(html, edits)
}

/// Ensure one viewport meta and a description.
///
/// Static pages with a configured description always end up with exactly
/// that description. Other pages get the default description only when
/// they have none.
pub fn inject_meta(html: &str, rel_path: &str, config: &SiteConfig) -> String {
    let viewports = named_meta(html, "viewport");
    let mut html = remove_tags(html, viewports.iter().skip(1).map(|m| m.range.clone()));
    if viewports.is_empty() {
        let tag = meta_element("name", "viewport", &config.seo.viewport);
        html = insert_at_head_start(&html, &tag);
    }

    let configured = config
        .static_page_by_output(rel_path)
        .and_then(|page| page.description.as_deref());
    let descriptions = named_meta(&html, "description");
    match configured {
        Some(wanted) => {
            let current = descriptions
                .iter()
                .map(|m| m.attr("content").map(markup::unescape_attr))
                .collect::<Vec<_>>();
            if current.len() != 1 || current[0].as_deref() != Some(wanted) {
                let stripped = remove_tags(&html, descriptions.iter().map(|m| m.range.clone()));
                html = insert_at_head_start(&stripped, &meta_element("name", "description", wanted));
            }
        }
        None if descriptions.is_empty() => {
            let tag = meta_element("name", "description", &config.default_description);
            html = insert_at_head_start(&html, &tag);
        }
        None => {}
    }
    html
}

/// Add `og:title`, `og:description`, `og:image`, `og:url` and `og:type`
/// unless the page already has any `og:` meta.
pub fn inject_open_graph(html: &str, rel_path: &str, config: &SiteConfig) -> String {
    if markup::has_open_graph(html) {
        return html.to_string();
    }
    let doc = markup::parse(html);
    let title = markup::title_text(&doc).unwrap_or_else(|| config.site_name.clone());
    let description = markup::meta_name(&doc, "description")
        .unwrap_or_else(|| config.default_description.clone());
    let image = markup::first_content_image(&doc).unwrap_or_else(|| config.default_image.clone());

    let tags = [
        ("og:title", title),
        ("og:description", description),
        ("og:image", config.absolute_url(&image)),
        ("og:url", config.absolute_url(&page_url(rel_path))),
        ("og:type", config.seo.og_type.clone()),
    ]
    .iter()
    .map(|(key, value)| meta_element("property", key, value))
    .collect::<Vec<_>>()
    .join("\n");
    markup::insert_into_head(html, &tags)
}

/// Insert `<schema_dir>/schema-<path>.json` as a JSON-LD block, once.
///
/// Missing files are normal (most pages have none). Unparseable files and
/// files holding a `BreadcrumbList` are logged and ignored; breadcrumbs come
/// from [`inject_breadcrumb`].
pub fn inject_schema(html: &str, rel_path: &str, root: &Path, config: &SiteConfig) -> String {
    if html.contains(&format!("id=\"{PAGE_SCHEMA_ID}\"")) {
        return html.to_string();
    }
    let path = root
        .join(&config.layout.schema_dir)
        .join(schema_file_name(rel_path));
    let Ok(raw) = fs::read_to_string(&path) else {
        return html.to_string();
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring invalid schema {}: {}", path.display(), e);
            return html.to_string();
        }
    };
    if value.get("@type").and_then(Value::as_str) == Some("BreadcrumbList") {
        warn!("Ignoring breadcrumb schema {}", path.display());
        return html.to_string();
    }
    match markup::ld_json_script(&value, Some(PAGE_SCHEMA_ID)) {
        Ok(script) => markup::insert_into_head(html, &script),
        Err(e) => {
            warn!("Failed to serialize schema {}: {}", path.display(), e);
            html.to_string()
        }
    }
}

/// Breadcrumb trail `(name, absolute url)` for a page.
///
/// Starts at the home page. Directory segments are named after their
/// category (or collection page) title and link to the directory;
/// `index.html` adds no entry. The final file is named after its static
/// page label, else `title`, else its file stem.
pub fn breadcrumb_trail(rel_path: &str, title: Option<&str>, config: &SiteConfig) -> Vec<(String, String)> {
    let mut trail = vec![(config.seo.home_label.clone(), config.absolute_url("/"))];
    let parts: Vec<&str> = rel_path.split('/').filter(|p| !p.is_empty()).collect();

    for (i, segment) in parts.iter().enumerate() {
        if *segment == "index.html" {
            continue;
        }
        let path = parts[..=i].join("/");
        let is_file = i == parts.len() - 1 && segment.ends_with(".html");
        if is_file {
            let label = (i == 0)
                .then(|| config.static_page_by_output(segment))
                .flatten()
                .map(|page| page.label.clone());
            let name = label
                .or_else(|| title.map(str::to_string))
                .unwrap_or_else(|| segment.trim_end_matches(".html").to_string());
            trail.push((name, config.absolute_url(&path)));
        } else {
            let name = directory_title(segment, config).unwrap_or_else(|| segment.to_string());
            trail.push((name, config.absolute_url(&format!("{path}/"))));
        }
    }
    trail
}

fn directory_title(dir: &str, config: &SiteConfig) -> Option<String> {
    if let Some(category) = config.category(dir) {
        return Some(category.title.clone());
    }
    let indexes = &config.indexes;
    if dir == indexes.category_dir {
        Some(indexes.category_title.clone())
    } else if dir == indexes.tag_dir {
        Some(indexes.tag_title.clone())
    } else {
        None
    }
}

/// schema.org `BreadcrumbList` for a trail.
pub fn breadcrumb_schema(trail: &[(String, String)]) -> Value {
    let items: Vec<Value> = trail
        .iter()
        .enumerate()
        .map(|(i, (name, url))| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": name,
                "item": url,
            })
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

/// Leave exactly one `BreadcrumbList` block, computed from the path.
pub fn inject_breadcrumb(html: &str, rel_path: &str, config: &SiteConfig) -> String {
    let doc = markup::parse(html);
    let title = markup::title_text(&doc);
    let trail = breadcrumb_trail(rel_path, title.as_deref(), config);
    let script = match markup::ld_json_script(&breadcrumb_schema(&trail), None) {
        Ok(script) => script,
        Err(e) => {
            warn!("Failed to serialize breadcrumb for {}: {}", rel_path, e);
            return html.to_string();
        }
    };

    let existing: Vec<_> = markup::ld_json_blocks(html)
        .into_iter()
        .filter(|(_, block)| markup::is_breadcrumb_block(block))
        .collect();
    if let [(_, block)] = existing.as_slice() {
        if *block == script {
            return html.to_string();
        }
    }
    let stripped = remove_tags(html, existing.into_iter().map(|(range, _)| range));
    markup::insert_into_head(&stripped, &script)
}

/// All four injectors, in order.
pub fn process_page(html: &str, rel_path: &str, root: &Path, config: &SiteConfig) -> String {
    let html = inject_meta(html, rel_path, config);
    let html = inject_open_graph(&html, rel_path, config);
    let html = inject_schema(&html, rel_path, root, config);
    inject_breadcrumb(&html, rel_path, config)
}

/// Run the SEO pass over the whole site.
pub fn run_all(root: &Path, config: &SiteConfig) -> Result<SeoReport, SeoError> {
    if !root.is_dir() {
        return Err(SeoError::MissingRoot(root.to_path_buf()));
    }
    let mut report = SeoReport::default();
    for path in html_files(root, config) {
        let rel_path = relative_path(root, &path);
        let html = match fs::read_to_string(&path) {
            Ok(html) => html,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.skipped += 1;
                continue;
            }
        };
        let updated = process_page(&html, &rel_path, root, config);
        if updated == html {
            debug!(page = %rel_path, "seo unchanged");
            report.unchanged += 1;
            continue;
        }
        match fs::write(&path, updated) {
            Ok(()) => {
                info!("SEO: /{}", rel_path);
                report.updated.push(path);
            }
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}
