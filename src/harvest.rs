//! Metadata harvesting.
//!
//! Two sources feed the rest of the pipeline:
//!
//! - **Fragments** in `pages/`: hand-written article bodies carrying
//!   `<meta name="category|description|tags">` and an `<h1>`. Read before
//!   assembly to decide where each article goes and which articles relate.
//! - **Built articles** in the category directories: read after assembly to
//!   produce the [`ArticleRecord`]s index pages are built from. Reading the
//!   built files (rather than the fragments) means index cards reflect the
//!   final markup, including rewritten `<picture>` fallbacks.

use crate::config::SiteConfig;
use crate::markup;
use crate::types::{ArticleRecord, Fragment, FragmentMeta};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Meta elements moved from a fragment body into the document head.
pub const MOVED_META: [&str; 3] = ["category", "description", "tags"];

/// Title used when a fragment has no `<h1>`.
pub const UNTITLED_ARTICLE: &str = "Untitled Article";

/// `*.html` files directly inside `dir`, sorted by file name.
pub fn list_html_files(dir: &Path) -> Result<Vec<PathBuf>, HarvestError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("html"))
        .collect();
    files.sort();
    Ok(files)
}

/// Fragments in `pages_dir`, sorted by file name.
pub fn list_fragments(pages_dir: &Path) -> Result<Vec<PathBuf>, HarvestError> {
    list_html_files(pages_dir)
}

/// Extract fragment metadata. `misc_category` is used when the fragment
/// declares none.
pub fn read_fragment(raw: &str, misc_category: &str) -> FragmentMeta {
    let doc = markup::parse(raw);

    let category = markup::meta_name(&doc, "category")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| misc_category.to_string());
    let description = markup::meta_name(&doc, "description")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let tags = markup::meta_name(&doc, "tags")
        .map(|t| markup::parse_tags(&t))
        .unwrap_or_default();
    let title = markup::h1_text(&doc).unwrap_or_else(|| UNTITLED_ARTICLE.to_string());

    let head_meta = markup::meta_tags(raw)
        .into_iter()
        .filter(|m| m.attr("name").is_some_and(|n| MOVED_META.contains(&n)))
        .map(|m| raw[m.range].to_string())
        .collect();

    FragmentMeta {
        title,
        category,
        description,
        tags,
        head_meta,
    }
}

/// Remove the meta elements that [`read_fragment`] collects for the head.
pub fn strip_moved_meta(raw: &str) -> String {
    MOVED_META
        .iter()
        .fold(raw.to_string(), |html, name| markup::remove_meta(&html, "name", name).0)
}

/// Load every article fragment (static pages excluded). Unreadable files
/// are logged and skipped.
pub fn load_article_fragments(
    root: &Path,
    config: &SiteConfig,
) -> Result<Vec<Fragment>, HarvestError> {
    let pages_dir = root.join(&config.layout.pages_dir);
    let mut fragments = Vec::new();
    for path in list_fragments(&pages_dir)? {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if config.is_static_source(file_name) {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let meta = read_fragment(&raw, &config.indexes.misc_category);
                debug!(file = file_name, category = %meta.category, "read fragment");
                fragments.push(Fragment {
                    file_name: file_name.to_string(),
                    raw,
                    meta,
                });
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(fragments)
}

/// Build the index record for one built article.
pub fn article_record(raw: &str, dir: &str, file_name: &str, config: &SiteConfig) -> ArticleRecord {
    let doc = markup::parse(raw);
    let category_title = config
        .category(dir)
        .map(|c| c.title.clone())
        .unwrap_or_else(|| dir.to_string());

    let title = markup::title_text(&doc).unwrap_or(category_title);
    let description = markup::meta_name(&doc, "description")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .or_else(|| markup::first_paragraph(&doc))
        .unwrap_or_else(|| config.indexes.fallback_description.clone());
    let image = markup::first_content_image(&doc)
        .or_else(|| markup::meta_property(&doc, "og:image"))
        .unwrap_or_else(|| config.default_image.clone());
    let tags = markup::meta_name(&doc, "tags")
        .map(|t| markup::parse_tags(&t))
        .unwrap_or_default();

    ArticleRecord {
        title,
        description,
        image,
        url: format!("/{dir}/{file_name}"),
        tags,
        category: dir.to_string(),
    }
}

/// Records for every built article in the configured category directories.
///
/// Category `index.html` files are not articles. Missing directories are
/// simply empty categories.
pub fn scan_articles(root: &Path, config: &SiteConfig) -> Result<Vec<ArticleRecord>, HarvestError> {
    let mut records = Vec::new();
    for category in &config.categories {
        let dir = root.join(&category.dir);
        if !dir.is_dir() {
            continue;
        }
        for path in list_html_files(&dir)? {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name == "index.html" {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(raw) => records.push(article_record(&raw, &category.dir, file_name, config)),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }
    Ok(records)
}

/// Records grouped by category directory.
pub fn group_by_category(records: &[ArticleRecord]) -> BTreeMap<String, Vec<ArticleRecord>> {
    let mut groups: BTreeMap<String, Vec<ArticleRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.category.clone())
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Records grouped by tag; an article appears under each of its tags.
pub fn group_by_tag(records: &[ArticleRecord]) -> BTreeMap<String, Vec<ArticleRecord>> {
    let mut groups: BTreeMap<String, Vec<ArticleRecord>> = BTreeMap::new();
    for record in records {
        for tag in &record.tags {
            groups.entry(tag.clone()).or_default().push(record.clone());
        }
    }
    groups
}
