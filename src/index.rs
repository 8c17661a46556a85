//! Index page builders.
//!
//! Run after the articles are assembled. They read the built article files
//! (see [`harvest::scan_articles`]), not the fragments.
//!
//! | Page | Content |
//! |---|---|
//! | `<dir>/index.html` | card grid of the articles in one category |
//! | `category/index.html` | every category as a section of post items |
//! | `tags/index.html` | every tag as a section of post items |
//! | `danh-muc.html` | card grid of the categories themselves |
//!
//! Every page is wrapped in the header/footer partials with its `<title>`
//! set. The two collection pages also carry a `CollectionPage` JSON-LD block
//! listing their items.

use crate::assemble::{self, AssembleError, Partials};
use crate::config::SiteConfig;
use crate::harvest::{self, HarvestError};
use crate::markup;
use crate::types::{ArticleRecord, Card};
use maud::{Markup, html};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Assembly error: {0}")]
    Assemble(#[from] AssembleError),
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct IndexReport {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
}

impl IndexReport {
    fn record(&mut self, path: PathBuf, result: std::io::Result<()>) {
        match result {
            Ok(()) => {
                info!("Index: {}", path.display());
                self.written.push(path);
            }
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                self.skipped += 1;
            }
        }
    }

    fn merge(&mut self, other: IndexReport) {
        self.written.extend(other.written);
        self.skipped += other.skipped;
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Bootstrap card grid: three columns on large screens.
pub fn render_card_grid(title: &str, cards: &[Card]) -> Markup {
    html! {
        section class="py-5" {
            div.container {
                h1 class="mb-4 text-center" { (title) }
                div.row {
                    @for card in cards {
                        div class="col-lg-4 col-md-6 mb-4" {
                            a href=(card.href) class="text-decoration-none text-dark" {
                                div class="card h-100" {
                                    img src=(card.image) class="card-img-top" alt=(card.title);
                                    div.card-body {
                                        h5.card-title { (card.title) }
                                        @if let Some(description) = &card.description {
                                            p.card-text { (description) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Sections of post items, one per group.
pub fn render_collection(title: &str, groups: &[(String, Vec<ArticleRecord>)]) -> Markup {
    html! {
        h1 { (title) }
        div.category-grid {
            @for (name, posts) in groups {
                section.category-block {
                    h2 { (name) }
                    div.post-list {
                        @for post in posts {
                            a href=(post.url) class="post-item" {
                                img src=(post.image) alt=(post.title);
                                h3 { (post.title) }
                                p { (post.description) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// `CollectionPage` JSON-LD: one `ItemList` per group, items positioned
/// from 1.
pub fn collection_schema(
    title: &str,
    groups: &[(String, Vec<ArticleRecord>)],
    config: &SiteConfig,
) -> Value {
    let lists: Vec<Value> = groups
        .iter()
        .map(|(name, posts)| {
            let items: Vec<Value> = posts
                .iter()
                .enumerate()
                .map(|(i, post)| {
                    json!({
                        "@type": "ListItem",
                        "position": i + 1,
                        "url": config.absolute_url(&post.url),
                        "name": post.title,
                    })
                })
                .collect();
            json!({
                "@type": "ItemList",
                "name": name,
                "itemListElement": items,
            })
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "CollectionPage",
        "name": title,
        "mainEntity": lists,
    })
}

/// Header with `title` set and `head` inserted before `</head>`, the
/// content, then the footer.
fn wrap_page(partials: &Partials, title: &str, head: Option<&str>, content: Markup) -> String {
    let header = markup::set_title(&partials.header, title);
    let header = match head {
        Some(snippet) => markup::insert_before_close(&header, "head", snippet).unwrap_or(header),
        None => header,
    };
    format!("{}\n{}\n{}", header, content.into_string(), partials.footer)
}

fn file_name_of(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

// ============================================================================
// Builders
// ============================================================================

/// `<dir>/index.html` for every configured category whose directory exists.
pub fn build_category_indexes(
    root: &Path,
    config: &SiteConfig,
    partials: &Partials,
    records: &[ArticleRecord],
) -> IndexReport {
    let groups = harvest::group_by_category(records);
    let mut report = IndexReport::default();

    for category in &config.categories {
        let dir = root.join(&category.dir);
        if !dir.is_dir() {
            continue;
        }
        let cards: Vec<Card> = groups
            .get(&category.dir)
            .map(|posts| {
                posts
                    .iter()
                    .map(|post| Card {
                        href: format!("./{}", file_name_of(&post.url)),
                        ..Card::from(post)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let page = wrap_page(
            partials,
            &category.title,
            None,
            render_card_grid(&category.title, &cards),
        );
        let path = dir.join("index.html");
        let result = fs::write(&path, page);
        report.record(path, result);
    }
    report
}

fn render_collection_page(
    partials: &Partials,
    title: &str,
    groups: &[(String, Vec<ArticleRecord>)],
    config: &SiteConfig,
) -> Result<String, IndexError> {
    let schema = markup::ld_json_script(&collection_schema(title, groups, config), None)?;
    let description = html! {
        meta name="description" content=(format!("Danh sách {}", title.to_lowercase()));
    };
    let head = format!("{}\n{}", description.into_string(), schema);
    Ok(wrap_page(
        partials,
        title,
        Some(&head),
        render_collection(title, groups),
    ))
}

/// `category/index.html` and `tags/index.html`.
///
/// Categories are listed in configuration order under their titles; tags
/// in sorted order.
pub fn build_collection_pages(
    root: &Path,
    config: &SiteConfig,
    partials: &Partials,
    records: &[ArticleRecord],
) -> Result<IndexReport, IndexError> {
    let mut by_category = harvest::group_by_category(records);
    let mut category_groups: Vec<(String, Vec<ArticleRecord>)> = config
        .categories
        .iter()
        .filter_map(|c| by_category.remove(&c.dir).map(|posts| (c.title.clone(), posts)))
        .collect();
    // Records from unconfigured categories keep their directory name.
    category_groups.extend(by_category);

    let tag_groups: Vec<(String, Vec<ArticleRecord>)> =
        harvest::group_by_tag(records).into_iter().collect();

    let indexes = &config.indexes;
    let pages: [(&str, &str, &[(String, Vec<ArticleRecord>)]); 2] = [
        (
            indexes.category_dir.as_str(),
            indexes.category_title.as_str(),
            category_groups.as_slice(),
        ),
        (
            indexes.tag_dir.as_str(),
            indexes.tag_title.as_str(),
            tag_groups.as_slice(),
        ),
    ];

    let mut report = IndexReport::default();
    for (dir, title, groups) in pages {
        let page = render_collection_page(partials, title, groups, config)?;
        let out_dir = root.join(dir);
        let path = out_dir.join("index.html");
        let result = fs::create_dir_all(&out_dir).and_then(|_| fs::write(&path, page));
        report.record(path, result);
    }
    Ok(report)
}

/// Card image for a category: first content image of its built index page,
/// else the site default.
pub fn category_image(root: &Path, dir: &str, config: &SiteConfig) -> String {
    fs::read_to_string(root.join(dir).join("index.html"))
        .ok()
        .and_then(|raw| {
            let doc = markup::parse(&raw);
            markup::meta_property(&doc, "og:image").or_else(|| markup::first_content_image(&doc))
        })
        .unwrap_or_else(|| config.default_image.clone())
}

/// `danh-muc.html`: one card per category whose directory exists.
pub fn build_main_category_page(
    root: &Path,
    config: &SiteConfig,
    partials: &Partials,
) -> IndexReport {
    let cards: Vec<Card> = config
        .categories
        .iter()
        .filter(|c| root.join(&c.dir).is_dir())
        .map(|c| Card {
            title: c.title.clone(),
            description: None,
            image: category_image(root, &c.dir, config),
            href: format!("/{}/", c.dir),
        })
        .collect();

    let title = &config.indexes.main_title;
    let page = wrap_page(partials, title, None, render_card_grid(title, &cards));
    let path = root.join(&config.indexes.main_file);
    let mut report = IndexReport::default();
    let result = fs::write(&path, page);
    report.record(path, result);
    report
}

/// All index pages. Category indexes are built before `danh-muc.html`,
/// which reads them.
pub fn build_indexes(root: &Path, config: &SiteConfig) -> Result<IndexReport, IndexError> {
    let partials = assemble::load_partials(root, config)?;
    let records = harvest::scan_articles(root, config)?;
    let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
    info!(
        "Found {} built articles in {} categories",
        records.len(),
        categories.len()
    );

    let mut report = build_category_indexes(root, config, &partials, &records);
    report.merge(build_collection_pages(root, config, &partials, &records)?);
    report.merge(build_main_category_page(root, config, &partials));
    Ok(report)
}
