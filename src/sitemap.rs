//! `sitemap.xml` and `robots.txt`.
//!
//! The sitemap is built from what exists on disk after the other phases:
//!
//! | Entry | Priority | Change freq | Image |
//! |---|---|---|---|
//! | home page (`index.html`) | 1.0 | daily | |
//! | other static pages | 0.8 | weekly | |
//! | `danh-muc.html` | 0.9 | weekly | |
//! | `<dir>/` category index | 0.9 | weekly | configured per category |
//! | `<dir>/<article>.html` | 0.8 | weekly | first content image |
//!
//! `lastmod` is the file's modification date (UTC, `YYYY-MM-DD`).

use crate::config::{SitemapImage, SiteConfig};
use crate::harvest::{self, HarvestError};
use crate::markup;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),
}

const SITEMAP_FILE: &str = "sitemap.xml";
const ROBOTS_FILE: &str = "robots.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeFreq::Daily => write!(f, "daily"),
            ChangeFreq::Weekly => write!(f, "weekly"),
        }
    }
}

/// One `<url>` of the sitemap. All URLs are absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
    pub image: Option<SitemapImage>,
}

#[derive(Debug, Default)]
pub struct SitemapReport {
    pub entries: usize,
    pub written: Vec<PathBuf>,
}

/// Modification date of a file as `YYYY-MM-DD` (UTC).
pub fn lastmod(path: &Path) -> std::io::Result<String> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified).format("%Y-%m-%d").to_string())
}

/// Collects entries for files that exist, logging the ones it cannot stat.
struct Collector<'a> {
    config: &'a SiteConfig,
    entries: Vec<SitemapEntry>,
}

impl Collector<'_> {
    fn push(
        &mut self,
        path: &Path,
        url: &str,
        changefreq: ChangeFreq,
        priority: f32,
        image: Option<SitemapImage>,
    ) {
        if !path.is_file() {
            return;
        }
        match lastmod(path) {
            Ok(lastmod) => self.entries.push(SitemapEntry {
                loc: self.config.absolute_url(url),
                lastmod,
                changefreq,
                priority,
                image,
            }),
            Err(e) => warn!("Leaving {} out of the sitemap: {}", path.display(), e),
        }
    }
}

/// Sitemap entries for every listed file present under `root`.
pub fn collect_entries(root: &Path, config: &SiteConfig) -> Result<Vec<SitemapEntry>, SitemapError> {
    let mut collector = Collector {
        config,
        entries: Vec::new(),
    };

    for page in &config.static_pages {
        let (url, changefreq, priority) = if page.output == "index.html" {
            ("/".to_string(), ChangeFreq::Daily, 1.0)
        } else {
            (format!("/{}", page.output), ChangeFreq::Weekly, 0.8)
        };
        collector.push(&root.join(&page.output), &url, changefreq, priority, None);
    }

    let main = &config.indexes.main_file;
    collector.push(&root.join(main), &format!("/{main}"), ChangeFreq::Weekly, 0.9, None);

    for category in &config.categories {
        let image = category.sitemap_image.as_ref().map(|image| SitemapImage {
            loc: config.absolute_url(&image.loc),
            title: image.title.clone(),
        });
        collector.push(
            &root.join(&category.dir).join("index.html"),
            &format!("/{}/", category.dir),
            ChangeFreq::Weekly,
            0.9,
            image,
        );
    }

    for category in &config.categories {
        let dir = root.join(&category.dir);
        if !dir.is_dir() {
            continue;
        }
        for path in harvest::list_html_files(&dir)? {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name == "index.html" {
                continue;
            }
            let image = article_image(&path, config);
            collector.push(
                &path,
                &format!("/{}/{}", category.dir, file_name),
                ChangeFreq::Weekly,
                0.8,
                Some(image),
            );
        }
    }

    let excluded = &config.sitemap.excluded;
    let mut entries = collector.entries;
    entries.retain(|entry| !excluded.iter().any(|name| entry.loc.contains(name.as_str())));
    Ok(entries)
}

fn article_image(path: &Path, config: &SiteConfig) -> SitemapImage {
    let src = fs::read_to_string(path)
        .ok()
        .and_then(|raw| markup::first_content_image(&markup::parse(&raw)))
        .unwrap_or_else(|| config.default_image.clone());
    SitemapImage {
        loc: config.absolute_url(&src),
        title: config.sitemap.article_image_title.clone(),
    }
}

/// Escape text for XML element content.
pub fn xml_escape(text: &str) -> String {
    markup::escape_text(text)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render the sitemap document.
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" xmlns:image=\"http://www.google.com/schemas/sitemap-image/1.1\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&entry.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        if let Some(image) = &entry.image {
            xml.push_str("    <image:image>\n");
            xml.push_str(&format!("      <image:loc>{}</image:loc>\n", xml_escape(&image.loc)));
            xml.push_str(&format!(
                "      <image:title>{}</image:title>\n",
                xml_escape(&image.title)
            ));
            xml.push_str("    </image:image>\n");
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Render `robots.txt`.
pub fn render_robots(config: &SiteConfig) -> String {
    let mut robots = String::from("User-agent: *\n");
    for path in &config.robots.disallow {
        robots.push_str(&format!("Disallow: {path}\n"));
    }
    for path in &config.robots.allow {
        robots.push_str(&format!("Allow: {path}\n"));
    }
    robots.push_str(&format!("\nSitemap: {}/{SITEMAP_FILE}\n", config.base_url));
    robots
}

pub fn write_sitemap(root: &Path, entries: &[SitemapEntry]) -> Result<PathBuf, SitemapError> {
    let path = root.join(SITEMAP_FILE);
    fs::write(&path, render_sitemap(entries))?;
    info!("Sitemap: {} URLs", entries.len());
    Ok(path)
}

pub fn write_robots(root: &Path, config: &SiteConfig) -> Result<PathBuf, SitemapError> {
    let path = root.join(ROBOTS_FILE);
    fs::write(&path, render_robots(config))?;
    info!("Robots: /{}", ROBOTS_FILE);
    Ok(path)
}

/// Collect, then write both files.
pub fn generate(root: &Path, config: &SiteConfig) -> Result<SitemapReport, SitemapError> {
    let entries = collect_entries(root, config)?;
    let written = vec![write_sitemap(root, &entries)?, write_robots(root, config)?];
    Ok(SitemapReport {
        entries: entries.len(),
        written,
    })
}
