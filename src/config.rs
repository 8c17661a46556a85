//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. Stock defaults
//! describe the production site; a `site.toml` in the site root overrides
//! just the keys it names.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── site.toml                # Optional overrides (sparse)
//! ├── pages/                   # Source fragments
//! ├── partials/                # header.html / footer.html
//! └── seo-tools/generated/     # Pre-generated JSON-LD schema files
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! base_url = "https://tuvanphongsach.com"
//! default_image = "/image/default.jpg"
//! default_description = "Tuvanphongsach.com - Giải pháp phòng sạch"
//!
//! [[categories]]
//! dir = "ahu"
//! title = "AHU - Phòng sạch"
//!
//! [images]
//! webp_quality = 50
//! avif_quality = 40
//! jpeg_quality = 70
//! ```
//!
//! Arrays (`categories`, `static_pages`, exclusion lists) are replaced as a
//! whole when overridden. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the optional override file in the site root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute origin used for canonical URLs, without trailing slash.
    pub base_url: String,
    /// Site-relative image used when a page has none.
    pub default_image: String,
    /// Description injected into pages that carry none.
    pub default_description: String,
    /// Site name, used as the Open Graph title fallback.
    pub site_name: String,
    /// Directory layout and document shell.
    pub layout: LayoutConfig,
    /// Hand-authored pages built to the site root.
    pub static_pages: Vec<StaticPageConfig>,
    /// Fixed list of site sections; each maps to an output directory.
    pub categories: Vec<CategoryConfig>,
    /// Derivative image policy.
    pub images: ImagesConfig,
    /// Index page locations and titles.
    pub indexes: IndexConfig,
    /// Related-articles block appended to articles.
    pub related: RelatedConfig,
    /// SEO injector settings.
    pub seo: SeoConfig,
    /// Sitemap settings.
    pub sitemap: SitemapConfig,
    /// robots.txt rules.
    pub robots: RobotsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tuvanphongsach.com".to_string(),
            default_image: "/image/default.jpg".to_string(),
            default_description: "Tuvanphongsach.com - Giải pháp phòng sạch".to_string(),
            site_name: "Tuvanphongsach.com".to_string(),
            layout: LayoutConfig::default(),
            static_pages: default_static_pages(),
            categories: default_categories(),
            images: ImagesConfig::default(),
            indexes: IndexConfig::default(),
            related: RelatedConfig::default(),
            seo: SeoConfig::default(),
            sitemap: SitemapConfig::default(),
            robots: RobotsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "base_url must start with http:// or https://".into(),
            ));
        }
        if self.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "base_url must not end with '/'".into(),
            ));
        }
        for (name, q) in [
            ("images.webp_quality", self.images.webp_quality),
            ("images.avif_quality", self.images.avif_quality),
            ("images.icon_quality", self.images.icon_quality),
            ("images.jpeg_quality", self.images.jpeg_quality),
        ] {
            if !(1..=100).contains(&q) {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        if !(self.images.small_scale > 0.0 && self.images.small_scale <= 1.0) {
            return Err(ConfigError::Validation(
                "images.small_scale must be in (0, 1]".into(),
            ));
        }
        if self.images.icon_small_size == 0 {
            return Err(ConfigError::Validation(
                "images.icon_small_size must be non-zero".into(),
            ));
        }
        for (name, b) in [
            ("card", self.images.bounds.card),
            ("about", self.images.bounds.about),
            ("intro", self.images.bounds.intro),
            ("default", self.images.bounds.default),
        ] {
            if b[0] == 0 || b[1] == 0 {
                return Err(ConfigError::Validation(format!(
                    "images.bounds.{name} values must be non-zero"
                )));
            }
        }

        if self.is_reserved_dir(&self.indexes.misc_category) {
            return Err(ConfigError::Validation(format!(
                "indexes.misc_category '{}' collides with a layout or index directory",
                self.indexes.misc_category
            )));
        }

        let mut dirs = HashSet::new();
        for cat in &self.categories {
            if !is_single_segment(&cat.dir) {
                return Err(ConfigError::Validation(format!(
                    "category dir '{}' must be a single path segment",
                    cat.dir
                )));
            }
            if self.is_reserved_dir(&cat.dir) {
                return Err(ConfigError::Validation(format!(
                    "category dir '{}' collides with a layout or index directory",
                    cat.dir
                )));
            }
            if !dirs.insert(cat.dir.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category dir '{}'",
                    cat.dir
                )));
            }
        }

        let mut outputs = HashSet::new();
        for page in &self.static_pages {
            if !is_single_segment(&page.source) || !is_single_segment(&page.output) {
                return Err(ConfigError::Validation(format!(
                    "static page '{}' must map between plain file names",
                    page.source
                )));
            }
            if !outputs.insert(page.output.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate static page output '{}'",
                    page.output
                )));
            }
        }
        Ok(())
    }

    /// Top-level directories the build reads from or generates into itself.
    /// Articles are never written into one of these.
    pub fn reserved_dirs(&self) -> Vec<&str> {
        let mut dirs = vec![
            top_segment(&self.layout.pages_dir),
            top_segment(&self.layout.partials_dir),
            top_segment(&self.layout.schema_dir),
            top_segment(&self.indexes.category_dir),
            top_segment(&self.indexes.tag_dir),
        ];
        dirs.extend(self.layout.exclude_dirs.iter().map(|d| top_segment(d)));
        dirs
    }

    pub fn is_reserved_dir(&self, name: &str) -> bool {
        self.reserved_dirs().contains(&name)
    }

    /// Look up a category by its directory name.
    pub fn category(&self, dir: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.dir == dir)
    }

    /// Look up a static page by its fragment file name (`home.html`).
    pub fn static_page_by_source(&self, source: &str) -> Option<&StaticPageConfig> {
        self.static_pages.iter().find(|p| p.source == source)
    }

    /// Look up a static page by its built file name (`index.html`).
    pub fn static_page_by_output(&self, output: &str) -> Option<&StaticPageConfig> {
        self.static_pages.iter().find(|p| p.output == output)
    }

    /// Whether a fragment in `pages/` is a static page rather than an article.
    pub fn is_static_source(&self, file_name: &str) -> bool {
        self.static_page_by_source(file_name).is_some()
    }

    /// Join a site-relative path onto the base URL.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if let Some(rest) = path.strip_prefix('/') {
            format!("{}/{}", self.base_url, rest)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// First segment of a root-relative path (`seo-tools/generated` → `seo-tools`).
fn top_segment(path: &str) -> &str {
    path.split(['/', '\\']).next().unwrap_or(path)
}

/// A non-empty name usable as exactly one path segment.
pub fn is_single_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// Directory layout and the shell shared by generated documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Source fragments, relative to the site root.
    pub pages_dir: String,
    /// Header/footer partials, relative to the site root.
    pub partials_dir: String,
    /// Pre-generated `schema-*.json` files, relative to the site root.
    pub schema_dir: String,
    /// Directories never walked by the SEO pass or the sitemap.
    pub exclude_dirs: Vec<String>,
    /// `lang` attribute of assembled static pages.
    pub lang: String,
    /// Stylesheets linked from assembled static pages.
    pub stylesheets: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pages_dir: "pages".to_string(),
            partials_dir: "partials".to_string(),
            schema_dir: "seo-tools/generated".to_string(),
            exclude_dirs: [
                "pages",
                "partials",
                "seo-tools",
                "assets",
                "image",
                "node_modules",
                "target",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            lang: "vi".to_string(),
            stylesheets: vec![
                "/style.css".to_string(),
                "/assets/bootstrap/bootstrap.min.css".to_string(),
            ],
        }
    }
}

/// A hand-authored page built to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticPageConfig {
    /// Fragment file name inside `pages/`.
    pub source: String,
    /// Output file name in the site root.
    pub output: String,
    /// Breadcrumb label.
    pub label: String,
    /// Meta description; replaces whatever the page carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_static_pages() -> Vec<StaticPageConfig> {
    let page = |source: &str, output: &str, label: &str, description: &str| StaticPageConfig {
        source: source.to_string(),
        output: output.to_string(),
        label: label.to_string(),
        description: Some(description.to_string()),
    };
    vec![
        page(
            "home.html",
            "index.html",
            "Trang chủ",
            "Tư vấn phòng sạch đạt chuẩn GMP, ISO. Thiết kế, thi công, bảo trì trọn gói bởi Tuvanphongsach.com - hơn 15 năm kinh nghiệm.",
        ),
        page(
            "gioi-thieu.html",
            "gioi-thieu.html",
            "Giới thiệu",
            "Tuvanphongsach.com - Chuyên gia tư vấn phòng sạch với 15+ năm kinh nghiệm. Đội ngũ kỹ sư tận tâm, giải pháp tối ưu cho doanh nghiệp.",
        ),
        page(
            "lien-he.html",
            "lien-he.html",
            "Liên hệ",
            "Liên hệ Tuvanphongsach.com để được tư vấn phòng sạch miễn phí. Hỗ trợ thiết kế, thi công, bảo trì đạt chuẩn GMP, ISO.",
        ),
        page(
            "dich-vu.html",
            "dich-vu.html",
            "Dịch vụ",
            "Dịch vụ phòng sạch trọn gói: tư vấn, thiết kế, thi công, bảo trì đạt chuẩn GMP, ISO. Giải pháp tối ưu từ Tuvanphongsach.com.",
        ),
    ]
}

/// One site section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// Output directory, also the value of `<meta name="category">`.
    pub dir: String,
    /// Display title.
    pub title: String,
    /// Image advertised for the category index in the sitemap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap_image: Option<SitemapImage>,
}

/// An `<image:image>` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitemapImage {
    /// Site-relative or absolute image URL.
    pub loc: String,
    pub title: String,
}

fn default_categories() -> Vec<CategoryConfig> {
    let cat = |dir: &str, title: &str| CategoryConfig {
        dir: dir.to_string(),
        title: title.to_string(),
        sitemap_image: None,
    };
    let mut ahu = cat("ahu", "AHU - Phòng sạch");
    ahu.sitemap_image = Some(SitemapImage {
        loc: "/image/ahu/tu-van-phong-sach-small.webp".to_string(),
        title: "Hình ảnh AHU Phòng Sạch".to_string(),
    });
    vec![
        ahu,
        cat("fcu", "FCU - Thiết bị phòng sạch"),
        cat("chillers", "Chillers - Giải pháp làm lạnh"),
        cat("air-cooled", "Air Cooled - Hệ thống lạnh"),
        cat("tu-van-phong-sach", "Tư vấn phòng sạch"),
    ]
}

/// Derivative image policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub webp_quality: u32,
    pub avif_quality: u32,
    /// WebP/AVIF quality for icons (sources under `icon_marker`).
    pub icon_quality: u32,
    /// Quality of the optimized JPEG fallback.
    pub jpeg_quality: u32,
    /// Scale applied to the desktop bounds for the small variants.
    pub small_scale: f32,
    /// Bounding square for small icon variants.
    pub icon_small_size: u32,
    /// Media query selecting the small variants.
    pub small_media: String,
    /// Number of leading images marked `fetchpriority="high"`.
    pub eager_count: usize,
    /// Source path fragment identifying icons.
    pub icon_marker: String,
    /// Source path fragment identifying about-us imagery.
    pub about_marker: String,
    /// Ancestor class identifying service cards.
    pub card_class: String,
    /// Class kept on banner images.
    pub banner_class: String,
    /// Static page fragments that use the `intro` bounds.
    pub intro_pages: Vec<String>,
    pub bounds: ImageBounds,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            webp_quality: 50,
            avif_quality: 40,
            icon_quality: 80,
            jpeg_quality: 70,
            small_scale: 0.6,
            icon_small_size: 64,
            small_media: "(max-width: 768px)".to_string(),
            eager_count: 3,
            icon_marker: "icons/".to_string(),
            about_marker: "about-us".to_string(),
            card_class: "service-card".to_string(),
            banner_class: "banner-img".to_string(),
            intro_pages: vec!["gioi-thieu.html".to_string()],
            bounds: ImageBounds::default(),
        }
    }
}

/// Desktop bounding boxes `[width, height]` per image context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageBounds {
    pub card: [u32; 2],
    pub about: [u32; 2],
    pub intro: [u32; 2],
    pub default: [u32; 2],
}

impl Default for ImageBounds {
    fn default() -> Self {
        Self {
            card: [400, 225],
            about: [600, 400],
            intro: [800, 600],
            default: [1200, 800],
        }
    }
}

/// Index page locations and titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Directory of the all-categories collection page.
    pub category_dir: String,
    pub category_title: String,
    /// Directory of the tags collection page.
    pub tag_dir: String,
    pub tag_title: String,
    /// Root-level category-of-categories page.
    pub main_file: String,
    pub main_title: String,
    /// Category used for fragments without `<meta name="category">`.
    pub misc_category: String,
    /// Card description used when an article has neither meta nor paragraph.
    pub fallback_description: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            category_dir: "category".to_string(),
            category_title: "Danh mục bài viết".to_string(),
            tag_dir: "tags".to_string(),
            tag_title: "Thẻ bài viết".to_string(),
            main_file: "danh-muc.html".to_string(),
            main_title: "Danh mục bài viết".to_string(),
            misc_category: "misc".to_string(),
            fallback_description: "Bài viết phòng sạch".to_string(),
        }
    }
}

/// Related-articles block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelatedConfig {
    pub enabled: bool,
    /// Maximum number of related articles listed.
    pub limit: usize,
    pub heading: String,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 3,
            heading: "Bài viết liên quan".to_string(),
        }
    }
}

/// SEO injector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeoConfig {
    /// First breadcrumb entry.
    pub home_label: String,
    pub og_type: String,
    pub viewport: String,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            home_label: "Trang chủ".to_string(),
            og_type: "website".to_string(),
            viewport: "width=device-width, initial-scale=1.0".to_string(),
        }
    }
}

/// Sitemap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    /// File names never listed.
    pub excluded: Vec<String>,
    /// `<image:title>` used for article images.
    pub article_image_title: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            excluded: vec!["asdfghjklpoiuytrewq.html".to_string()],
            article_image_title: "Hình ảnh bài viết phòng sạch".to_string(),
        }
    }
}

/// robots.txt rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotsConfig {
    pub disallow: Vec<String>,
    pub allow: Vec<String>,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            disallow: vec!["/assets/".to_string(), "/image/".to_string()],
            allow: vec!["/".to_string()],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a site root: stock defaults overlaid with `site.toml`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# phongsach-build configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Arrays ([[categories]], [[static_pages]], lists) replace the defaults
# as a whole. Unknown keys cause an error.

base_url = "https://tuvanphongsach.com"
default_image = "/image/default.jpg"
default_description = "Tuvanphongsach.com - Giải pháp phòng sạch"
site_name = "Tuvanphongsach.com"

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
pages_dir = "pages"
partials_dir = "partials"
schema_dir = "seo-tools/generated"
# Never walked by the SEO pass or listed in the sitemap.
exclude_dirs = ["pages", "partials", "seo-tools", "assets", "image", "node_modules", "target"]
lang = "vi"
stylesheets = ["/style.css", "/assets/bootstrap/bootstrap.min.css"]

# ---------------------------------------------------------------------------
# Derivative images
# ---------------------------------------------------------------------------
[images]
webp_quality = 50
avif_quality = 40
icon_quality = 80
jpeg_quality = 70
# Small (mobile) variants are the desktop bounds scaled by this factor.
small_scale = 0.6
icon_small_size = 64
small_media = "(max-width: 768px)"
# Leading images marked fetchpriority="high".
eager_count = 3
icon_marker = "icons/"
about_marker = "about-us"
card_class = "service-card"
banner_class = "banner-img"
intro_pages = ["gioi-thieu.html"]

# Desktop bounding boxes [width, height]; images are never enlarged.
[images.bounds]
card = [400, 225]
about = [600, 400]
intro = [800, 600]
default = [1200, 800]

# ---------------------------------------------------------------------------
# Index pages
# ---------------------------------------------------------------------------
[indexes]
category_dir = "category"
category_title = "Danh mục bài viết"
tag_dir = "tags"
tag_title = "Thẻ bài viết"
main_file = "danh-muc.html"
main_title = "Danh mục bài viết"
misc_category = "misc"
fallback_description = "Bài viết phòng sạch"

[related]
enabled = true
limit = 3
heading = "Bài viết liên quan"

[seo]
home_label = "Trang chủ"
og_type = "website"
viewport = "width=device-width, initial-scale=1.0"

[sitemap]
excluded = ["asdfghjklpoiuytrewq.html"]
article_image_title = "Hình ảnh bài viết phòng sạch"

[robots]
disallow = ["/assets/", "/image/"]
allow = ["/"]

# ---------------------------------------------------------------------------
# Static pages (pages/<source> -> <output> in the site root)
# ---------------------------------------------------------------------------
[[static_pages]]
source = "home.html"
output = "index.html"
label = "Trang chủ"
description = "Tư vấn phòng sạch đạt chuẩn GMP, ISO. Thiết kế, thi công, bảo trì trọn gói bởi Tuvanphongsach.com - hơn 15 năm kinh nghiệm."

[[static_pages]]
source = "gioi-thieu.html"
output = "gioi-thieu.html"
label = "Giới thiệu"
description = "Tuvanphongsach.com - Chuyên gia tư vấn phòng sạch với 15+ năm kinh nghiệm. Đội ngũ kỹ sư tận tâm, giải pháp tối ưu cho doanh nghiệp."

[[static_pages]]
source = "lien-he.html"
output = "lien-he.html"
label = "Liên hệ"
description = "Liên hệ Tuvanphongsach.com để được tư vấn phòng sạch miễn phí. Hỗ trợ thiết kế, thi công, bảo trì đạt chuẩn GMP, ISO."

[[static_pages]]
source = "dich-vu.html"
output = "dich-vu.html"
label = "Dịch vụ"
description = "Dịch vụ phòng sạch trọn gói: tư vấn, thiết kế, thi công, bảo trì đạt chuẩn GMP, ISO. Giải pháp tối ưu từ Tuvanphongsach.com."

# ---------------------------------------------------------------------------
# Categories (<meta name="category" content="<dir>"> -> /<dir>/)
# ---------------------------------------------------------------------------
[[categories]]
dir = "ahu"
title = "AHU - Phòng sạch"
sitemap_image = { loc = "/image/ahu/tu-van-phong-sach-small.webp", title = "Hình ảnh AHU Phòng Sạch" }

[[categories]]
dir = "fcu"
title = "FCU - Thiết bị phòng sạch"

[[categories]]
dir = "chillers"
title = "Chillers - Giải pháp làm lạnh"

[[categories]]
dir = "air-cooled"
title = "Air Cooled - Hệ thống lạnh"

[[categories]]
dir = "tu-van-phong-sach"
title = "Tư vấn phòng sạch"
"##
}
