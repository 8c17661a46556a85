//! `<img>` → `<picture>` rewriting.
//!
//! Runs on every assembled page before it is written. Each local JPEG/PNG
//! `<img>` gets its derivatives generated (see [`crate::imaging`]) and is
//! replaced by:
//!
//! ```html
//! <picture>
//!   <source media="(max-width: 768px)" srcset="/image/a-small.avif" type="image/avif">
//!   <source media="(max-width: 768px)" srcset="/image/a-small.webp" type="image/webp">
//!   <source srcset="/image/a.avif" type="image/avif">
//!   <source srcset="/image/a.webp" type="image/webp">
//!   <img src="/image/a-opt.jpg" alt="…" class="img-fluid" width="1200" height="800"
//!        loading="lazy" fetchpriority="high">
//! </picture>
//! ```
//!
//! The desktop bounding box depends on where the image sits:
//!
//! | Context | Rule | Bounds |
//! |---|---|---|
//! | Icon | source path contains `icons/` | original size, small fits 64×64 |
//! | Card | inside a `.service-card` | 400×225 |
//! | About | source path contains `about-us` | 600×400 |
//! | Intro | page is an intro page (`gioi-thieu.html`) | 800×600 |
//! | Default | anything else | 1200×800 |
//!
//! Images that cannot be converted keep their original tag.

use crate::config::ImagesConfig;
use crate::imaging::{
    self, DerivativeConfig, DerivativeSet, ImageBackend, OutputFormat, Quality, SizePolicy,
    create_background_variant, create_derivatives,
};
use crate::markup::{self, StartTag};
use maud::html;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;{}"]*?url\(\s*['"]?([^'")\s]+)"#)
        .expect("valid regex")
});

/// Where an image sits, which decides its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageContext {
    Icon,
    Card,
    About,
    Intro,
    Default,
}

/// Classify an image. Rules are checked in table order.
pub fn classify(src: &str, in_card: bool, page: &str, config: &ImagesConfig) -> ImageContext {
    if src.contains(&config.icon_marker) {
        ImageContext::Icon
    } else if in_card {
        ImageContext::Card
    } else if src.contains(&config.about_marker) {
        ImageContext::About
    } else if config.intro_pages.iter().any(|p| p == page) {
        ImageContext::Intro
    } else {
        ImageContext::Default
    }
}

/// Derivative settings for an image context.
pub fn derivative_config(context: ImageContext, config: &ImagesConfig) -> DerivativeConfig {
    let bounded = |[w, h]: [u32; 2]| SizePolicy::Bounded {
        bounds: (w, h),
        small_scale: config.small_scale,
    };
    let policy = match context {
        ImageContext::Icon => SizePolicy::Icon {
            small_size: config.icon_small_size,
        },
        ImageContext::Card => bounded(config.bounds.card),
        ImageContext::About => bounded(config.bounds.about),
        ImageContext::Intro => bounded(config.bounds.intro),
        ImageContext::Default => bounded(config.bounds.default),
    };
    let (webp, avif) = match context {
        ImageContext::Icon => (config.icon_quality, config.icon_quality),
        _ => (config.webp_quality, config.avif_quality),
    };
    DerivativeConfig {
        policy,
        webp_quality: Quality::new(webp),
        avif_quality: Quality::new(avif),
        jpeg_quality: Quality::new(config.jpeg_quality),
    }
}

/// Map an `src`/`url()` value to a file under `root`.
///
/// `None` for external, protocol-relative, `data:` and empty URLs. Query
/// strings and fragments are dropped.
pub fn resolve_source(root: &Path, src: &str) -> Option<PathBuf> {
    let src = src.trim();
    let lower = src.to_ascii_lowercase();
    if lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("//")
        || lower.starts_with("data:")
    {
        return None;
    }
    let path = src.split(['?', '#']).next().unwrap_or_default();
    let relative = path.trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|seg| seg == "..") {
        return None;
    }
    Some(root.join(relative))
}

/// Site-relative URL of a file under `root`.
pub fn public_url(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    format!("/{}", relative.to_string_lossy().replace('\\', "/"))
}

/// Counts from one page rewrite.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PictureStats {
    pub converted: usize,
    /// Local images that could not be converted (missing, undecodable).
    pub failed: usize,
    pub backgrounds: usize,
}

impl PictureStats {
    pub fn add(&mut self, other: PictureStats) {
        self.converted += other.converted;
        self.failed += other.failed;
        self.backgrounds += other.backgrounds;
    }
}

/// Rewrites the images of assembled pages.
pub struct PictureRewriter<'a, B: ImageBackend> {
    backend: &'a B,
    root: &'a Path,
    config: &'a ImagesConfig,
}

impl<'a, B: ImageBackend> PictureRewriter<'a, B> {
    pub fn new(backend: &'a B, root: &'a Path, config: &'a ImagesConfig) -> Self {
        Self {
            backend,
            root,
            config,
        }
    }

    /// Local source file eligible for derivatives, or `None` to leave the
    /// reference alone. Missing files are logged.
    fn convertible_source(&self, src: &str) -> Option<PathBuf> {
        let lower = src.to_ascii_lowercase();
        let path_part = lower.split(['?', '#']).next().unwrap_or_default();
        if path_part.ends_with(".webp") || path_part.ends_with(".avif") {
            return None;
        }
        let source = resolve_source(self.root, src)?;
        if !imaging::is_supported_source(&source) {
            return None;
        }
        Some(source)
    }

    /// Replace every convertible `<img>` on `page` with a `<picture>`.
    ///
    /// `page` is the fragment file name, used for the intro-page rule.
    pub fn rewrite_images(&self, html: &str, page: &str) -> (String, PictureStats) {
        let doc = markup::parse(html);
        let card_sources: HashSet<String> =
            markup::image_sources_within_class(&doc, &self.config.card_class);

        let mut stats = PictureStats::default();
        let mut edits = Vec::new();
        for (index, tag) in markup::img_tags(html).into_iter().enumerate() {
            let Some(src) = tag.attr("src") else { continue };
            if markup::inside_picture(html, tag.range.start) {
                continue;
            }
            let Some(source) = self.convertible_source(src) else {
                continue;
            };
            if !source.is_file() {
                warn!("Image not found: {} (on {})", source.display(), page);
                stats.failed += 1;
                continue;
            }

            let in_card = card_sources.contains(src);
            let context = classify(src, in_card, page, self.config);
            let derivatives = derivative_config(context, self.config);
            match create_derivatives(self.backend, &source, &derivatives) {
                Ok(set) => {
                    debug!(src, ?context, "converted image");
                    let picture = self.render_picture(&tag, &set, in_card, index);
                    edits.push((tag.range.clone(), picture));
                    stats.converted += 1;
                }
                Err(e) => {
                    warn!("Failed to convert {}: {}", source.display(), e);
                    stats.failed += 1;
                }
            }
        }
        (markup::splice(html, edits), stats)
    }

    fn render_picture(&self, tag: &StartTag, set: &DerivativeSet, in_card: bool, index: usize) -> String {
        let url = |p: &Path| public_url(self.root, p);
        let alt = markup::unescape_attr(tag.attr("alt").unwrap_or_default());
        let class = if in_card {
            "card-img-top img-fluid".to_string()
        } else if tag.has_class(&self.config.banner_class) {
            format!("{} img-fluid", self.config.banner_class)
        } else {
            "img-fluid".to_string()
        };
        let priority = if index < self.config.eager_count {
            "high"
        } else {
            "auto"
        };
        let media = &self.config.small_media;
        let avif = OutputFormat::Avif.mime_type();
        let webp = OutputFormat::WebP.mime_type();

        html! {
            picture {
                source media=(media) srcset=(url(&set.paths.avif_small)) type=(avif);
                source media=(media) srcset=(url(&set.paths.webp_small)) type=(webp);
                source srcset=(url(&set.paths.avif)) type=(avif);
                source srcset=(url(&set.paths.webp)) type=(webp);
                img src=(url(&set.paths.jpeg)) alt=(alt) class=(class)
                    width=(set.width) height=(set.height)
                    loading="lazy" fetchpriority=(priority);
            }
        }
        .into_string()
    }

    /// Point inline `background-image: url(...)` sources at a WebP variant.
    pub fn rewrite_backgrounds(&self, html: &str) -> (String, PictureStats) {
        let mut stats = PictureStats::default();
        let mut edits = Vec::new();
        for caps in BACKGROUND_URL.captures_iter(html) {
            let Some(url_match) = caps.get(1) else { continue };
            let Some(source) = self.convertible_source(url_match.as_str()) else {
                continue;
            };
            if !source.is_file() {
                warn!("Background image not found: {}", source.display());
                stats.failed += 1;
                continue;
            }
            let bounds = (self.config.bounds.default[0], self.config.bounds.default[1]);
            let quality = Quality::new(self.config.webp_quality);
            match create_background_variant(self.backend, &source, bounds, quality) {
                Ok(webp) => {
                    edits.push((url_match.range(), public_url(self.root, &webp)));
                    stats.backgrounds += 1;
                }
                Err(e) => {
                    warn!("Failed to convert background {}: {}", source.display(), e);
                    stats.failed += 1;
                }
            }
        }
        (markup::splice(html, edits), stats)
    }
}
