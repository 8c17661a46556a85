//! Phase orchestration.
//!
//! A full build runs five phases in a fixed order, each reading what the
//! previous ones wrote:
//!
//! ```text
//! 1. Articles   pages/*.html         →  <category>/<file>.html
//! 2. Indexes    built articles       →  <category>/index.html, category/, tags/, danh-muc.html
//! 3. Static     pages/<static>.html  →  index.html, gioi-thieu.html, ...
//! 4. SEO        every built page     →  same files, metadata injected
//! 5. Sitemap    files on disk        →  sitemap.xml, robots.txt
//! ```
//!
//! Phases 1 and 3 encode images and take the backend as a parameter; the CLI
//! wraps a [`RustBackend`] in a [`CachedBackend`] via [`with_cache`].

use crate::assemble::{self, AssembleError, AssembleReport};
use crate::cache::{CacheManifest, CacheStats, CachedBackend};
use crate::config::{ConfigError, SiteConfig};
use crate::harvest::{self, HarvestError};
use crate::imaging::{ImageBackend, RustBackend};
use crate::index::{self, IndexError};
use crate::pictures::PictureStats;
use crate::seo::{self, SeoError};
use crate::sitemap::{self, SitemapError};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Assembly error: {0}")]
    Assemble(#[from] AssembleError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("SEO error: {0}")]
    Seo(#[from] SeoError),
    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Articles,
    Indexes,
    StaticPages,
    Seo,
    Sitemap,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Articles => "Articles",
            Phase::Indexes => "Indexes",
            Phase::StaticPages => "Static pages",
            Phase::Seo => "SEO",
            Phase::Sitemap => "Sitemap",
        };
        write!(f, "{name}")
    }
}

/// What one phase did.
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    pub written: Vec<PathBuf>,
    /// Inputs that produced no output; each was logged.
    pub skipped: usize,
    /// Files examined but left as they were (SEO pass).
    pub unchanged: usize,
    pub pictures: PictureStats,
}

impl PhaseReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            written: Vec::new(),
            skipped: 0,
            unchanged: 0,
            pictures: PictureStats::default(),
        }
    }

    fn from_assembly(phase: Phase, report: AssembleReport) -> Self {
        Self {
            written: report.written,
            skipped: report.skipped,
            pictures: report.pictures,
            ..Self::new(phase)
        }
    }
}

pub fn articles_phase<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<PhaseReport, PipelineError> {
    info!("Building articles");
    let report = assemble::build_articles(root, config, backend)?;
    Ok(PhaseReport::from_assembly(Phase::Articles, report))
}

pub fn static_phase<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<PhaseReport, PipelineError> {
    info!("Building static pages");
    let report = assemble::build_static_pages(root, config, backend)?;
    Ok(PhaseReport::from_assembly(Phase::StaticPages, report))
}

pub fn indexes_phase(root: &Path, config: &SiteConfig) -> Result<PhaseReport, PipelineError> {
    info!("Building index pages");
    let report = index::build_indexes(root, config)?;
    Ok(PhaseReport {
        written: report.written,
        skipped: report.skipped,
        ..PhaseReport::new(Phase::Indexes)
    })
}

pub fn seo_phase(root: &Path, config: &SiteConfig) -> Result<PhaseReport, PipelineError> {
    info!("Injecting SEO metadata");
    let report = seo::run_all(root, config)?;
    Ok(PhaseReport {
        written: report.updated,
        skipped: report.skipped,
        unchanged: report.unchanged,
        ..PhaseReport::new(Phase::Seo)
    })
}

pub fn sitemap_phase(root: &Path, config: &SiteConfig) -> Result<PhaseReport, PipelineError> {
    info!("Writing sitemap and robots.txt");
    let report = sitemap::generate(root, config)?;
    Ok(PhaseReport {
        written: report.written,
        ..PhaseReport::new(Phase::Sitemap)
    })
}

/// Articles, then their index pages, then the SEO pass.
pub fn run_articles<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<Vec<PhaseReport>, PipelineError> {
    Ok(vec![
        articles_phase(root, config, backend)?,
        indexes_phase(root, config)?,
        seo_phase(root, config)?,
    ])
}

/// Static pages, then the SEO pass.
pub fn run_static<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<Vec<PhaseReport>, PipelineError> {
    Ok(vec![
        static_phase(root, config, backend)?,
        seo_phase(root, config)?,
    ])
}

/// The full build: articles → indexes → static pages → SEO → sitemap.
pub fn build_all<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<Vec<PhaseReport>, PipelineError> {
    Ok(vec![
        articles_phase(root, config, backend)?,
        indexes_phase(root, config)?,
        static_phase(root, config, backend)?,
        seo_phase(root, config)?,
        sitemap_phase(root, config)?,
    ])
}

/// Run `f` with a cached [`RustBackend`], then persist the cache manifest.
///
/// With `use_cache` false the run starts from an empty manifest, so every
/// derivative is re-encoded; the fresh manifest is still saved.
pub fn with_cache<T>(
    root: &Path,
    use_cache: bool,
    f: impl FnOnce(&CachedBackend<'_, RustBackend>) -> Result<T, PipelineError>,
) -> Result<(T, CacheStats), PipelineError> {
    let inner = RustBackend::new();
    let manifest = if use_cache {
        CacheManifest::load(root)
    } else {
        CacheManifest::empty()
    };
    let backend = CachedBackend::new(&inner, root, manifest);
    let result = f(&backend)?;
    let (manifest, stats) = backend.into_parts();
    if let Err(e) = manifest.save(root) {
        warn!("Failed to save derivative cache: {}", e);
    }
    Ok((result, stats))
}

// ============================================================================
// Check
// ============================================================================

/// An article fragment as seen by `check`.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSummary {
    pub file_name: String,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Whether the category is in the configured list.
    pub known_category: bool,
}

/// Read-only inventory of a site root.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub articles: Vec<FragmentSummary>,
    /// `(source, output, source present)` per configured static page.
    pub static_pages: Vec<(String, String, bool)>,
    /// `(dir, title, article count)` per configured category.
    pub categories: Vec<(String, String, usize)>,
    pub partials_present: bool,
}

/// Validate the layout without writing anything.
pub fn check(root: &Path, config: &SiteConfig) -> Result<CheckReport, PipelineError> {
    config.validate()?;
    let fragments = harvest::load_article_fragments(root, config)?;
    let articles: Vec<FragmentSummary> = fragments
        .into_iter()
        .map(|f| FragmentSummary {
            known_category: config.category(&f.meta.category).is_some(),
            file_name: f.file_name,
            title: f.meta.title,
            category: f.meta.category,
            tags: f.meta.tags,
        })
        .collect();

    let pages_dir = root.join(&config.layout.pages_dir);
    let static_pages = config
        .static_pages
        .iter()
        .map(|p| {
            (
                p.source.clone(),
                p.output.clone(),
                pages_dir.join(&p.source).is_file(),
            )
        })
        .collect();

    let categories = config
        .categories
        .iter()
        .map(|c| {
            let count = articles.iter().filter(|a| a.category == c.dir).count();
            (c.dir.clone(), c.title.clone(), count)
        })
        .collect();

    Ok(CheckReport {
        articles,
        static_pages,
        categories,
        partials_present: assemble::load_partials(root, config).is_ok(),
    })
}
