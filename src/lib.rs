//! # Phongsach Build
//!
//! The build pipeline for tuvanphongsach.com, a static site about clean-room
//! and HVAC consulting. Hand-written HTML fragments in `pages/` are assembled
//! with shared partials into category directories, index pages are derived
//! from what was built, and every page gets its SEO metadata before the
//! sitemap is written from the files on disk.
//!
//! # Architecture: Five Phases
//!
//! ```text
//! 1. Articles   pages/*.html         →  <category>/<file>.html   (+ image derivatives)
//! 2. Indexes    built articles       →  <category>/index.html, category/, tags/, danh-muc.html
//! 3. Static     pages/<static>.html  →  index.html, gioi-thieu.html, ...
//! 4. SEO        every built page     →  meta, Open Graph, JSON-LD, breadcrumbs
//! 5. Sitemap    files on disk        →  sitemap.xml, robots.txt
//! ```
//!
//! Each phase reads the site root as the previous phase left it. There is no
//! intermediate manifest: the built HTML is the data. Index pages read
//! titles and images from built articles, and the sitemap lists only files
//! that exist.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading, stock defaults, merging and validation |
//! | [`types`] | Shared records: fragment metadata, article records, cards |
//! | [`markup`] | Textual HTML edits that leave untouched markup byte-identical |
//! | [`harvest`] | Reads fragments and built articles into records |
//! | [`imaging`] | Pure-Rust resize and encode (AVIF, WebP, JPEG, PNG) |
//! | [`cache`] | Content-addressed cache of image derivatives |
//! | [`pictures`] | `<img>` → `<picture>` rewriting and background images |
//! | [`assemble`] | Phase 1 and 3: articles and static pages |
//! | [`index`] | Phase 2: category, collection and main category pages |
//! | [`seo`] | Phase 4: idempotent metadata injection |
//! | [`sitemap`] | Phase 5: `sitemap.xml` and `robots.txt` |
//! | [`pipeline`] | Phase ordering, cache lifetime, read-only check |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Every Pass Is Idempotent
//!
//! The SEO pass runs after both the article and the static builds, and a
//! site root is rebuilt in place many times. Injection therefore checks
//! before it inserts: a page that already has its description, Open Graph
//! tags, schema block and breadcrumb is left byte-for-byte unchanged, and a
//! page carrying stale breadcrumbs ends up with exactly one.
//!
//! ## Text Edits Over DOM Round-Trips
//!
//! Pages are read with `scraper` but edited as text. Serializing a parsed
//! DOM would normalize the hand-written markup of every page on every run;
//! splicing at known offsets keeps diffs limited to what the build adds.
//!
//! ## Pure-Rust Imaging
//!
//! Derivatives are produced with the `image` crate alone, so the binary has
//! no system dependencies. Encoding is cached by content hash, which makes a
//! rebuild with unchanged images nearly free.

pub mod assemble;
pub mod cache;
pub mod config;
pub mod harvest;
pub mod imaging;
pub mod index;
pub mod markup;
pub mod output;
pub mod pictures;
pub mod pipeline;
pub mod seo;
pub mod sitemap;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
