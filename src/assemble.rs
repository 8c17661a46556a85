//! Page assembly.
//!
//! Turns fragments from `pages/` into complete documents:
//!
//! - **Articles** (every fragment that is not a configured static page):
//!   `header + <main class="article-content">…</main> + footer`, written to
//!   `<root>/<category>/<file>`. The header partial is copied per article,
//!   its `<title>` set from the article's `<h1>`, and the fragment's
//!   `category`/`description`/`tags` meta moved into its `<head>`.
//! - **Static pages** (`home.html` → `index.html`, …): a fresh document
//!   shell with the configured stylesheets, the fragment's inline `<style>`,
//!   and the body parts of both partials around the fragment body.
//!
//! Both kinds go through [`PictureRewriter`] before they are written.

use crate::config::{self, SiteConfig};
use crate::harvest::{self, HarvestError};
use crate::imaging::ImageBackend;
use crate::markup;
use crate::pictures::{PictureRewriter, PictureStats};
use crate::types::Fragment;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing partial: {0}")]
    MissingPartial(PathBuf),
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),
}

/// Title used when a static page has no `<h1>`.
const UNTITLED_PAGE: &str = "Untitled";

/// Header and footer partials, shared by every generated page.
#[derive(Debug, Clone)]
pub struct Partials {
    pub header: String,
    pub footer: String,
}

/// Load `header.html` and `footer.html`. Either one missing is fatal.
pub fn load_partials(root: &Path, config: &SiteConfig) -> Result<Partials, AssembleError> {
    let dir = root.join(&config.layout.partials_dir);
    let read = |name: &str| {
        let path = dir.join(name);
        if !path.is_file() {
            return Err(AssembleError::MissingPartial(path));
        }
        Ok(fs::read_to_string(&path)?)
    };
    Ok(Partials {
        header: read("header.html")?,
        footer: read("footer.html")?,
    })
}

/// Outcome of an assembly run.
#[derive(Debug, Default)]
pub struct AssembleReport {
    pub written: Vec<PathBuf>,
    /// Fragments that produced no output (logged).
    pub skipped: usize,
    pub pictures: PictureStats,
}

/// A category value usable as a single output directory name.
pub fn is_safe_category(category: &str) -> bool {
    config::is_single_segment(category) && !category.contains("..")
}

/// Other articles sharing at least one tag with `article`, most shared tags
/// first, then by title.
pub fn related_articles<'a>(
    article: &Fragment,
    all: &'a [Fragment],
    limit: usize,
) -> Vec<&'a Fragment> {
    if article.meta.tags.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(usize, &Fragment)> = all
        .iter()
        .filter(|other| other.file_name != article.file_name)
        .map(|other| {
            let shared = other
                .meta
                .tags
                .iter()
                .filter(|t| article.meta.tags.contains(t))
                .count();
            (shared, other)
        })
        .filter(|(shared, _)| *shared > 0)
        .collect();
    scored.sort_by(|(a_shared, a), (b_shared, b)| {
        b_shared
            .cmp(a_shared)
            .then_with(|| a.meta.title.cmp(&b.meta.title))
    });
    scored.into_iter().take(limit).map(|(_, f)| f).collect()
}

fn render_related(heading: &str, related: &[&Fragment]) -> Markup {
    html! {
        section.related-articles {
            h2 { (heading) }
            ul {
                @for article in related {
                    li { a href=(article.url()) { (article.meta.title) } }
                }
            }
        }
    }
}

/// Assemble one article document (before image rewriting).
pub fn render_article(
    fragment: &Fragment,
    partials: &Partials,
    related: &[&Fragment],
    config: &SiteConfig,
) -> String {
    let header = markup::set_title(&partials.header, &fragment.meta.title);
    let header = if fragment.meta.head_meta.is_empty() {
        header
    } else {
        let meta = fragment.meta.head_meta.join("\n");
        markup::insert_before_close(&header, "head", &meta).unwrap_or(header)
    };

    let body = harvest::strip_moved_meta(&fragment.raw);
    let related_block = if related.is_empty() {
        None
    } else {
        Some(render_related(&config.related.heading, related))
    };
    let content = html! {
        main.article-content {
            "\n" (PreEscaped(body.trim())) "\n"
            @if let Some(block) = related_block {
                (block)
            }
        }
    };

    format!("{}\n{}\n{}", header, content.into_string(), partials.footer)
}

/// Build every article fragment into its category directory.
pub fn build_articles<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<AssembleReport, AssembleError> {
    let partials = load_partials(root, config)?;
    let fragments = harvest::load_article_fragments(root, config)?;
    let rewriter = PictureRewriter::new(backend, root, &config.images);
    let mut report = AssembleReport::default();

    for fragment in &fragments {
        let category = &fragment.meta.category;
        if !is_safe_category(category) {
            warn!(
                "Skipping {}: unsafe category '{}'",
                fragment.file_name, category
            );
            report.skipped += 1;
            continue;
        }
        if config.is_reserved_dir(category) {
            warn!(
                "Skipping {}: category '{}' is a layout or index directory",
                fragment.file_name, category
            );
            report.skipped += 1;
            continue;
        }
        if config.category(category).is_none() {
            warn!(
                "{}: category '{}' is not configured; it will have no index page",
                fragment.file_name, category
            );
        }

        let related = if config.related.enabled {
            related_articles(fragment, &fragments, config.related.limit)
        } else {
            Vec::new()
        };
        let document = render_article(fragment, &partials, &related, config);
        let (document, pictures) = rewriter.rewrite_images(&document, &fragment.file_name);
        report.pictures.add(pictures);

        let out_dir = root.join(category);
        let out_path = out_dir.join(&fragment.file_name);
        match fs::create_dir_all(&out_dir).and_then(|_| fs::write(&out_path, document)) {
            Ok(()) => {
                info!("Article: {} -> /{}/{}", fragment.file_name, category, fragment.file_name);
                report.written.push(out_path);
            }
            Err(e) => {
                warn!("Failed to write {}: {}", out_path.display(), e);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

/// Assemble one static page document (before image rewriting).
pub fn render_static_page(raw: &str, partials: &Partials, config: &SiteConfig) -> String {
    let doc = markup::parse(raw);
    let title = markup::h1_text(&doc).unwrap_or_else(|| UNTITLED_PAGE.to_string());
    let style = markup::head_style(raw);

    let body = markup::strip_document_shell(raw);
    let body = markup::remove_title(&body);
    let body = markup::remove_non_charset_meta(&body);
    let body = markup::remove_ld_json(&body, |_| true);
    let header = markup::after_body_open(&partials.header);
    let footer = markup::before_body_close(&partials.footer);

    html! {
        (DOCTYPE)
        html lang=(config.layout.lang) {
            head {
                meta charset="UTF-8";
                @for href in &config.layout.stylesheets {
                    link rel="stylesheet" href=(href);
                }
                @if let Some(css) = &style {
                    style { (PreEscaped(css)) }
                }
                title { (title) }
            }
            body {
                (PreEscaped(header.trim()))
                "\n"
                (PreEscaped(body.trim()))
                "\n"
                (PreEscaped(footer.trim()))
            }
        }
    }
    .into_string()
}

/// Build the configured static pages into the site root.
pub fn build_static_pages<B: ImageBackend>(
    root: &Path,
    config: &SiteConfig,
    backend: &B,
) -> Result<AssembleReport, AssembleError> {
    let partials = load_partials(root, config)?;
    let pages_dir = root.join(&config.layout.pages_dir);
    let rewriter = PictureRewriter::new(backend, root, &config.images);
    let mut report = AssembleReport::default();

    for page in &config.static_pages {
        let source = pages_dir.join(&page.source);
        let raw = match fs::read_to_string(&source) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Static page {} not built: {}", page.source, e);
                report.skipped += 1;
                continue;
            }
        };

        let document = render_static_page(&raw, &partials, config);
        let (document, pictures) = rewriter.rewrite_images(&document, &page.source);
        report.pictures.add(pictures);
        let (document, backgrounds) = rewriter.rewrite_backgrounds(&document);
        report.pictures.add(backgrounds);

        let out_path = root.join(&page.output);
        match fs::write(&out_path, document) {
            Ok(()) => {
                info!("Static: {} -> /{}", page.source, page.output);
                report.written.push(out_path);
            }
            Err(e) => {
                warn!("Failed to write {}: {}", out_path.display(), e);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::types::FragmentMeta;
    use tempfile::TempDir;

    const HEADER: &str = "<!DOCTYPE html>\n<html lang=\"vi\">\n<head>\n<meta charset=\"UTF-8\">\n<title>Tuvanphongsach.com</title>\n</head>\n<body>\n<header><nav>menu</nav></header>";
    const FOOTER: &str = "<footer>© Tuvanphongsach.com</footer>\n</body>\n</html>";

    fn partials() -> Partials {
        Partials {
            header: HEADER.to_string(),
            footer: FOOTER.to_string(),
        }
    }

    fn fragment(file: &str, title: &str, tags: &[&str]) -> Fragment {
        Fragment {
            file_name: file.to_string(),
            raw: format!("<h1>{title}</h1>"),
            meta: FragmentMeta {
                title: title.to_string(),
                category: "ahu".to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..FragmentMeta::default()
            },
        }
    }

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("partials")).unwrap();
        fs::create_dir_all(tmp.path().join("pages")).unwrap();
        fs::write(tmp.path().join("partials/header.html"), HEADER).unwrap();
        fs::write(tmp.path().join("partials/footer.html"), FOOTER).unwrap();
        tmp
    }

    #[test]
    fn load_partials_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_partials(tmp.path(), &SiteConfig::default());
        assert!(matches!(result, Err(AssembleError::MissingPartial(_))));
    }

    #[test]
    fn safe_category_rules() {
        assert!(is_safe_category("ahu"));
        assert!(is_safe_category("tu-van-phong-sach"));
        assert!(!is_safe_category(""));
        assert!(!is_safe_category("../etc"));
        assert!(!is_safe_category("a/b"));
        assert!(!is_safe_category(".."));
    }

    #[test]
    fn related_ranked_by_shared_tags_then_title() {
        let all = vec![
            fragment("a.html", "A", &["x", "y"]),
            fragment("b.html", "B", &["x"]),
            fragment("c.html", "C", &["x", "y"]),
            fragment("d.html", "D", &["z"]),
            fragment("e.html", "Ă", &["y"]),
        ];
        let related = related_articles(&all[0], &all, 3);
        let names: Vec<&str> = related.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.html", "b.html", "e.html"]);
    }

    #[test]
    fn related_empty_without_tags() {
        let all = vec![fragment("a.html", "A", &[]), fragment("b.html", "B", &[])];
        assert!(related_articles(&all[0], &all, 3).is_empty());
    }

    #[test]
    fn render_article_moves_meta_and_sets_title() {
        let raw = "<meta name=\"category\" content=\"ahu\">\n<meta name=\"tags\" content=\"ahu\">\n<h1>AHU là gì?</h1>\n<p>Nội dung</p>";
        let meta = harvest::read_fragment(raw, "misc");
        let frag = Fragment {
            file_name: "ahu-1.html".to_string(),
            raw: raw.to_string(),
            meta,
        };
        let out = render_article(&frag, &partials(), &[], &SiteConfig::default());

        assert!(out.contains("<title>AHU là gì?</title>"));
        assert_eq!(out.matches("Tuvanphongsach.com</title>").count(), 0);
        let head_end = out.find("</head>").unwrap();
        let meta_pos = out.find("name=\"category\"").unwrap();
        assert!(meta_pos < head_end);
        assert_eq!(out.matches("name=\"category\"").count(), 1);
        assert!(out.contains("<main class=\"article-content\">\n<h1>AHU là gì?</h1>"));
        assert!(out.trim_end().ends_with("</html>"));
        assert!(!out.contains("related-articles"));
    }

    #[test]
    fn render_article_appends_related_block() {
        let all = vec![fragment("a.html", "A", &["x"]), fragment("b.html", "B", &["x"])];
        let related = related_articles(&all[0], &all, 3);
        let out = render_article(&all[0], &partials(), &related, &SiteConfig::default());
        assert!(out.contains("<section class=\"related-articles\"><h2>Bài viết liên quan</h2>"));
        assert!(out.contains("<a href=\"/ahu/b.html\">B</a>"));
    }

    #[test]
    fn header_is_fresh_for_each_article() {
        let tmp = site();
        fs::write(
            tmp.path().join("pages/a.html"),
            "<meta name=\"category\" content=\"ahu\"><h1>First</h1>",
        )
        .unwrap();
        fs::write(
            tmp.path().join("pages/b.html"),
            "<meta name=\"category\" content=\"fcu\"><h1>Second</h1>",
        )
        .unwrap();

        let report =
            build_articles(tmp.path(), &SiteConfig::default(), &MockBackend::new()).unwrap();
        assert_eq!(report.written.len(), 2);

        let second = fs::read_to_string(tmp.path().join("fcu/b.html")).unwrap();
        assert!(second.contains("<title>Second</title>"));
        assert!(!second.contains("First"));
        assert_eq!(second.matches("name=\"category\"").count(), 1);
    }

    #[test]
    fn unsafe_category_is_skipped() {
        let tmp = site();
        fs::write(
            tmp.path().join("pages/evil.html"),
            "<meta name=\"category\" content=\"../outside\"><h1>x</h1>",
        )
        .unwrap();
        let report =
            build_articles(tmp.path(), &SiteConfig::default(), &MockBackend::new()).unwrap();
        assert_eq!(report.skipped, 1);
        assert!(report.written.is_empty());
    }

    #[test]
    fn layout_directory_category_never_overwrites_sources() {
        let tmp = site();
        let source = "<meta name=\"category\" content=\"pages\"><h1>x</h1>";
        fs::write(tmp.path().join("pages/x.html"), source).unwrap();
        fs::write(
            tmp.path().join("pages/y.html"),
            "<meta name=\"category\" content=\"tags\"><h1>y</h1>",
        )
        .unwrap();

        for _ in 0..2 {
            let report =
                build_articles(tmp.path(), &SiteConfig::default(), &MockBackend::new()).unwrap();
            assert_eq!(report.skipped, 2);
            assert!(report.written.is_empty());
        }
        assert_eq!(fs::read_to_string(tmp.path().join("pages/x.html")).unwrap(), source);
        assert!(!tmp.path().join("tags/y.html").exists());
    }

    #[test]
    fn uncategorized_article_goes_to_misc() {
        let tmp = site();
        fs::write(tmp.path().join("pages/note.html"), "<h1>Ghi chú</h1>").unwrap();
        build_articles(tmp.path(), &SiteConfig::default(), &MockBackend::new()).unwrap();
        assert!(tmp.path().join("misc/note.html").exists());
    }

    #[test]
    fn static_page_document_shell() {
        let raw = "<!DOCTYPE html><html><head><title>Old</title><style>.hero{color:red}</style>\n<meta name=\"description\" content=\"x\"></head><body>\n<h1>Giới thiệu</h1>\n<script type=\"application/ld+json\">{}</script>\n<p>Nội dung</p></body></html>";
        let out = render_static_page(raw, &partials(), &SiteConfig::default());

        assert!(out.starts_with("<!DOCTYPE html><html lang=\"vi\"><head><meta charset=\"UTF-8\">"));
        assert!(out.contains("<link rel=\"stylesheet\" href=\"/style.css\">"));
        assert!(out.contains("<style>.hero{color:red}</style>"));
        assert!(out.contains("<title>Giới thiệu</title>"));
        assert!(!out.contains("Old"));
        assert!(!out.contains("application/ld+json"));
        assert!(!out.contains("name=\"description\""));
        assert_eq!(out.matches("<html").count(), 1);
        assert_eq!(out.matches("<body").count(), 1);
        assert!(out.contains("<body><header><nav>menu</nav></header>\n<h1>Giới thiệu</h1>"));
        assert!(out.ends_with("<footer>© Tuvanphongsach.com</footer></body></html>"));
    }

    #[test]
    fn static_page_without_h1_is_untitled() {
        let out = render_static_page("<p>x</p>", &partials(), &SiteConfig::default());
        assert!(out.contains("<title>Untitled</title>"));
    }

    #[test]
    fn build_static_pages_maps_outputs_and_skips_missing() {
        let tmp = site();
        fs::write(tmp.path().join("pages/home.html"), "<h1>Trang chủ</h1>").unwrap();
        fs::write(tmp.path().join("pages/lien-he.html"), "<h1>Liên hệ</h1>").unwrap();

        let report =
            build_static_pages(tmp.path(), &SiteConfig::default(), &MockBackend::new()).unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.skipped, 2);
        assert!(tmp.path().join("index.html").exists());
        assert!(tmp.path().join("lien-he.html").exists());
        assert!(!tmp.path().join("home.html").exists());
    }
}
