//! End-to-end builds of the fixture site with the real image backend.

use image::{ImageBuffer, Rgb, Rgba};
use phongsach_build::config::{self, SiteConfig};
use phongsach_build::{markup, pipeline, seo};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

fn copy_dir(src: &Path, dst: &Path) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            fs::create_dir_all(&target).unwrap();
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Fixture site plus the two article images it references.
fn site() -> (TempDir, SiteConfig) {
    let tmp = TempDir::new().unwrap();
    copy_dir(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site"),
        tmp.path(),
    );

    let jpeg = tmp.path().join("image/ahu/ahu-la-gi.jpg");
    fs::create_dir_all(jpeg.parent().unwrap()).unwrap();
    ImageBuffer::from_fn(320, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]))
        .save(&jpeg)
        .unwrap();

    let png = tmp.path().join("image/fcu/fcu.png");
    fs::create_dir_all(png.parent().unwrap()).unwrap();
    ImageBuffer::from_fn(160, 120, |x, _| Rgba([30u8, 120, 200, if x < 80 { 0 } else { 255 }]))
        .save(&png)
        .unwrap();

    let config = config::load_config(tmp.path()).unwrap();
    (tmp, config)
}

fn build(root: &Path, config: &SiteConfig) -> phongsach_build::cache::CacheStats {
    let (_, stats) = pipeline::with_cache(root, true, |backend| {
        pipeline::build_all(root, config, backend)
    })
    .unwrap();
    stats
}

/// Every built HTML file under the root, keyed by relative path.
fn snapshot(root: &Path, config: &SiteConfig) -> BTreeMap<String, String> {
    seo::html_files(root, config)
        .into_iter()
        .map(|path| {
            let rel = seo::relative_path(root, &path);
            (rel, fs::read_to_string(&path).unwrap())
        })
        .collect()
}

fn sitemap_locs(root: &Path) -> BTreeSet<String> {
    let xml = fs::read_to_string(root.join("sitemap.xml")).unwrap();
    Regex::new(r"<loc>([^<]+)</loc>")
        .unwrap()
        .captures_iter(&xml)
        .map(|c| c[1].to_string())
        .collect()
}

#[test]
fn each_article_lands_in_exactly_one_category_directory() {
    let (tmp, config) = site();
    build(tmp.path(), &config);

    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in WalkDir::new(tmp.path()).into_iter().filter_map(Result::ok) {
        let rel = entry.path().strip_prefix(tmp.path()).unwrap().to_path_buf();
        if rel.starts_with("pages") || !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        found.entry(name).or_default().push(rel);
    }

    let expected = [
        ("ahu-la-gi.html", "ahu/ahu-la-gi.html"),
        ("ahu-bao-tri.html", "ahu/ahu-bao-tri.html"),
        ("fcu-co-ban.html", "fcu/fcu-co-ban.html"),
        ("ghi-chu.html", "misc/ghi-chu.html"),
    ];
    for (name, rel) in expected {
        assert_eq!(found[name], vec![PathBuf::from(rel)], "{name}");
    }
}

#[test]
fn every_page_has_exactly_one_breadcrumb() {
    let (tmp, config) = site();
    build(tmp.path(), &config);

    let pages = snapshot(tmp.path(), &config);
    assert!(pages.contains_key("index.html"));
    assert!(pages.contains_key("ahu/index.html"));
    assert!(pages.contains_key("danh-muc.html"));
    for (rel, html) in &pages {
        assert_eq!(markup::count_breadcrumbs(html), 1, "{rel}");
    }
}

#[test]
fn sitemap_lists_exactly_the_built_pages() {
    let (tmp, config) = site();
    build(tmp.path(), &config);

    let base = &config.base_url;
    let expected: BTreeSet<String> = [
        "/",
        "/gioi-thieu.html",
        "/lien-he.html",
        "/dich-vu.html",
        "/danh-muc.html",
        "/ahu/",
        "/fcu/",
        "/ahu/ahu-la-gi.html",
        "/ahu/ahu-bao-tri.html",
        "/fcu/fcu-co-ban.html",
    ]
    .iter()
    .map(|path| format!("{base}{path}"))
    .collect();
    assert_eq!(sitemap_locs(tmp.path()), expected);

    let robots = fs::read_to_string(tmp.path().join("robots.txt")).unwrap();
    assert!(robots.ends_with(&format!("Sitemap: {base}/sitemap.xml\n")));
}

#[test]
fn article_images_become_picture_elements() {
    let (tmp, config) = site();
    build(tmp.path(), &config);

    let html = fs::read_to_string(tmp.path().join("ahu/ahu-la-gi.html")).unwrap();
    assert!(html.contains("<picture>"));
    assert!(html.contains("/image/ahu/ahu-la-gi.avif"));
    assert!(html.contains("/image/ahu/ahu-la-gi.webp"));
    assert!(tmp.path().join("image/ahu/ahu-la-gi.avif").exists());
    assert!(tmp.path().join("image/fcu/fcu.webp").exists());
}

#[test]
fn second_build_is_idempotent() {
    let (tmp, config) = site();
    let first_stats = build(tmp.path(), &config);
    let first = snapshot(tmp.path(), &config);

    let second_stats = build(tmp.path(), &config);
    let second = snapshot(tmp.path(), &config);
    assert_eq!(first, second);

    let seo = pipeline::seo_phase(tmp.path(), &config).unwrap();
    assert!(seo.written.is_empty(), "{:?}", seo.written);

    for (rel, html) in &second {
        let og_titles = html.matches(r#"property="og:title""#).count();
        assert_eq!(og_titles, 1, "{rel}");
        let descriptions = html.matches(r#"name="description""#).count();
        assert_eq!(descriptions, 1, "{rel}");
    }

    assert!(first_stats.misses > 0);
    assert!(second_stats.hits > 0);
    assert_eq!(second_stats.misses, 0);
}
