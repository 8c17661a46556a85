//! Shared test utilities.
//!
//! `setup_fixtures()` gives each test its own copy of `fixtures/site/`, a
//! small site root with fragments, partials and a pre-generated schema.
//! Image files are not committed; tests that need real pixels create them
//! with [`create_test_jpeg`] / [`create_test_png`].
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! create_test_jpeg(&tmp.path().join("image/ahu/ahu-1.jpg"), 1600, 900);
//! // ... run a phase ...
//! let html = read_page(tmp.path(), "ahu/ahu-1.html");
//! ```

use image::{ImageBuffer, Rgb, Rgba};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a gradient JPEG, creating parent directories.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save(path).unwrap();
}

/// Write a PNG with a transparent left half, creating parent directories.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, _| {
        let alpha: u8 = if x < width / 2 { 0 } else { 255 };
        Rgba([200, 40, 40, alpha])
    });
    img.save(path).unwrap();
}

// =========================================================================
// Lookups
// =========================================================================

/// Read a built page. Panics with the missing path on failure.
pub fn read_page(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("page '{rel}' not readable: {e}"))
}

/// Assert `needle` occurs exactly once in `html`.
pub fn assert_once(html: &str, needle: &str) {
    let count = html.matches(needle).count();
    assert_eq!(count, 1, "expected exactly one '{needle}', found {count}");
}
