//! Derivative cache for rebuilding a site root in place.
//!
//! The site is rebuilt many times against the same `image/` tree, and AVIF
//! encoding dominates the cost of a build. [`CachedBackend`] sits in front
//! of the real backend and skips any encode whose inputs match a previous
//! run. Only [`ImageBackend::encode`] is intercepted; `identify` always
//! reads the current source so `width`/`height` attributes never go stale.
//!
//! Lookups go by content, never by output path:
//!
//! - `source_hash` is SHA-256 of the source bytes, computed once per source
//!   and reused for all of its derivatives. Checkouts that reset mtimes do
//!   not invalidate it.
//! - `params_hash` is SHA-256 of format, width, height and quality.
//!
//! A matching entry whose file is still on disk is a hit. A matching entry
//! stored under another path is copied instead of encoded. Anything else is
//! encoded and recorded.
//!
//! The manifest is `<root>/.derivative-cache.json`. `--no-cache` starts the
//! run from an empty manifest.

use crate::imaging::{BackendError, Dimensions, EncodeParams, ImageBackend, OutputFormat};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the cache manifest file within the site root.
const MANIFEST_FILENAME: &str = ".derivative-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// Hashes an output was produced from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

impl CacheEntry {
    fn content_key(&self) -> String {
        content_key(&self.source_hash, &self.params_hash)
    }
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

/// Output path (root-relative) → the hashes it was encoded from.
///
/// `by_content` is the reverse map, rebuilt on load and never written.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    #[serde(skip)]
    by_content: HashMap<String, String>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Manifest saved in `root`. A missing, unreadable or outdated file
    /// yields an empty manifest, which only costs re-encoding.
    pub fn load(root: &Path) -> Self {
        let loaded = std::fs::read_to_string(manifest_path(root))
            .ok()
            .and_then(|json| serde_json::from_str::<Self>(&json).ok())
            .filter(|manifest| manifest.version == MANIFEST_VERSION);
        match loaded {
            Some(mut manifest) => {
                manifest.by_content = manifest
                    .entries
                    .iter()
                    .map(|(output, entry)| (entry.content_key(), output.clone()))
                    .collect();
                manifest
            }
            None => Self::empty(),
        }
    }

    pub fn save(&self, root: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(root), json)
    }

    /// Stored output for these hashes, if that file still exists and was
    /// last written from them. It may live at a different path than the one
    /// now requested.
    pub fn find_cached(&self, source_hash: &str, params_hash: &str, root: &Path) -> Option<String> {
        let key = content_key(source_hash, params_hash);
        self.by_content
            .get(&key)
            .filter(|stored| {
                self.entries
                    .get(stored.as_str())
                    .is_some_and(|entry| entry.content_key() == key)
            })
            .filter(|stored| root.join(stored).exists())
            .cloned()
    }

    /// Record `output_path`. An older path holding the same content is
    /// forgotten, and so is whatever content `output_path` held before.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let entry = CacheEntry {
            source_hash,
            params_hash,
        };
        let key = entry.content_key();
        if let Some(replaced) = self.entries.get(&output_path).map(CacheEntry::content_key)
            && replaced != key
            && self.by_content.get(&replaced) == Some(&output_path)
        {
            self.by_content.remove(&replaced);
        }
        if let Some(previous) = self.by_content.insert(key, output_path.clone())
            && previous != output_path
        {
            self.entries.remove(&previous);
        }
        self.entries.insert(output_path, entry);
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// SHA-256 hash of the parameters of one encode.
pub fn hash_encode_params(format: OutputFormat, width: u32, height: u32, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format.extension().as_bytes());
    hasher.update(b"\0");
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits == 0 && self.copies == 0 {
            return write!(f, "{} encoded", self.misses);
        }
        write!(f, "{} cached, ", self.hits)?;
        if self.copies > 0 {
            write!(f, "{} copied, ", self.copies)?;
        }
        write!(f, "{} encoded ({} total)", self.misses, self.total())
    }
}

/// Resolve the cache manifest path for a site root.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILENAME)
}

/// Manifest key of an output: root-relative, `/`-separated.
fn output_key(root: &Path, output: &Path) -> String {
    output
        .strip_prefix(root)
        .unwrap_or(output)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Backend wrapper that skips encodes already present in the manifest.
pub struct CachedBackend<'a, B: ImageBackend> {
    inner: &'a B,
    root: PathBuf,
    manifest: RefCell<CacheManifest>,
    stats: RefCell<CacheStats>,
    source_hashes: RefCell<HashMap<PathBuf, String>>,
}

impl<'a, B: ImageBackend> CachedBackend<'a, B> {
    pub fn new(inner: &'a B, root: &Path, manifest: CacheManifest) -> Self {
        Self {
            inner,
            root: root.to_path_buf(),
            manifest: RefCell::new(manifest),
            stats: RefCell::new(CacheStats::default()),
            source_hashes: RefCell::new(HashMap::new()),
        }
    }

    /// Hand back the updated manifest and the run's statistics.
    pub fn into_parts(self) -> (CacheManifest, CacheStats) {
        (self.manifest.into_inner(), self.stats.into_inner())
    }

    fn source_hash(&self, source: &Path) -> io::Result<String> {
        if let Some(hash) = self.source_hashes.borrow().get(source) {
            return Ok(hash.clone());
        }
        let hash = hash_file(source)?;
        self.source_hashes
            .borrow_mut()
            .insert(source.to_path_buf(), hash.clone());
        Ok(hash)
    }
}

impl<B: ImageBackend> ImageBackend for CachedBackend<'_, B> {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        self.inner.identify(path)
    }

    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
        let source_hash = self.source_hash(&params.source)?;
        let params_hash = hash_encode_params(
            params.format,
            params.width,
            params.height,
            params.quality.value(),
        );
        let key = output_key(&self.root, &params.output);

        let cached = self
            .manifest
            .borrow()
            .find_cached(&source_hash, &params_hash, &self.root);
        match cached {
            Some(stored) if stored == key => {
                debug!(output = %key, "cache hit");
                self.stats.borrow_mut().hit();
                return Ok(());
            }
            Some(stored) => {
                debug!(from = %stored, to = %key, "cache copy");
                std::fs::copy(self.root.join(&stored), &params.output)?;
                self.stats.borrow_mut().copy();
            }
            None => {
                self.inner.encode(params)?;
                self.stats.borrow_mut().miss();
            }
        }
        self.manifest
            .borrow_mut()
            .insert(key, source_hash, params_hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::imaging::backend::tests::MockBackend;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // CacheManifest basics
    // =========================================================================

    #[test]
    fn empty_manifest_has_no_entries() {
        let m = CacheManifest::empty();
        assert_eq!(m.version, MANIFEST_VERSION);
        assert!(m.entries.is_empty());
        assert!(m.by_content.is_empty());
    }

    #[test]
    fn find_cached_hit() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("image/a.avif".into(), "src123".into(), "prm456".into());

        let out = tmp.path().join("image");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("a.avif"), "data").unwrap();

        assert_eq!(
            m.find_cached("src123", "prm456", tmp.path()),
            Some("image/a.avif".to_string())
        );
    }

    #[test]
    fn find_cached_miss_wrong_hashes() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("out.avif".into(), "hash_a".into(), "params".into());
        fs::write(tmp.path().join("out.avif"), "data").unwrap();

        assert_eq!(m.find_cached("hash_b", "params", tmp.path()), None);
        assert_eq!(m.find_cached("hash_a", "other", tmp.path()), None);
    }

    #[test]
    fn find_cached_miss_file_deleted() {
        let mut m = CacheManifest::empty();
        m.insert("gone.avif".into(), "h".into(), "p".into());
        let tmp = TempDir::new().unwrap();
        assert_eq!(m.find_cached("h", "p", tmp.path()), None);
    }

    #[test]
    fn insert_removes_stale_entry_on_path_change() {
        let mut m = CacheManifest::empty();
        m.insert("image/old.avif".into(), "src".into(), "prm".into());
        m.insert("image/new.avif".into(), "src".into(), "prm".into());

        assert!(!m.entries.contains_key("image/old.avif"));
        assert!(m.entries.contains_key("image/new.avif"));
    }

    #[test]
    fn insert_over_existing_path_forgets_its_old_content() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.webp"), "data").unwrap();
        let mut m = CacheManifest::empty();
        m.insert("a.webp".into(), "src".into(), "small".into());
        m.insert("a.webp".into(), "src".into(), "large".into());

        assert_eq!(m.find_cached("src", "small", tmp.path()), None);
        assert_eq!(
            m.find_cached("src", "large", tmp.path()),
            Some("a.webp".to_string())
        );
        assert_eq!(m.by_content.len(), 1);
    }

    // =========================================================================
    // Save / Load
    // =========================================================================

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("x.avif".into(), "s1".into(), "p1".into());
        m.insert("y.avif".into(), "s2".into(), "p2".into());

        m.save(tmp.path()).unwrap();
        assert!(manifest_path(tmp.path()).exists());
        let loaded = CacheManifest::load(tmp.path());

        assert_eq!(loaded.entries.len(), 2);
        let found = loaded.find_cached("s2", "p2", tmp.path());
        assert_eq!(found, None, "y.avif was never written");
        fs::write(tmp.path().join("y.avif"), "data").unwrap();
        assert_eq!(
            loaded.find_cached("s2", "p2", tmp.path()),
            Some("y.avif".to_string())
        );
    }

    #[test]
    fn load_corrupt_json_returns_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILENAME), "not json").unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn load_wrong_version_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(
            r#"{{"version": {}, "entries": {{"a": {{"source_hash":"h","params_hash":"p"}}}}}}"#,
            MANIFEST_VERSION + 1
        );
        fs::write(tmp.path().join(MANIFEST_FILENAME), json).unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    // =========================================================================
    // Hash functions
    // =========================================================================

    #[test]
    fn hash_file_changes_with_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");

        fs::write(&path, b"version 1").unwrap();
        let h1 = hash_file(&path).unwrap();
        assert_eq!(h1.len(), 64);

        fs::write(&path, b"version 2").unwrap();
        assert_ne!(h1, hash_file(&path).unwrap());
    }

    #[test]
    fn hash_encode_params_varies_with_every_input() {
        let base = hash_encode_params(OutputFormat::Avif, 1200, 800, 40);
        assert_eq!(base, hash_encode_params(OutputFormat::Avif, 1200, 800, 40));
        assert_ne!(base, hash_encode_params(OutputFormat::WebP, 1200, 800, 40));
        assert_ne!(base, hash_encode_params(OutputFormat::Avif, 720, 800, 40));
        assert_ne!(base, hash_encode_params(OutputFormat::Avif, 1200, 480, 40));
        assert_ne!(base, hash_encode_params(OutputFormat::Avif, 1200, 800, 50));
    }

    // =========================================================================
    // CachedBackend
    // =========================================================================

    fn params(root: &Path, output: &str) -> EncodeParams {
        EncodeParams {
            source: root.join("image/a.jpg"),
            output: root.join(output),
            width: 100,
            height: 50,
            format: OutputFormat::WebP,
            quality: Quality::new(50),
        }
    }

    fn site_with_source() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("image")).unwrap();
        fs::write(tmp.path().join("image/a.jpg"), b"jpeg bytes").unwrap();
        tmp
    }

    #[test]
    fn cached_backend_miss_then_hit() {
        let tmp = site_with_source();
        let mock = MockBackend::new();

        let cached = CachedBackend::new(&mock, tmp.path(), CacheManifest::empty());
        cached.encode(&params(tmp.path(), "image/a.webp")).unwrap();
        let (manifest, stats) = cached.into_parts();
        assert_eq!(stats.misses, 1);
        assert!(manifest.entries.contains_key("image/a.webp"));

        // The mock writes nothing; simulate the encoded output
        fs::write(tmp.path().join("image/a.webp"), b"webp").unwrap();

        let cached = CachedBackend::new(&mock, tmp.path(), manifest);
        cached.encode(&params(tmp.path(), "image/a.webp")).unwrap();
        let (_, stats) = cached.into_parts();
        assert_eq!(stats.hits, 1);
        assert_eq!(mock.encodes().len(), 1);
    }

    #[test]
    fn cached_backend_copies_moved_output() {
        let tmp = site_with_source();
        fs::write(tmp.path().join("image/a.webp"), b"webp").unwrap();
        let p = params(tmp.path(), "image/a.webp");

        let mut manifest = CacheManifest::empty();
        manifest.insert(
            "image/a.webp".into(),
            hash_file(&p.source).unwrap(),
            hash_encode_params(p.format, p.width, p.height, p.quality.value()),
        );

        let mock = MockBackend::new();
        let cached = CachedBackend::new(&mock, tmp.path(), manifest);
        cached.encode(&params(tmp.path(), "image/b.webp")).unwrap();
        let (manifest, stats) = cached.into_parts();

        assert_eq!(stats.copies, 1);
        assert!(mock.encodes().is_empty());
        assert_eq!(fs::read(tmp.path().join("image/b.webp")).unwrap(), b"webp");
        assert!(manifest.entries.contains_key("image/b.webp"));
    }

    #[test]
    fn one_output_path_at_two_sizes_never_hits_across_builds() {
        let tmp = site_with_source();
        let mock = MockBackend::new();
        let sized = |width, height| EncodeParams {
            width,
            height,
            ..params(tmp.path(), "image/a.webp")
        };

        let mut manifest = CacheManifest::empty();
        for run in 0..2 {
            let cached = CachedBackend::new(&mock, tmp.path(), manifest);
            for (w, h) in [(400, 200), (1200, 600)] {
                cached.encode(&sized(w, h)).unwrap();
                fs::write(tmp.path().join("image/a.webp"), format!("{w}x{h}")).unwrap();
            }
            let (saved, stats) = cached.into_parts();
            assert_eq!(stats.hits, 0, "run {run}");
            assert_eq!(stats.misses, 2, "run {run}");
            saved.save(tmp.path()).unwrap();
            manifest = CacheManifest::load(tmp.path());
        }
        assert_eq!(mock.encodes().len(), 4);
    }

    #[test]
    fn cached_backend_missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let mock = MockBackend::new();
        let cached = CachedBackend::new(&mock, tmp.path(), CacheManifest::empty());
        let result = cached.encode(&params(tmp.path(), "image/a.webp"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display_with_hits() {
        let s = CacheStats {
            hits: 5,
            misses: 2,
            ..CacheStats::default()
        };
        assert_eq!(format!("{}", s), "5 cached, 2 encoded (7 total)");
    }

    #[test]
    fn cache_stats_display_with_copies() {
        let s = CacheStats {
            hits: 3,
            copies: 2,
            misses: 1,
        };
        assert_eq!(format!("{}", s), "3 cached, 2 copied, 1 encoded (6 total)");
    }

    #[test]
    fn cache_stats_display_no_hits() {
        let s = CacheStats {
            misses: 3,
            ..CacheStats::default()
        };
        assert_eq!(format!("{}", s), "3 encoded");
    }
}
