//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take a
//! [`DerivativeConfig`], compute [`EncodeParams`] for every derivative, and
//! hand them to the backend.
//!
//! Every source image `name.ext` gets five siblings in its own directory:
//!
//! ```text
//! image/ahu/
//! ├── ahu-1.jpg              # source (never modified)
//! ├── ahu-1.avif             # desktop
//! ├── ahu-1.webp             # desktop
//! ├── ahu-1-small.avif       # mobile
//! ├── ahu-1-small.webp       # mobile
//! └── ahu-1-opt.jpg          # optimized fallback, desktop size
//! ```

use super::backend::{BackendError, ImageBackend};
use super::calculations::{fit_inside, scale_bounds};
use super::params::{EncodeParams, OutputFormat, Quality};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Source extensions derivatives can be produced from.
pub const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Whether `path` has an extension we can decode.
pub fn is_supported_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// How derivative sizes relate to the original.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizePolicy {
    /// Desktop keeps the original size; small fits a `small_size` square.
    Icon { small_size: u32 },
    /// Desktop fits `bounds`; small fits `bounds` scaled by `small_scale`.
    Bounded { bounds: (u32, u32), small_scale: f32 },
}

/// Everything needed to plan one image's derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeConfig {
    pub policy: SizePolicy,
    pub webp_quality: Quality,
    pub avif_quality: Quality,
    pub jpeg_quality: Quality,
}

/// On-disk locations of an image's derivatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivativePaths {
    pub webp: PathBuf,
    pub avif: PathBuf,
    pub webp_small: PathBuf,
    pub avif_small: PathBuf,
    pub jpeg: PathBuf,
}

/// Derivative locations for `source`, beside it in the same directory.
pub fn derivative_paths(source: &Path) -> DerivativePaths {
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sibling = |suffix: &str, ext: &str| dir.join(format!("{stem}{suffix}.{ext}"));

    DerivativePaths {
        webp: sibling("", "webp"),
        avif: sibling("", "avif"),
        webp_small: sibling("-small", "webp"),
        avif_small: sibling("-small", "avif"),
        jpeg: sibling("-opt", "jpg"),
    }
}

/// A planned set of encodes, not yet executed.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativePlan {
    pub paths: DerivativePaths,
    /// Size of the desktop variants and the JPEG fallback.
    pub desktop: (u32, u32),
    pub small: (u32, u32),
    /// Desktop AVIF, desktop WebP, small AVIF, small WebP, JPEG.
    pub encodes: Vec<EncodeParams>,
}

/// Plan all derivatives of `source` without executing anything.
pub fn plan_derivatives(
    source: &Path,
    original: (u32, u32),
    config: &DerivativeConfig,
) -> DerivativePlan {
    let (desktop, small) = match config.policy {
        SizePolicy::Icon { small_size } => (original, fit_inside(original, (small_size, small_size))),
        SizePolicy::Bounded {
            bounds,
            small_scale,
        } => (
            fit_inside(original, bounds),
            fit_inside(original, scale_bounds(bounds, small_scale)),
        ),
    };

    let paths = derivative_paths(source);
    let encode = |output: &PathBuf, (width, height): (u32, u32), format, quality| EncodeParams {
        source: source.to_path_buf(),
        output: output.clone(),
        width,
        height,
        format,
        quality,
    };
    let encodes = vec![
        encode(&paths.avif, desktop, OutputFormat::Avif, config.avif_quality),
        encode(&paths.webp, desktop, OutputFormat::WebP, config.webp_quality),
        encode(&paths.avif_small, small, OutputFormat::Avif, config.avif_quality),
        encode(&paths.webp_small, small, OutputFormat::WebP, config.webp_quality),
        encode(&paths.jpeg, desktop, OutputFormat::Jpeg, config.jpeg_quality),
    ];

    DerivativePlan {
        paths,
        desktop,
        small,
        encodes,
    }
}

/// Derivatives that were written for one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeSet {
    pub paths: DerivativePaths,
    pub width: u32,
    pub height: u32,
}

/// Create every derivative of `source`. Stops at the first failed encode.
pub fn create_derivatives(
    backend: &impl ImageBackend,
    source: &Path,
    config: &DerivativeConfig,
) -> Result<DerivativeSet> {
    let original = get_dimensions(backend, source)?;
    let plan = plan_derivatives(source, original, config);
    for params in &plan.encodes {
        backend.encode(params)?;
    }
    Ok(DerivativeSet {
        paths: plan.paths,
        width: plan.desktop.0,
        height: plan.desktop.1,
    })
}

/// Create the single WebP used for CSS `background-image` sources.
///
/// Returns the path of the written file (`{stem}.webp` beside the source).
pub fn create_background_variant(
    backend: &impl ImageBackend,
    source: &Path,
    bounds: (u32, u32),
    quality: Quality,
) -> Result<PathBuf> {
    let original = get_dimensions(backend, source)?;
    let (width, height) = fit_inside(original, bounds);
    let output = derivative_paths(source).webp;
    backend.encode(&EncodeParams {
        source: source.to_path_buf(),
        output: output.clone(),
        width,
        height,
        format: OutputFormat::WebP,
        quality,
    })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn bounded() -> DerivativeConfig {
        DerivativeConfig {
            policy: SizePolicy::Bounded {
                bounds: (1200, 800),
                small_scale: 0.6,
            },
            webp_quality: Quality::new(50),
            avif_quality: Quality::new(40),
            jpeg_quality: Quality::new(70),
        }
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn supported_sources() {
        assert!(is_supported_source(Path::new("a/b.JPG")));
        assert!(is_supported_source(Path::new("a/b.png")));
        assert!(!is_supported_source(Path::new("a/b.webp")));
        assert!(!is_supported_source(Path::new("a/b.svg")));
        assert!(!is_supported_source(Path::new("a/noext")));
    }

    #[test]
    fn derivative_paths_sit_beside_source() {
        let paths = derivative_paths(Path::new("/site/image/ahu/ahu-1.jpeg"));
        assert_eq!(paths.webp, Path::new("/site/image/ahu/ahu-1.webp"));
        assert_eq!(paths.avif, Path::new("/site/image/ahu/ahu-1.avif"));
        assert_eq!(paths.webp_small, Path::new("/site/image/ahu/ahu-1-small.webp"));
        assert_eq!(paths.avif_small, Path::new("/site/image/ahu/ahu-1-small.avif"));
        assert_eq!(paths.jpeg, Path::new("/site/image/ahu/ahu-1-opt.jpg"));
    }

    #[test]
    fn plan_bounded_scales_desktop_and_small() {
        let plan = plan_derivatives(Path::new("/a.jpg"), (3000, 2000), &bounded());
        assert_eq!(plan.desktop, (1200, 800));
        assert_eq!(plan.small, (720, 480));
        assert_eq!(plan.encodes.len(), 5);

        let formats: Vec<_> = plan.encodes.iter().map(|e| e.format).collect();
        assert_eq!(
            formats,
            vec![
                OutputFormat::Avif,
                OutputFormat::WebP,
                OutputFormat::Avif,
                OutputFormat::WebP,
                OutputFormat::Jpeg
            ]
        );
        assert_eq!(plan.encodes[0].quality.value(), 40);
        assert_eq!(plan.encodes[1].quality.value(), 50);
        assert_eq!(plan.encodes[4].quality.value(), 70);
        assert_eq!((plan.encodes[4].width, plan.encodes[4].height), (1200, 800));
    }

    #[test]
    fn plan_small_original_is_not_enlarged() {
        let plan = plan_derivatives(Path::new("/a.jpg"), (500, 300), &bounded());
        assert_eq!(plan.desktop, (500, 300));
        assert_eq!(plan.small, (500, 300));
    }

    #[test]
    fn plan_icon_keeps_original_desktop_size() {
        let config = DerivativeConfig {
            policy: SizePolicy::Icon { small_size: 64 },
            ..bounded()
        };
        let plan = plan_derivatives(Path::new("/icons/x.png"), (256, 128), &config);
        assert_eq!(plan.desktop, (256, 128));
        assert_eq!(plan.small, (64, 32));
    }

    #[test]
    fn create_derivatives_encodes_five_outputs() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1600,
            height: 900,
        }]);
        let config = DerivativeConfig {
            policy: SizePolicy::Bounded {
                bounds: (400, 225),
                small_scale: 0.6,
            },
            ..bounded()
        };

        let set = create_derivatives(&backend, Path::new("/img/card.jpg"), &config).unwrap();
        assert_eq!((set.width, set.height), (400, 225));

        let encodes = backend.encodes();
        assert_eq!(encodes.len(), 5);
        assert!(matches!(
            &encodes[2],
            RecordedOp::Encode { output, width: 240, height: 135, .. } if output.ends_with("card-small.avif")
        ));
    }

    #[test]
    fn create_derivatives_propagates_identify_failure() {
        let backend = MockBackend::new();
        assert!(create_derivatives(&backend, Path::new("/a.jpg"), &bounded()).is_err());
        assert!(backend.encodes().is_empty());
    }

    #[test]
    fn create_derivatives_stops_on_encode_failure() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 100,
            height: 100,
        }])
        .failing();
        assert!(create_derivatives(&backend, Path::new("/a.jpg"), &bounded()).is_err());
        assert_eq!(backend.encodes().len(), 1);
    }

    #[test]
    fn background_variant_is_single_webp() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 2400,
            height: 1600,
        }]);
        let out = create_background_variant(
            &backend,
            Path::new("/image/hero.jpg"),
            (1200, 800),
            Quality::new(50),
        )
        .unwrap();
        assert_eq!(out, Path::new("/image/hero.webp"));

        let encodes = backend.encodes();
        assert_eq!(encodes.len(), 1);
        assert!(matches!(
            &encodes[0],
            RecordedOp::Encode { format: OutputFormat::WebP, width: 1200, height: 800, quality: 50, .. }
        ));
    }
}
