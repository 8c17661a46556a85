//! Resizing and encoding of site images with the `image` crate.
//!
//! Size math lives in `calculations`, [`operations`] turns a source
//! image into the set of derivatives a `<picture>` needs, and every pixel
//! goes through an [`ImageBackend`]. [`RustBackend`] decodes with
//! `ImageReader`, resizes with Lanczos3 and encodes AVIF (rav1e), lossless
//! WebP and JPEG.

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{fit_inside, scale_bounds};
pub use operations::{
    DerivativeConfig, DerivativePaths, DerivativeSet, SizePolicy, create_background_variant,
    create_derivatives, derivative_paths, get_dimensions, is_supported_source, plan_derivatives,
};
pub use params::{EncodeParams, OutputFormat, Quality};
pub use rust_backend::RustBackend;
