//! The seam between derivative planning and pixel work.
//!
//! Planning code only needs two things from a backend: the size of a source
//! and a way to write one resized, re-encoded copy of it. [`RustBackend`]
//! does the real work; [`crate::cache::CachedBackend`] wraps any backend to
//! skip encodes it has already done.
//!
//! [`RustBackend`]: super::rust_backend::RustBackend

use super::params::EncodeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

pub trait ImageBackend {
    /// Read the pixel size, from the header where the format allows.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Write `params.output`: `params.source` resized to exactly
    /// `width`×`height` and encoded as `params.format`.
    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError>;
}
