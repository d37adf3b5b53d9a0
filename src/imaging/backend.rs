//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the one operation the thumbnail cache
//! needs: shrink an image to fit a box. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::ThumbnailParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve parallel thumbnail generation.
pub trait ImageBackend: Sync {
    /// Shrink `params.source` to fit the bounding box and write it to
    /// `params.output`. Returns the dimensions of the written image.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError>;
}
