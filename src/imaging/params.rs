//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`thumbnail`](crate::thumbnail) cache (which decides
//! what file to create and where) and the [`backend`](super::backend) (which
//! does the actual pixel work), so the cache can be tested against a mock.

use std::path::PathBuf;

/// Quality setting for lossy (JPEG) encoding, 1-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Parameters for a thumbnail operation: shrink to fit, convert to RGB, save.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Output file; its extension selects the encoder.
    pub output: PathBuf,
    /// Bounding box the result must fit into.
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}
