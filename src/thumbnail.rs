//! Thumbnail generation with URL memoization.
//!
//! Given a source image, a realm and a bounding box, [`ThumbnailCache`]
//! returns the URL of a shrunken copy, creating the copy on first use.
//!
//! ## Storage layout
//!
//! ```text
//! <media_root>/img/<realm plural>/thumbs/<W>x<H>/<source file name>
//! ```
//!
//! The output keeps the source file name, so its extension picks the
//! encoder. Two sources with the same file name in one realm share a
//! thumbnail; uploads are expected to carry unique names.
//!
//! ## Lookup
//!
//! 1. Build the [`ThumbnailKey`]. A source without a file name yields `None`.
//! 2. Return the memoized URL if the key is still live.
//! 3. Otherwise generate the file unless it is already on disk, build the
//!    URL, memoize it and return it.
//!
//! Generated files are never deleted. Two workers missing on the same key at
//! once may both encode the image; each writes to a private temp file and
//! renames it into place, so the result is the same either way.

use crate::cache::{CacheStats, UrlCache};
use crate::config::Settings;
use crate::imaging::{
    BackendError, ImageBackend, Quality, RustBackend, ThumbnailParams, is_supported_image,
};
use crate::types::Realm;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Directory name holding generated thumbnails inside a realm directory.
pub const THUMBS_DIR: &str = "thumbs";

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Image backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid thumbnail size {width}x{height}: both sides must be positive")]
    InvalidSize { width: u32, height: u32 },
}

/// Identity of one thumbnail: where it lives and how it is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    relative_path: String,
    absolute: bool,
}

impl ThumbnailKey {
    /// Returns `None` when `image` has no file name component.
    pub fn new(realm: &Realm, image: &Path, width: u32, height: u32, absolute: bool) -> Option<Self> {
        let file_name = image.file_name()?.to_string_lossy();
        Some(Self {
            relative_path: format!(
                "img/{}/{THUMBS_DIR}/{width}x{height}/{file_name}",
                realm.name_plural
            ),
            absolute,
        })
    }

    /// Path relative to the media root, always `/`-separated.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn absolute(&self) -> bool {
        self.absolute
    }

    pub fn cache_key(&self) -> String {
        format!("thumbs|{}|{}", self.relative_path, self.absolute)
    }
}

/// Outcome of warming a single source image.
#[derive(Debug)]
pub struct WarmOutcome {
    pub source: PathBuf,
    pub result: Result<Option<String>, ThumbnailError>,
}

/// Produces thumbnail URLs, generating files on demand through `B`.
pub struct ThumbnailCache<B: ImageBackend> {
    backend: B,
    media_root: PathBuf,
    media_url: String,
    site_url: String,
    quality: Quality,
    urls: UrlCache,
    stats: CacheStats,
}

impl ThumbnailCache<RustBackend> {
    /// Cache backed by the pure Rust image pipeline.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(RustBackend::new(), settings)
    }
}

impl<B: ImageBackend> ThumbnailCache<B> {
    pub fn new(backend: B, settings: &Settings) -> Self {
        Self {
            backend,
            media_root: settings.media_root(),
            media_url: settings.media_url.clone(),
            site_url: settings.site_url.clone(),
            quality: Quality::new(settings.thumbnails.quality),
            urls: UrlCache::new(settings.thumbnails.ttl()),
            stats: CacheStats::default(),
        }
    }

    /// Replace the memo with one using a different lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.urls = UrlCache::new(ttl);
        self
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// URL of `image` shrunk to fit `width` x `height`.
    ///
    /// `absolute` prefixes the site URL. Returns `Ok(None)` when `image` has
    /// no file name.
    pub fn get_thumbnail_url(
        &self,
        realm: &Realm,
        image: &Path,
        width: u32,
        height: u32,
        absolute: bool,
    ) -> Result<Option<String>, ThumbnailError> {
        if width == 0 || height == 0 {
            return Err(ThumbnailError::InvalidSize { width, height });
        }
        let Some(key) = ThumbnailKey::new(realm, image, width, height, absolute) else {
            debug!(source = %image.display(), "no file name, skipping thumbnail");
            return Ok(None);
        };

        let cache_key = key.cache_key();
        if let Some(url) = self.urls.get(&cache_key) {
            self.stats.hit();
            debug!(key = %cache_key, "thumbnail url cache hit");
            return Ok(Some(url));
        }
        self.stats.miss();
        debug!(key = %cache_key, "thumbnail url cache miss");

        let output = self.thumbnail_path(&key);
        if !output.exists()
            && let Err(e) = self.generate(image, &output, width, height)
        {
            self.stats.fail();
            return Err(e);
        }

        let url = self.url_for(&key);
        self.urls.insert(cache_key, url.clone());
        Ok(Some(url))
    }

    /// Filesystem location of the thumbnail described by `key`.
    pub fn thumbnail_path(&self, key: &ThumbnailKey) -> PathBuf {
        self.media_root.join(key.relative_path())
    }

    fn url_for(&self, key: &ThumbnailKey) -> String {
        let url = format!("{}{}", self.media_url, key.relative_path());
        if key.absolute() {
            format!("{}{}", self.site_url, url)
        } else {
            url
        }
    }

    fn generate(
        &self,
        source: &Path,
        output: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), ThumbnailError> {
        if let Some(dir) = output.parent() {
            match std::fs::create_dir_all(dir) {
                Err(e) if e.kind() != io::ErrorKind::AlreadyExists => return Err(e.into()),
                _ => {}
            }
        }

        let dims = self.backend.thumbnail(&ThumbnailParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            max_width: width,
            max_height: height,
            quality: self.quality,
        })?;
        self.stats.generate();
        info!(
            source = %source.display(),
            output = %output.display(),
            width = dims.width,
            height = dims.height,
            "generated thumbnail"
        );
        Ok(())
    }

    /// Generate thumbnails for many sources in parallel on the current rayon pool.
    ///
    /// Outcomes come back in input order. One failing source does not stop
    /// the others.
    pub fn warm(&self, realm: &Realm, images: &[PathBuf], width: u32, height: u32) -> Vec<WarmOutcome> {
        images
            .par_iter()
            .map(|source| WarmOutcome {
                source: source.clone(),
                result: self.get_thumbnail_url(realm, source, width, height, false),
            })
            .collect()
    }
}

/// Find every supported source image under `dir`, sorted by path.
///
/// Anything inside a `thumbs` directory is skipped so a media tree can be
/// warmed in place without thumbnailing its own thumbnails.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, ThumbnailError> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == THUMBS_DIR))
    {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop while walking media tree"))
        })?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();
    Ok(images)
}
