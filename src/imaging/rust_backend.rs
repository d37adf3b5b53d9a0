//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate, format sniffed from content |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Colour conversion | `DynamicImage::to_rgb8` |
//! | Encode | format picked from the output extension; JPEG honours quality |
//!
//! Output is written to a temporary sibling file and renamed into place, so
//! a reader never observes a half-written thumbnail even when two requests
//! generate the same file at once.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::{Quality, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Extensions we accept as thumbnail sources, with the format they imply.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns the image file extensions that can be both decoded and re-encoded.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| e.eq_ignore_ascii_case(s))
        })
}

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}-{n}.tmp", std::process::id()))
}

/// Encode `img` in the format implied by `path`'s extension.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format for {}: {}",
            path.display(),
            e
        ))
    })?;

    let tmp = temp_sibling(path);
    let written = File::create(&tmp)
        .map_err(BackendError::Io)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            let result = match format {
                ImageFormat::Jpeg => img.write_with_encoder(JpegEncoder::new_with_quality(
                    &mut writer,
                    quality.value(),
                )),
                other => img.write_to(&mut writer, other),
            };
            result.map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to encode {}: {}",
                    path.display(),
                    e
                ))
            })?;
            writer.flush().map_err(BackendError::Io)
        })
        .and_then(|()| std::fs::rename(&tmp, path).map_err(BackendError::Io));

    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

impl ImageBackend for RustBackend {
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;

        let (width, height) = calculate_fit_dimensions(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        let fitted = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };

        let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());
        save_image(&rgb, &params.output, params.quality)?;
        Ok(Dimensions { width, height })
    }
}
