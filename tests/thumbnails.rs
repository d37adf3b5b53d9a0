//! End-to-end thumbnail generation through the real image pipeline.
//!
//! Builds a throwaway media tree in a temp directory, asks the cache for
//! thumbnails and checks both the returned URLs and the files on disk.

use image::{ImageEncoder, RgbImage, RgbaImage};
use pythonz::config::Settings;
use pythonz::thumbnail::{ThumbnailCache, collect_images};
use pythonz::types::Realm;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let file = std::fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn settings(media_root: &Path) -> Settings {
    Settings {
        media_root: media_root.to_string_lossy().into_owned(),
        ..Settings::default()
    }
}

#[test]
fn thumbnail_fits_box_and_url_is_stable() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("img/articles/cover.jpg");
    write_jpeg(&source, 1200, 800);
    let cache = ThumbnailCache::from_settings(&settings(tmp.path()));

    let first = cache
        .get_thumbnail_url(&Realm::article(), &source, 300, 300, false)
        .unwrap()
        .unwrap();
    let second = cache
        .get_thumbnail_url(&Realm::article(), &source, 300, 300, false)
        .unwrap()
        .unwrap();

    assert_eq!(first, "/media/img/articles/thumbs/300x300/cover.jpg");
    assert_eq!(first, second);

    let thumb = tmp.path().join("img/articles/thumbs/300x300/cover.jpg");
    let (w, h) = image::image_dimensions(&thumb).unwrap();
    assert_eq!((w, h), (300, 200));
    assert_eq!(cache.stats().generated(), 1);
    assert_eq!(cache.stats().hits(), 1);
}

#[test]
fn fresh_cache_reuses_file_on_disk() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("img/videos/clip.jpg");
    write_jpeg(&source, 640, 360);

    let first = ThumbnailCache::from_settings(&settings(tmp.path()));
    first
        .get_thumbnail_url(&Realm::video(), &source, 160, 160, true)
        .unwrap();

    let restarted = ThumbnailCache::from_settings(&settings(tmp.path()));
    let url = restarted
        .get_thumbnail_url(&Realm::video(), &source, 160, 160, true)
        .unwrap();

    assert_eq!(
        url.as_deref(),
        Some("http://pythonz.net/media/img/videos/thumbs/160x160/clip.jpg")
    );
    assert_eq!(restarted.stats().generated(), 0);
    assert_eq!(restarted.stats().on_disk(), 1);
}

#[test]
fn png_with_alpha_stays_png_without_alpha() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("img/events/logo.png");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(100, 50, image::Rgba([200, 10, 10, 100]))
        .save(&source)
        .unwrap();
    let cache = ThumbnailCache::from_settings(&settings(tmp.path()));

    cache
        .get_thumbnail_url(&Realm::event(), &source, 40, 40, false)
        .unwrap();

    let thumb = image::open(tmp.path().join("img/events/thumbs/40x40/logo.png")).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (40, 20));
    assert_eq!(thumb.color(), image::ColorType::Rgb8);
}

#[test]
fn missing_source_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let cache = ThumbnailCache::from_settings(&settings(tmp.path()));

    let result = cache.get_thumbnail_url(
        &Realm::article(),
        &tmp.path().join("nope.jpg"),
        10,
        10,
        false,
    );

    assert!(result.is_err());
    assert_eq!(cache.stats().failed(), 1);
}

#[test]
fn warm_media_tree_in_place() {
    let tmp = TempDir::new().unwrap();
    let realm_dir = tmp.path().join("img/articles");
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        write_jpeg(&realm_dir.join(name), 400, 400);
    }
    let cache = ThumbnailCache::from_settings(&settings(tmp.path()));

    let images = collect_images(&realm_dir).unwrap();
    let outcomes = cache.warm(&Realm::article(), &images, 100, 100);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| matches!(o.result, Ok(Some(_)))));

    // A second walk must not pick up the thumbnails just written.
    let again: Vec<PathBuf> = collect_images(&realm_dir).unwrap();
    assert_eq!(again, images);
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        let thumb = realm_dir.join("thumbs/100x100").join(name);
        assert_eq!(image::image_dimensions(thumb).unwrap(), (100, 100));
    }
}

#[test]
fn warm_same_source_concurrently() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("img/articles/cover.jpg");
    write_jpeg(&source, 1200, 800);
    let cache = ThumbnailCache::from_settings(&settings(tmp.path()));
    let images = vec![source; 32];

    let outcomes = cache.warm(&Realm::article(), &images, 120, 120);

    assert_eq!(outcomes.len(), 32);
    for outcome in &outcomes {
        assert_eq!(
            outcome.result.as_ref().unwrap().as_deref(),
            Some("/media/img/articles/thumbs/120x120/cover.jpg")
        );
    }
    let stats = cache.stats();
    assert_eq!(stats.failed(), 0);
    assert!(stats.generated() >= 1);
    assert_eq!(stats.total(), 32);

    let thumbs_dir = tmp.path().join("img/articles/thumbs/120x120");
    let names: Vec<String> = std::fs::read_dir(&thumbs_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["cover.jpg"]);
    assert_eq!(
        image::image_dimensions(thumbs_dir.join("cover.jpg")).unwrap(),
        (120, 80)
    );
}
