//! Integration tests for input scanning and decoding.

use std::fs;

use image::{DynamicImage, GrayAlphaImage, LumaA, RgbImage};
use searchpdf::error::Error;
use searchpdf::input::{natural_sort, ImageLoader, LoadOptions};
use searchpdf::model::PagePixels;
use searchpdf::ImageFormat;
use tempfile::TempDir;

#[test]
fn test_scan_orders_naturally_and_filters() {
    let dir = TempDir::new().unwrap();
    for name in ["img10.png", "img2.PNG", "img1.jpg", "readme.md", "img3.tiff"] {
        fs::write(dir.path().join(name), b"x").unwrap();
    }
    fs::create_dir(dir.path().join("img0.png")).unwrap();

    let entries = ImageLoader::default().scan(dir.path()).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.file_name()).collect();
    assert_eq!(names, vec!["img1.jpg", "img2.PNG", "img3.tiff", "img10.png"]);
    assert_eq!(entries[3].index, 3);
}

#[test]
fn test_scan_custom_extensions() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.png"), b"x").unwrap();
    fs::write(dir.path().join("b.jpg"), b"x").unwrap();

    let loader = ImageLoader::new(LoadOptions::new().with_extensions(["jpg"]));
    let entries = loader.scan(dir.path()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name(), "b.jpg");
}

#[test]
fn test_scan_errors() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        ImageLoader::default().scan(dir.path().join("missing")),
        Err(Error::InputDirNotFound(_))
    ));
    assert!(matches!(
        ImageLoader::default().scan(dir.path()),
        Err(Error::NoImagesFound(_))
    ));
}

#[test]
fn test_load_flattens_alpha_to_gray() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mask.png");
    GrayAlphaImage::from_pixel(8, 4, LumaA([0, 0])).save(&path).unwrap();

    let loader = ImageLoader::default();
    let entry = loader.scan(dir.path()).unwrap().remove(0);
    let image = loader.load(&entry).unwrap();

    assert_eq!(image.dimensions(), (8, 4));
    assert_eq!(image.format, ImageFormat::Png);
    match &image.pixels {
        // Fully transparent black composites to white.
        PagePixels::Gray(gray) => assert_eq!(gray.get_pixel(0, 0).0, [255]),
        other => panic!("expected gray pixels, got {:?}", other.components()),
    }
}

#[test]
fn test_jpeg_bytes_kept_for_passthrough() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.jpg");
    DynamicImage::ImageRgb8(RgbImage::new(16, 16)).save(&path).unwrap();

    let loader = ImageLoader::default();
    let entry = loader.scan(dir.path()).unwrap().remove(0);
    assert!(loader.load(&entry).unwrap().jpeg_data.is_some());

    let loader = ImageLoader::new(LoadOptions::new().with_jpeg_passthrough(false));
    assert!(loader.load(&entry).unwrap().jpeg_data.is_none());
}

#[test]
fn test_mislabeled_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fake.png"), b"GIF89a....").unwrap();

    let loader = ImageLoader::default();
    let entry = loader.scan(dir.path()).unwrap().remove(0);
    assert!(matches!(loader.load(&entry), Err(Error::UnsupportedImage(_))));
}

#[test]
fn test_natural_sort_public() {
    let mut names = vec!["p100", "p20", "p3", "P1"];
    natural_sort(&mut names);
    assert_eq!(names, vec!["P1", "p3", "p20", "p100"]);
}
