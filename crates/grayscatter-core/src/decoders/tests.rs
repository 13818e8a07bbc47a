//! Tests for image decoders

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::*;

fn write_png(path: &Path, width: u32, height: u32, color: ::png::ColorType, data: &[u8]) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = ::png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(color);
    encoder.set_depth(::png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(data).unwrap();
    writer.finish().unwrap();
}

// ============================================================================
// PNG Tests
// ============================================================================

#[test]
fn test_decode_rgb_png() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rgb.png");
    let data: Vec<u8> = (0..2 * 3 * 3).map(|v| v as u8 * 10).collect();
    write_png(&path, 2, 3, ::png::ColorType::Rgb, &data);

    let image = decode_image(&path).unwrap();

    assert_eq!((image.width, image.height, image.channels), (2, 3, 3));
    assert_eq!(image.pixels, data);
}

#[test]
fn test_decode_rgba_png_keeps_alpha() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rgba.png");
    let data = [255, 0, 0, 128, 0, 255, 0, 64];
    write_png(&path, 2, 1, ::png::ColorType::Rgba, &data);

    let image = decode_image(&path).unwrap();

    assert_eq!(image.channels, 4);
    assert_eq!(image.pixels, data);
}

#[test]
fn test_decode_gray_png() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gray.png");
    write_png(&path, 3, 1, ::png::ColorType::Grayscale, &[0, 128, 255]);

    let image = decode_image(&path).unwrap();

    assert_eq!(image.channels, 1);
    assert_eq!(image.pixels, vec![0, 128, 255]);
}

#[test]
fn test_decode_uppercase_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("upper.PNG");
    write_png(&path, 1, 1, ::png::ColorType::Rgb, &[1, 2, 3]);

    assert!(decode_image(&path).is_ok());
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_decode_missing_file_is_load_error() {
    let result = decode_image("/nonexistent/directory/missing.png");

    match result {
        Err(Error::Load { message, .. }) => assert!(message.contains("Failed to open PNG file")),
        other => panic!("expected load error, got {:?}", other),
    }
}

#[test]
fn test_decode_corrupt_png() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.png");
    fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(decode_image(&path), Err(Error::Load { .. })));
}

#[test]
fn test_decode_corrupt_jpeg() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.jpg");
    fs::write(&path, b"\xff\xd8 truncated").unwrap();

    assert!(matches!(decode_image(&path), Err(Error::Load { .. })));
}

#[test]
fn test_decode_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("image.bmp");
    fs::write(&path, b"BM").unwrap();

    match decode_image(&path) {
        Err(Error::Load { message, .. }) => {
            assert!(message.contains("Unsupported file format: bmp"));
            assert!(message.contains("png, jpg, jpeg"));
        }
        other => panic!("expected load error, got {:?}", other),
    }
}

#[test]
fn test_unsupported_extension_is_rejected_before_reading() {
    // the file does not exist; the extension check comes first
    match decode_image("missing.tiff") {
        Err(Error::Load { message, .. }) => assert!(message.contains("Unsupported file format")),
        other => panic!("expected load error, got {:?}", other),
    }
}

#[test]
fn test_decode_without_extension() {
    match decode_image("no_extension") {
        Err(Error::Load { message, .. }) => assert!(message.contains("No file extension")),
        other => panic!("expected load error, got {:?}", other),
    }
}

#[test]
fn test_check_layout_rejects_short_buffer() {
    let image = Image {
        width: 2,
        height: 2,
        channels: 3,
        pixels: vec![0; 11],
    };
    assert!(check_layout(&image).unwrap_err().contains("size mismatch"));
}
