//! End-to-end detection engine tests: generated images in, decoded and
//! classified payloads out. No database or network involved.

use std::io::Write;

use image::{DynamicImage, GrayImage, Luma};
use qrbox_core::models::QrContentKind;
use qrbox_processing::{decoder, detect_codes, generator, ProcessingError};

/// Render a QR for `payload` and paste it onto a larger white canvas, the
/// shape detection sees for real uploads.
fn image_with_payload(payload: &str) -> DynamicImage {
    let png = generator::render_qr_png(payload).expect("render");
    let symbol = image::load_from_memory(&png).expect("load").to_luma8();

    let mut canvas = GrayImage::from_pixel(600, 600, Luma([255u8]));
    image::imageops::overlay(&mut canvas, &symbol, 60, 60);
    DynamicImage::ImageLuma8(canvas)
}

fn write_temp_png(img: &DynamicImage) -> tempfile::TempPath {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("tempfile");
    let path = file.into_temp_path();
    img.save(&path).expect("save png");
    path
}

#[test]
fn blank_image_completes_with_zero_codes() {
    // 300x300 PNG with no QR code: success, empty result.
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 300, Luma([255u8])));
    let path = write_temp_png(&img);

    let codes = detect_codes(&path).expect("blank image is not an error");
    assert!(codes.is_empty());
}

#[test]
fn corrupt_file_is_a_fatal_processing_error() {
    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("tempfile");
    // PNG magic followed by garbage: decodes as nothing.
    file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0xDE, 0xAD])
        .expect("write");
    let path = file.into_temp_path();

    match detect_codes(&path) {
        Err(ProcessingError::InvalidImage(_)) => {}
        other => panic!("expected InvalidImage, got {:?}", other),
    }
}

#[test]
fn single_payload_yields_exactly_one_code() {
    // All three strategies will see the same symbol; dedup must collapse
    // them to one code with the exact payload.
    let payload = "https://example.com";
    let path = write_temp_png(&image_with_payload(payload));

    let codes = detect_codes(&path).expect("detect");
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].content, payload);
    assert_eq!(codes[0].kind, QrContentKind::Url);
    assert_eq!(codes[0].confidence, 1.0);
    assert!(codes[0].position_x.is_some());
}

#[test]
fn url_payload_content_preserved_exactly() {
    let payload = "https://example.com/path?a=1&b=two#frag";
    let codes = decoder::detect_in_raster(&image_with_payload(payload));
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].content, payload);
    assert_eq!(codes[0].kind, QrContentKind::Url);
}

#[test]
fn text_payload_classified_as_text() {
    let payload = "just some words";
    let codes = decoder::detect_in_raster(&image_with_payload(payload));
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].kind, QrContentKind::Text);
}

#[test]
fn wifi_payload_classified_as_wifi() {
    let payload = "WIFI:T:WPA;S:lab;P:hunter2;;";
    let codes = decoder::detect_in_raster(&image_with_payload(payload));
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].kind, QrContentKind::Wifi);
    assert_eq!(codes[0].content, payload);
}

#[test]
fn jpeg_source_also_detected() {
    // Detection works on the decoded raster, whatever container it came in.
    let img = image_with_payload("hello from jpeg");
    let file = tempfile::Builder::new()
        .suffix(".jpg")
        .tempfile()
        .expect("tempfile");
    let path = file.into_temp_path();
    img.to_rgb8().save(&path).expect("save jpeg");

    let codes = detect_codes(&path).expect("detect");
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].content, "hello from jpeg");
}
