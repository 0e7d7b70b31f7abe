//! QR image generation: render a payload to a PNG byte buffer.

use std::io::Cursor;

use image::Luma;
use qrcode::QrCode;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG rendering failed: {0}")]
    Render(#[from] image::ImageError),
}

/// Render `text` as a QR code PNG. The symbol is scaled to at least
/// 256x256 with a quiet zone, which scanners on phone cameras handle well.
pub fn render_qr_png(text: &str) -> Result<Vec<u8>, GenerationError> {
    let code = QrCode::new(text.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(256, 256)
        .build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_valid_png() {
        let png = render_qr_png("https://example.com").unwrap();
        // PNG magic
        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

        let img = image::load_from_memory(&png).unwrap();
        assert!(img.width() >= 256);
        assert!(img.height() >= 256);
    }

    #[test]
    fn generated_code_round_trips_through_detection() {
        let png = render_qr_png("geo:52.52,13.40").unwrap();
        let raster = image::load_from_memory(&png).unwrap();
        let codes = crate::decoder::detect_in_raster(&raster);
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].content, "geo:52.52,13.40");
    }
}
