//! QR detection engine.
//!
//! Decodes the stored raster once, then runs the symbol decoder over three
//! variants of the grayscale image: unmodified, and two contrast-enhanced
//! versions at distinct coefficients. A variant finding nothing is normal;
//! only an unreadable raster fails the whole call. Results are unioned in
//! strategy-run order and deduplicated by exact payload text, first
//! occurrence winning.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use qrbox_core::models::NewQrCode;

use crate::classifier;

/// Contrast coefficients for the two enhancement strategies, mirroring the
/// mid/strong enhancement pair the detection pipeline was tuned with.
pub const CONTRAST_COEFFICIENTS: [f32; 2] = [50.0, 100.0];

/// Fatal detection failures. Anything below raster level (a strategy not
/// finding a symbol, a grid failing to decode) is recovered internally.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    // image::open folds IO failures (missing/truncated files) into ImageError.
    #[error("Failed to decode image: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// One raw detection before dedup: payload text plus the locating strategy's
/// position estimate.
#[derive(Debug, Clone)]
struct RawDetection {
    content: String,
    position: Option<(i32, i32)>,
}

/// Decode the image at `path` and return the deduplicated, classified codes.
///
/// Invoked exactly once per upload, off the request path. Zero codes is a
/// successful outcome.
pub fn detect_codes(path: &Path) -> Result<Vec<NewQrCode>, ProcessingError> {
    let raster = image::open(path)?;
    tracing::debug!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        "Decoded raster for QR detection"
    );
    Ok(detect_in_raster(&raster))
}

/// Run all detection strategies against an already-decoded raster.
pub fn detect_in_raster(raster: &DynamicImage) -> Vec<NewQrCode> {
    // Grayscale removes color-channel noise before symbol recognition.
    let gray = raster.to_luma8();

    let mut found = Vec::new();

    // Strategy 1: unmodified grayscale.
    found.extend(decode_variant(gray.clone(), "grayscale"));

    // Strategies 2..: contrast-enhanced variants. All strategies always run;
    // recall beats early exit here and dedup collapses the overlap.
    for coefficient in CONTRAST_COEFFICIENTS {
        let variant = image::imageops::contrast(&gray, coefficient);
        found.extend(decode_variant(variant, "contrast"));
    }

    dedup_and_classify(found)
}

/// Decode one raster variant. Symbol-level failures are logged and yield
/// zero codes for this variant; they never propagate.
fn decode_variant(img: GrayImage, strategy: &str) -> Vec<RawDetection> {
    let mut prepared = rqrr::PreparedImage::prepare(img);
    let grids = prepared.detect_grids();

    let mut detections = Vec::new();
    for grid in grids {
        let top_left = grid.bounds[0];
        match grid.decode() {
            Ok((_meta, content)) => {
                detections.push(RawDetection {
                    content,
                    position: Some((top_left.x, top_left.y)),
                });
            }
            Err(e) => {
                tracing::warn!(strategy, error = %e, "Grid decode failed, skipping symbol");
            }
        }
    }

    detections
}

/// Collapse detections sharing identical payload text into one code each,
/// keeping the first occurrence's position and preserving strategy-run order.
fn dedup_and_classify(found: Vec<RawDetection>) -> Vec<NewQrCode> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();

    for detection in found {
        if !seen.insert(detection.content.clone()) {
            continue;
        }
        let kind = classifier::classify(&detection.content);
        unique.push(NewQrCode {
            kind,
            position_x: detection.position.map(|(x, _)| x),
            position_y: detection.position.map(|(_, y)| y),
            // The symbol decoder exposes no confidence measure; a decoded
            // grid passed its error correction, so report certainty.
            confidence: 1.0,
            content: detection.content,
        });
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrbox_core::models::QrContentKind;

    fn raw(content: &str, x: i32) -> RawDetection {
        RawDetection {
            content: content.to_string(),
            position: Some((x, 0)),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let unique = dedup_and_classify(vec![
            raw("https://example.com", 10),
            raw("https://example.com", 99),
            raw("second", 20),
        ]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].content, "https://example.com");
        // Position from the first strategy that found it, not the later duplicate.
        assert_eq!(unique[0].position_x, Some(10));
        assert_eq!(unique[1].content, "second");
    }

    #[test]
    fn dedup_preserves_strategy_order() {
        let unique = dedup_and_classify(vec![raw("b", 0), raw("a", 1), raw("b", 2), raw("c", 3)]);
        let contents: Vec<_> = unique.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "a", "c"]);
    }

    #[test]
    fn dedup_classifies_each_payload() {
        let unique = dedup_and_classify(vec![raw("https://example.com", 0), raw("plain", 1)]);
        assert_eq!(unique[0].kind, QrContentKind::Url);
        assert_eq!(unique[1].kind, QrContentKind::Text);
        assert_eq!(unique[0].confidence, 1.0);
    }

    #[test]
    fn blank_raster_finds_nothing() {
        let raster = DynamicImage::ImageLuma8(GrayImage::from_pixel(
            300,
            300,
            image::Luma([255u8]),
        ));
        assert!(detect_in_raster(&raster).is_empty());
    }
}
