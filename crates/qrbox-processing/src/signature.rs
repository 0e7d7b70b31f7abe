//! Magic-byte file-signature sniffing.
//!
//! The true binary format of an upload is determined from its leading bytes,
//! independently of the declared extension or Content-Type.

/// Image format identified from leading file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSignature {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageSignature {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageSignature::Jpeg => "image/jpeg",
            ImageSignature::Png => "image/png",
            ImageSignature::Gif => "image/gif",
            ImageSignature::Webp => "image/webp",
        }
    }

    /// Whether a declared Content-Type agrees with this signature.
    pub fn matches_content_type(&self, declared: &str) -> bool {
        let declared = declared.to_lowercase();
        match self {
            // image/jpg is a common non-standard alias
            ImageSignature::Jpeg => declared == "image/jpeg" || declared == "image/jpg",
            _ => declared == self.mime_type(),
        }
    }
}

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
// SOI + APPn/DQT marker variants seen in the wild
const JPEG_FOURTH_BYTES: [u8; 4] = [0xE0, 0xE1, 0xE8, 0xDB];

/// Identify an image format from the first bytes of a file. Returns `None`
/// for anything unrecognized or too short to carry a full signature.
pub fn sniff(bytes: &[u8]) -> Option<ImageSignature> {
    if bytes.len() >= 8 && bytes[..8] == PNG_MAGIC {
        return Some(ImageSignature::Png);
    }

    if bytes.len() >= 4
        && bytes[0] == 0xFF
        && bytes[1] == 0xD8
        && bytes[2] == 0xFF
        && JPEG_FOURTH_BYTES.contains(&bytes[3])
    {
        return Some(ImageSignature::Jpeg);
    }

    if bytes.len() >= 6 && (&bytes[..6] == b"GIF87a" || &bytes[..6] == b"GIF89a") {
        return Some(ImageSignature::Gif);
    }

    // RIFF container with WEBP fourcc at offset 8
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageSignature::Webp);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_png() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        assert_eq!(sniff(&bytes), Some(ImageSignature::Png));
    }

    #[test]
    fn sniff_jpeg_variants() {
        for fourth in JPEG_FOURTH_BYTES {
            let bytes = [0xFF, 0xD8, 0xFF, fourth, 0x00, 0x10];
            assert_eq!(sniff(&bytes), Some(ImageSignature::Jpeg));
        }
    }

    #[test]
    fn sniff_gif() {
        assert_eq!(sniff(b"GIF89a trailing"), Some(ImageSignature::Gif));
        assert_eq!(sniff(b"GIF87a trailing"), Some(ImageSignature::Gif));
    }

    #[test]
    fn sniff_webp_requires_fourcc() {
        let mut bytes = b"RIFF\x10\x00\x00\x00WEBP".to_vec();
        assert_eq!(sniff(&bytes), Some(ImageSignature::Webp));

        // RIFF container that is not WebP (e.g. WAVE audio)
        bytes[8..12].copy_from_slice(b"WAVE");
        assert_eq!(sniff(&bytes), None);
    }

    #[test]
    fn sniff_unrecognized_or_truncated() {
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(&[0xFF, 0xD8]), None);
        assert_eq!(sniff(b"not an image at all"), None);
    }

    #[test]
    fn content_type_match() {
        assert!(ImageSignature::Jpeg.matches_content_type("image/jpeg"));
        assert!(ImageSignature::Jpeg.matches_content_type("image/jpg"));
        assert!(ImageSignature::Jpeg.matches_content_type("IMAGE/JPEG"));
        assert!(!ImageSignature::Jpeg.matches_content_type("image/png"));
        assert!(ImageSignature::Png.matches_content_type("image/png"));
    }
}
