//! Selfie payload decoding

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;

static DATA_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/[a-zA-Z0-9+\-.]+);base64,(.+)$").expect("data URL pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid selfie payload: {0}")]
pub struct InvalidAsset(pub String);

/// Decoded image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfieAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl SelfieAsset {
    pub fn from_data_url(data_url: &str) -> Result<Self, InvalidAsset> {
        let captures = DATA_URL_PATTERN
            .captures(data_url.trim())
            .ok_or_else(|| InvalidAsset("expected a base64 image data URL".to_string()))?;

        let content_type = captures[1].to_ascii_lowercase();
        let bytes = STANDARD
            .decode(captures[2].trim())
            .map_err(|e| InvalidAsset(format!("base64 decode failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(InvalidAsset("image is empty".to_string()));
        }

        Ok(Self { bytes, content_type })
    }

    /// Raster format named by the content type, if the decoder knows it
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.content_type)
    }

    /// File extension derived from the content type (`image/svg+xml` -> `svg`)
    pub fn extension(&self) -> &str {
        if let Some(ext) = self
            .format()
            .and_then(|format| format.extensions_str().first().copied())
        {
            return ext;
        }
        let subtype = self
            .content_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or("png");
        let subtype = subtype.split('+').next().unwrap_or(subtype);
        match subtype {
            "jpeg" => "jpg",
            "" => "png",
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_png() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode([1u8, 2, 3]));
        let asset = SelfieAsset::from_data_url(&url).unwrap();
        assert_eq!(asset.bytes, vec![1, 2, 3]);
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.extension(), "png");
    }

    #[test]
    fn test_extension_mapping() {
        let asset = |content_type: &str| SelfieAsset {
            bytes: vec![0],
            content_type: content_type.to_string(),
        };
        assert_eq!(asset("image/jpeg").extension(), "jpg");
        assert_eq!(asset("image/jpeg").format(), Some(ImageFormat::Jpeg));
        assert_eq!(asset("image/svg+xml").extension(), "svg");
        assert_eq!(asset("image/bmp").extension(), "bmp");
    }

    #[test]
    fn test_captured_snapshot_uploads_as_jpg() {
        use crate::capture::{RawFrame, Snapshot};

        let frame = RawFrame::new(2, 2, vec![40; 12]).unwrap();
        let snapshot = Snapshot::from_frame(&frame).unwrap();
        let asset = SelfieAsset::from_data_url(&snapshot.data_url).unwrap();
        assert_eq!(asset.content_type, "image/jpeg");
        assert_eq!(asset.extension(), "jpg");
        assert_eq!(image::guess_format(&asset.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(SelfieAsset::from_data_url("https://example.com/a.png").is_err());
        assert!(SelfieAsset::from_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(SelfieAsset::from_data_url("data:image/png;base64,***").is_err());
    }
}
