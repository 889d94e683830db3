//! Still frames and their encoding
//!
//! Frames arrive as packed RGB8. A snapshot is the mirrored frame encoded as
//! a JPEG and wrapped in a base64 data URL, which is what the intake stores
//! and the submission pipeline uploads.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ImageFormat, RgbImage};
use serde::Serialize;

/// Format of encoded snapshots
pub const SNAPSHOT_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Content type of encoded snapshots
pub const SNAPSHOT_CONTENT_TYPE: &str = "image/jpeg";

/// Encoder quality, matching a browser canvas JPEG export
pub const SNAPSHOT_JPEG_QUALITY: u8 = 92;

/// Frame dimensions do not match the pixel buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
pub struct FrameSizeError {
    pub width: u32,
    pub height: u32,
    pub expected: usize,
    pub actual: usize,
}

/// One packed RGB8 frame, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    image: RgbImage,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, FrameSizeError> {
        let expected = width as usize * height as usize * 3;
        let actual = rgb.len();
        let size_error = FrameSizeError {
            width,
            height,
            expected,
            actual,
        };
        if width == 0 || height == 0 || actual != expected {
            return Err(size_error);
        }
        let image = RgbImage::from_raw(width, height, rgb).ok_or(size_error)?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Horizontally flipped copy (what a front-facing preview shows)
    pub fn mirrored(&self) -> RawFrame {
        RawFrame {
            image: imageops::flip_horizontal(&self.image),
        }
    }

    pub fn to_jpeg(&self, quality: u8) -> image::ImageResult<Vec<u8>> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality).encode_image(&self.image)?;
        Ok(out)
    }
}

/// A captured still, ready to store on the intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub data_url: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Mirror `frame` and encode it as a JPEG data URL
    pub fn from_frame(frame: &RawFrame) -> image::ImageResult<Self> {
        let jpeg = frame.mirrored().to_jpeg(SNAPSHOT_JPEG_QUALITY)?;
        Ok(Self {
            data_url: format!("data:{};base64,{}", SNAPSHOT_CONTENT_TYPE, STANDARD.encode(jpeg)),
            content_type: SNAPSHOT_CONTENT_TYPE.to_string(),
            width: frame.width(),
            height: frame.height(),
            captured_at: Utc::now(),
        })
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        self.data_url
            .split_once(',')
            .map(|(_, payload)| payload.len() / 4 * 3)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_one() -> RawFrame {
        // left pixel red, right pixel blue
        RawFrame::new(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap()
    }

    /// 32x16, left half red and right half blue
    fn split_frame() -> RawFrame {
        let mut rgb = Vec::with_capacity(32 * 16 * 3);
        for _ in 0..16 {
            for x in 0..32 {
                rgb.extend_from_slice(if x < 16 { &[255, 0, 0] } else { &[0, 0, 255] });
            }
        }
        RawFrame::new(32, 16, rgb).unwrap()
    }

    fn decode(snapshot: &Snapshot) -> RgbImage {
        let encoded = snapshot
            .data_url
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), SNAPSHOT_FORMAT);
        image::load_from_memory_with_format(&bytes, SNAPSHOT_FORMAT)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let err = RawFrame::new(2, 2, vec![0; 11]).unwrap_err();
        assert_eq!(err.expected, 12);
        assert_eq!(err.actual, 11);
        assert!(RawFrame::new(0, 4, vec![]).is_err());
    }

    #[test]
    fn test_mirror_swaps_columns() {
        let mirrored = two_by_one().mirrored();
        assert_eq!(mirrored.pixel(0, 0), [0, 0, 255]);
        assert_eq!(mirrored.pixel(1, 0), [255, 0, 0]);
    }

    #[test]
    fn test_snapshot_is_mirrored_jpeg() {
        let snapshot = Snapshot::from_frame(&split_frame()).unwrap();
        assert_eq!(snapshot.content_type, "image/jpeg");
        assert_eq!((snapshot.width, snapshot.height), (32, 16));

        let decoded = decode(&snapshot);
        assert_eq!(decoded.dimensions(), (32, 16));

        // Lossy, so compare channels loosely
        let [r, _, b] = decoded.get_pixel(4, 8).0;
        assert!(b > 150 && r < 100, "left side should be blue, got r={} b={}", r, b);
        let [r, _, b] = decoded.get_pixel(27, 8).0;
        assert!(r > 150 && b < 100, "right side should be red, got r={} b={}", r, b);
    }

    #[test]
    fn test_jpeg_is_smaller_than_raw() {
        let mut rgb = Vec::with_capacity(640 * 480 * 3);
        for y in 0..480u32 {
            for x in 0..640u32 {
                rgb.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128]);
            }
        }
        let frame = RawFrame::new(640, 480, rgb).unwrap();
        let snapshot = Snapshot::from_frame(&frame).unwrap();
        assert!(snapshot.encoded_len() < 640 * 480 * 3 / 4);
    }
}
