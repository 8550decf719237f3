//! Video frame type

use image::RgbImage;

use crate::SourceError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Presentation timestamp (nanoseconds from stream start)
    pub timestamp_ns: u64,
    /// Zero-based position in the stream
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        timestamp_ns: u64,
        sequence: u64,
    ) -> Result<Self, SourceError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SourceError::InvalidFrame(format!(
                "{}x{} RGB frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        })
    }

    /// Solid-color frame, mostly useful for tests and placeholders
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u64) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            timestamp_ns: 0,
            sequence,
        }
    }

    pub fn from_rgb_image(img: RgbImage, timestamp_ns: u64, sequence: u64) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Copy into an `image` buffer for encoding or drawing
    pub fn to_rgb_image(&self) -> Result<RgbImage, SourceError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            SourceError::InvalidFrame(format!(
                "buffer of {} bytes does not fit {}x{}",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(VideoFrame::new(vec![0; 12], 2, 2, 0, 0).is_ok());
        assert!(VideoFrame::new(vec![0; 11], 2, 2, 0, 0).is_err());
    }

    #[test]
    fn test_filled_and_pixel_access() {
        let frame = VideoFrame::filled(4, 3, [10, 20, 30], 7);
        assert_eq!(frame.data.len(), 36);
        assert_eq!(frame.get_pixel(3, 2), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(4, 0), None);
        assert_eq!(frame.sequence, 7);
    }

    #[test]
    fn test_image_conversion() {
        let frame = VideoFrame::filled(5, 2, [1, 2, 3], 0);
        let img = frame.to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (5, 2));
        let back = VideoFrame::from_rgb_image(img, 40, 1);
        assert_eq!(back.data, frame.data);
        assert_eq!(back.timestamp_ns, 40);
    }
}
