use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use crate::core::ExtractError;

/// One decoded frame at the source's native resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

/// Downscaled RGBA copy for the preview pane, ready for texture upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn display_copy(&self, width: u32, height: u32) -> DisplayFrame {
        let resized = imageops::resize(&self.image, width, height, FilterType::Triangle);
        let rgba = image::DynamicImage::ImageRgb8(resized).into_rgba8();
        DisplayFrame {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        }
    }

    pub fn write_jpeg(&self, path: &Path, quality: u8) -> Result<(), ExtractError> {
        let write_error = |source| ExtractError::Write {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(&self.image)
            .map_err(|source| ExtractError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        writer.flush().map_err(write_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| image::Rgb([(x * 8) as u8, (y * 8) as u8, 128]))
    }

    #[test]
    fn test_display_copy_is_resized_rgba() {
        let frame = Frame::new(0, gradient(32, 24));
        let display = frame.display_copy(16, 9);

        assert_eq!((display.width, display.height), (16, 9));
        assert_eq!(display.rgba.len(), 16 * 9 * 4);
        assert!(display.rgba.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_display_copy_keeps_solid_colors() {
        let frame = Frame::new(0, RgbImage::from_pixel(20, 20, image::Rgb([200, 10, 30])));
        let display = frame.display_copy(5, 5);
        assert_eq!(&display.rgba[..4], &[200, 10, 30, 255]);
    }

    #[test]
    fn test_write_jpeg_keeps_full_resolution() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("frame_0000.jpg");
        let frame = Frame::new(0, gradient(30, 20));

        frame.write_jpeg(&path, 90).expect("write jpeg");

        let decoded = image::open(&path).expect("decode jpeg");
        assert_eq!((decoded.width(), decoded.height()), (30, 20));
    }

    #[test]
    fn test_write_jpeg_reports_missing_directory() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("missing").join("frame_0000.jpg");
        let frame = Frame::new(0, gradient(4, 4));

        assert!(matches!(frame.write_jpeg(&path, 90), Err(ExtractError::Write { .. })));
    }
}
