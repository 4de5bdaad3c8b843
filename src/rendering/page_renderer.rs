//! Rendering options and rendered page images.

use crate::config::DEFAULT_DPI;
use crate::error::{Error, Result};
use std::io::Cursor;

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless)
    #[default]
    Png,
    /// JPEG format (lossy, smaller file size)
    Jpeg,
    /// TIFF format
    Tiff,
}

impl ImageFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Tiff => "tif",
        }
    }

    fn from_image_crate(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// Options for page rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Dots per inch (default: 300)
    pub dpi: u32,
    /// Requested output format
    pub format: ImageFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            format: ImageFormat::Png,
        }
    }
}

impl RenderOptions {
    /// Create options with custom DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }
}

/// A rendered page, kept in its encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoding of `data`
    pub format: ImageFormat,
    /// Resolution the page was rendered at
    pub dpi: u32,
}

impl RasterImage {
    /// Wrap encoded image bytes, reading format and dimensions from the header.
    ///
    /// `page` is only used for error reporting.
    pub fn from_encoded(data: Vec<u8>, dpi: u32, page: usize) -> Result<Self> {
        let render_error = |reason: String| Error::Render { page, reason };

        let reader = image::io::Reader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|e| render_error(format!("unreadable image: {}", e)))?;
        let format = reader
            .format()
            .and_then(ImageFormat::from_image_crate)
            .ok_or_else(|| render_error("unsupported image format".to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| render_error(format!("corrupt image: {}", e)))?;
        if width == 0 || height == 0 {
            return Err(render_error("rendered image is empty".to_string()));
        }

        Ok(Self {
            data,
            width,
            height,
            format,
            dpi,
        })
    }

    /// Save the image to a file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.data)?;
        Ok(())
    }

    /// Get the image data as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::GrayImage::from_pixel(width, height, image::Luma([255u8]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.dpi, 300);
        assert_eq!(options.format, ImageFormat::Png);
        assert_eq!(RenderOptions::with_dpi(150).dpi, 150);
    }

    #[test]
    fn test_from_encoded_reads_dimensions() {
        let image = RasterImage::from_encoded(png_bytes(12, 7), 300, 1).unwrap();
        assert_eq!(image.width, 12);
        assert_eq!(image.height, 7);
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.dpi, 300);
    }

    #[test]
    fn test_from_encoded_rejects_garbage() {
        let err = RasterImage::from_encoded(b"not an image".to_vec(), 300, 3).unwrap_err();
        assert!(matches!(err, Error::Render { page: 3, .. }));
    }

    #[test]
    fn test_extension() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }
}
