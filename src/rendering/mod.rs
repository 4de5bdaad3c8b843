//! Page rasterization boundary.
//!
//! OCR needs a raster image of the page. Rendering itself is delegated to a
//! [`RasterRenderer`] implementation (see [`crate::poppler::PopplerTools`]);
//! this module defines the contract and the image type that crosses it.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_tables::rendering::{RasterRenderer, RenderOptions};
//!
//! let image = renderer.render(&handle, 1, &RenderOptions::with_dpi(300))?;
//! image.save("page1.png")?;
//! ```

mod page_renderer;

pub use page_renderer::{ImageFormat, RasterImage, RenderOptions};

use crate::document::DocumentHandle;
use crate::error::Result;

/// Renders one page of a document to a raster image.
pub trait RasterRenderer: Send + Sync {
    /// Render the 1-based `page` of `document`.
    ///
    /// Fails with [`crate::Error::Render`] when the page cannot be rasterized.
    fn render(
        &self,
        document: &DocumentHandle<'_>,
        page: usize,
        options: &RenderOptions,
    ) -> Result<RasterImage>;
}
