//! Collaborators backed by the poppler command-line utilities.
//!
//! - `pdfinfo` reports the page count ([`DocumentInspector`])
//! - `pdftotext -bbox` yields positioned words ([`TextLayerSource`])
//! - `pdftoppm` rasterizes pages ([`RasterRenderer`])
//!
//! All three read the staged copy of the document from
//! [`DocumentHandle::path`].

use crate::config::ToolPaths;
use crate::document::DocumentHandle;
use crate::error::{Error, Result};
use crate::extractors::{DocumentInspector, TextLayerSource, TextWord};
use crate::geometry::Rect;
use crate::process::run_tool;
use crate::rendering::{ImageFormat, RasterImage, RasterRenderer, RenderOptions};
use lazy_static::lazy_static;
use regex::Regex;
use std::ffi::OsStr;

lazy_static! {
    static ref PAGES_RE: Regex = Regex::new(r"(?m)^Pages:\s+(\d+)").unwrap();
    static ref WORD_RE: Regex = Regex::new(
        r#"<word xMin="([-\d.]+)" yMin="([-\d.]+)" xMax="([-\d.]+)" yMax="([-\d.]+)">(.*?)</word>"#
    )
    .unwrap();
}

/// Poppler utilities located by [`ToolPaths`].
#[derive(Debug, Clone, Default)]
pub struct PopplerTools {
    paths: ToolPaths,
}

impl PopplerTools {
    /// Create the adapter from tool locations.
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    /// Tool locations in use.
    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }
}

impl DocumentInspector for PopplerTools {
    fn page_count(&self, document: &DocumentHandle<'_>) -> Result<usize> {
        let path = document.path()?;
        let stdout = run_tool(&self.paths.pdfinfo, [path], None)
            .map_err(|reason| Error::document_open(document.identifier(), reason))?;
        parse_page_count(&String::from_utf8_lossy(&stdout))
            .ok_or_else(|| Error::document_open(document.identifier(), "pdfinfo reported no page count"))
    }
}

impl TextLayerSource for PopplerTools {
    fn words(&self, document: &DocumentHandle<'_>, page: usize) -> Result<Vec<TextWord>> {
        let path = document.path()?;
        let page_arg = page.to_string();
        let args: [&OsStr; 7] = [
            OsStr::new("-f"),
            OsStr::new(&page_arg),
            OsStr::new("-l"),
            OsStr::new(&page_arg),
            OsStr::new("-bbox"),
            path.as_os_str(),
            OsStr::new("-"),
        ];
        let stdout = run_tool(&self.paths.pdftotext, args, None)
            .map_err(|reason| Error::Parse { page, reason })?;
        Ok(parse_bbox_words(&String::from_utf8_lossy(&stdout)))
    }
}

impl RasterRenderer for PopplerTools {
    fn render(
        &self,
        document: &DocumentHandle<'_>,
        page: usize,
        options: &RenderOptions,
    ) -> Result<RasterImage> {
        let path = document.path()?;
        let render_error = |reason: String| Error::Render { page, reason };

        let out_dir = tempfile::tempdir().map_err(|e| render_error(e.to_string()))?;
        let prefix = out_dir.path().join("page");
        let format_flag = match options.format {
            ImageFormat::Png => "-png",
            ImageFormat::Jpeg => "-jpeg",
            ImageFormat::Tiff => "-tiff",
        };
        let page_arg = page.to_string();
        let dpi_arg = options.dpi.to_string();
        let args: [&OsStr; 10] = [
            OsStr::new("-f"),
            OsStr::new(&page_arg),
            OsStr::new("-l"),
            OsStr::new(&page_arg),
            OsStr::new("-r"),
            OsStr::new(&dpi_arg),
            OsStr::new(format_flag),
            OsStr::new("-singlefile"),
            path.as_os_str(),
            prefix.as_os_str(),
        ];
        run_tool(&self.paths.pdftoppm, args, None).map_err(render_error)?;

        let output = prefix.with_extension(options.format.extension());
        let data = std::fs::read(&output)
            .map_err(|e| render_error(format!("missing output {}: {}", output.display(), e)))?;
        RasterImage::from_encoded(data, options.dpi, page)
    }
}

/// Page count from `pdfinfo` output.
pub fn parse_page_count(info: &str) -> Option<usize> {
    PAGES_RE
        .captures(info)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Positioned words from `pdftotext -bbox` output.
///
/// Words with unparsable coordinates or blank text are skipped.
pub fn parse_bbox_words(xhtml: &str) -> Vec<TextWord> {
    WORD_RE
        .captures_iter(xhtml)
        .filter_map(|caps| {
            let coord = |i: usize| caps.get(i)?.as_str().parse::<f32>().ok();
            let (x0, y0, x1, y1) = (coord(1)?, coord(2)?, coord(3)?, coord(4)?);
            let raw = caps.get(5)?.as_str();
            let text = quick_xml::escape::unescape(raw)
                .map(|t| t.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            if text.trim().is_empty() {
                return None;
            }
            Some(TextWord::new(text, Rect::from_points(x0, y0, x1, y1)))
        })
        .collect()
}
