//! Text recognition boundary.
//!
//! The recognizer turns a rendered page into plain text. Its configuration is
//! fixed when it is constructed ([`RecognizerConfig`]); the optional
//! [`LayoutHint`] tells the engine what page layout to expect.

mod tesseract;

pub use tesseract::TesseractRecognizer;

use crate::error::{Error, Result};
use crate::rendering::RasterImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Page segmentation mode hint for the recognizer.
///
/// Values mirror tesseract's `--psm` modes that make sense for tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutHint {
    /// Orientation and script detection only
    OsdOnly,
    /// Automatic segmentation with orientation detection
    AutoOsd,
    /// Fully automatic segmentation (engine default)
    Auto,
    /// A single column of text of variable sizes
    SingleColumn,
    /// A single uniform block of vertically aligned text
    SingleBlockVertical,
    /// A single uniform block of text
    UniformBlock,
    /// A single text line
    SingleLine,
    /// Find as much text as possible in no particular order
    SparseText,
    /// Sparse text with orientation detection
    SparseTextOsd,
    /// Raw line, bypassing engine-specific hacks
    RawLine,
}

impl LayoutHint {
    /// Numeric page segmentation mode understood by tesseract.
    pub fn psm(&self) -> u8 {
        match self {
            Self::OsdOnly => 0,
            Self::AutoOsd => 1,
            Self::Auto => 3,
            Self::SingleColumn => 4,
            Self::SingleBlockVertical => 5,
            Self::UniformBlock => 6,
            Self::SingleLine => 7,
            Self::SparseText => 11,
            Self::SparseTextOsd => 12,
            Self::RawLine => 13,
        }
    }
}

impl TryFrom<u8> for LayoutHint {
    type Error = Error;

    fn try_from(psm: u8) -> Result<Self> {
        let hint = match psm {
            0 => Self::OsdOnly,
            1 => Self::AutoOsd,
            3 => Self::Auto,
            4 => Self::SingleColumn,
            5 => Self::SingleBlockVertical,
            6 => Self::UniformBlock,
            7 => Self::SingleLine,
            11 => Self::SparseText,
            12 => Self::SparseTextOsd,
            13 => Self::RawLine,
            other => {
                return Err(Error::Config(format!(
                    "unsupported page segmentation mode {}",
                    other
                )))
            },
        };
        Ok(hint)
    }
}

/// Construction-time configuration of a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerConfig {
    /// Recognizer executable
    pub command: PathBuf,
    /// Language code(s), e.g. `eng` or `eng+deu`
    pub language: String,
    /// Resolution hint matching the rendered images
    pub dpi: u32,
    /// Default page segmentation hint
    pub layout_hint: Option<LayoutHint>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            dpi: crate::config::DEFAULT_DPI,
            layout_hint: None,
        }
    }
}

impl RecognizerConfig {
    /// Derive the recognizer configuration from the batch configuration.
    pub fn from_extraction_config(config: &crate::config::ExtractionConfig) -> Self {
        Self {
            command: config.tools.tesseract.clone(),
            language: config.language.clone(),
            dpi: config.dpi,
            layout_hint: config.layout_hint,
        }
    }
}

/// Converts a raster image into text.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text of `image`.
    ///
    /// `layout_hint` overrides the recognizer's configured hint for this call.
    /// Fails with [`Error::Recognition`] when the engine is unavailable or
    /// crashes on the input.
    fn recognize(&self, image: &RasterImage, layout_hint: Option<LayoutHint>) -> Result<String>;
}
