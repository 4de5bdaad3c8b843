//! Recognizer backed by the `tesseract` command-line engine.

use super::{LayoutHint, RecognizerConfig, TextRecognizer};
use crate::error::{Error, Result};
use crate::process::run_tool;
use crate::rendering::RasterImage;

/// Runs `tesseract stdin stdout` on each image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: RecognizerConfig,
}

impl TesseractRecognizer {
    /// Create a recognizer with the given configuration.
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    /// The configuration this recognizer was built with.
    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Check that the engine can be started.
    pub fn check_available(&self) -> Result<()> {
        run_tool(&self.config.command, ["--version"], None)
            .map(|_| ())
            .map_err(Error::Recognition)
    }

    fn arguments(&self, layout_hint: Option<LayoutHint>) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.config.language.clone(),
            "--dpi".to_string(),
            self.config.dpi.to_string(),
        ];
        if let Some(hint) = layout_hint.or(self.config.layout_hint) {
            args.push("--psm".to_string());
            args.push(hint.psm().to_string());
        }
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &RasterImage, layout_hint: Option<LayoutHint>) -> Result<String> {
        let args = self.arguments(layout_hint);
        log::debug!(
            "Recognizing {}x{} image with {} {}",
            image.width,
            image.height,
            self.config.command.display(),
            args.join(" ")
        );
        let stdout =
            run_tool(&self.config.command, &args, Some(image.as_bytes())).map_err(Error::Recognition)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
