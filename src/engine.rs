use crate::error::OcrError;
use crate::reading_mode::ReadingMode;
use image::DynamicImage;

/// OCR recognition result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
}

impl OcrResult {
    /// Recognition succeeded but produced no text
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Seam between the preprocessing pipeline and the recognition engine
pub trait Recognizer: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Recognize text in a preprocessed image.
    ///
    /// An empty result is a normal outcome, not an error; errors are
    /// technical failures of the engine itself.
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        mode: ReadingMode,
    ) -> Result<OcrResult, OcrError>;

    /// Get supported MIME types
    fn supported_formats(&self) -> Vec<String>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
