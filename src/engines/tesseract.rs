//! Tesseract engine implementation
//!
//! Uses the tesseract-static crate for static linking (no system
//! dependencies). Downloads tessdata (training data) automatically on first
//! use unless an explicit tessdata directory is configured.

use crate::config::Config;
use crate::engine::{OcrResult, Recognizer};
use crate::error::OcrError;
use crate::reading_mode::ReadingMode;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR engine
pub struct TesseractRecognizer {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language used when a request does not name one
    default_language: String,
    /// Whether missing training data may be fetched into `tessdata_path`.
    /// True for the managed cache dir, false for an explicitly configured
    /// directory (which is never written to).
    auto_download: bool,
}

impl TesseractRecognizer {
    /// Create a new Tesseract-based recognizer.
    ///
    /// Fails with an initialization error when the training data for the
    /// configured language cannot be located or fetched.
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let default_language = config.default_language.clone();

        let (tessdata_path, auto_download) = match &config.tessdata_path {
            Some(path) => (validate_tessdata_dir(path, &default_language)?, false),
            None => (ensure_tessdata_available(&default_language)?, true),
        };

        // Validate that tessdata is usable with a test initialization
        let test_tess =
            Tesseract::new(Some(&tessdata_path), Some(&default_language)).map_err(|e| {
                OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
            })?;
        drop(test_tess);

        tracing::info!(
            "Tesseract engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            default_language
        );

        Ok(Self {
            tessdata_path,
            default_language,
            auto_download,
        })
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &image::DynamicImage,
        language: &str,
        mode: ReadingMode,
    ) -> Result<OcrResult, OcrError> {
        let language = if language.is_empty() {
            &self.default_language
        } else {
            language
        };

        ensure_language_available(&self.tessdata_path, language, self.auto_download)?;

        // Convert to RGB8 and encode as BMP in memory (BMP is always
        // supported by leptonica)
        let rgb_img = image.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            rgb_img
                .write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| {
                    OcrError::RecognitionError(format!("Failed to convert to BMP: {}", e))
                })?;
        }

        tracing::debug!(
            "Recognizing image: {}x{}, mode: {}, BMP size: {} bytes",
            width,
            height,
            mode.as_str(),
            bmp_data.len()
        );

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(language))
            .map_err(|e| OcrError::RecognitionError(format!("Failed to create Tesseract: {}", e)))?
            .set_variable("tessedit_pageseg_mode", mode.psm())
            .map_err(|e| {
                OcrError::RecognitionError(format!("Failed to set segmentation mode: {}", e))
            })?
            .set_image_from_mem(&bmp_data)
            .map_err(|e| {
                OcrError::RecognitionError(format!(
                    "Failed to set image ({}x{}, {} bytes): {}",
                    width,
                    height,
                    bmp_data.len(),
                    e
                ))
            })?
            .recognize()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to get text: {}", e)))?;

        // 0-100 scale, convert to 0.0-1.0
        let confidence = tess.mean_text_conf() as f32 / 100.0;

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence,
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/bmp".to_string(),
            "image/webp".to_string(),
            "image/tiff".to_string(),
        ]
    }

    fn supported_languages(&self) -> Vec<String> {
        vec![
            "eng".to_string(),     // English
            "deu".to_string(),     // German
            "fra".to_string(),     // French
            "spa".to_string(),     // Spanish
            "ita".to_string(),     // Italian
            "por".to_string(),     // Portuguese
            "nld".to_string(),     // Dutch
            "jpn".to_string(),     // Japanese
            "chi_sim".to_string(), // Chinese Simplified
            "chi_tra".to_string(), // Chinese Traditional
            "kor".to_string(),     // Korean
            "ara".to_string(),     // Arabic
            "rus".to_string(),     // Russian
        ]
    }
}

// ============================================================================
// Tessdata helpers
// ============================================================================

/// Check that an explicitly configured tessdata directory actually contains
/// training data for the language
fn validate_tessdata_dir(path: &str, language: &str) -> Result<String, OcrError> {
    let traineddata = Path::new(path).join(format!("{}.traineddata", language));
    if !traineddata.exists() {
        return Err(OcrError::InitializationError(format!(
            "No training data for '{}' in {}",
            language, path
        )));
    }
    Ok(path.to_string())
}

/// Ensure the managed tessdata cache dir exists and holds training data for
/// the default language, downloading it if needed
fn ensure_tessdata_available(language: &str) -> Result<String, OcrError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("textlens")
        .join("tessdata");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata directory: {}", e))
    })?;

    // Tesseract expects the directory, not the file
    let path = cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))?;

    ensure_language_available(&path, language, true)?;
    Ok(path)
}

/// Make sure training data for a requested language is present, fetching it
/// on first use in auto-download mode. An explicitly configured tessdata
/// directory is never written to; a language missing from it is a request
/// error, not an engine failure.
fn ensure_language_available(
    tessdata_path: &str,
    language: &str,
    auto_download: bool,
) -> Result<(), OcrError> {
    // The identifier names a traineddata file, so keep it to the characters
    // tessdata languages actually use ("eng", "chi_sim", ...)
    if language.is_empty()
        || !language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(OcrError::InvalidRequest(format!(
            "Invalid language identifier '{}'",
            language
        )));
    }

    let traineddata_path = Path::new(tessdata_path).join(format!("{}.traineddata", language));
    if traineddata_path.exists() {
        return Ok(());
    }

    if !auto_download {
        return Err(OcrError::InvalidRequest(format!(
            "No training data for '{}' in {}",
            language, tessdata_path
        )));
    }

    tracing::info!(
        "Downloading tessdata for '{}' (this may take a moment)...",
        language
    );
    download_file(&tessdata_url(language), &traineddata_path)?;
    tracing::info!("Downloaded tessdata to {:?}", traineddata_path);

    Ok(())
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download tessdata: {}", e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read tessdata response: {}", e))
    })?;

    write_atomic(path, &buffer)
}

/// Stage through a sibling temp file and rename into place, so an
/// interrupted write never leaves a partial file at the final path where the
/// cache-hit check would mistake it for valid training data
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), OcrError> {
    let staging = path.with_extension("download");

    let mut file = File::create(&staging).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata file: {}", e))
    })?;
    file.write_all(data).map_err(|e| {
        OcrError::InitializationError(format!("Failed to write tessdata file: {}", e))
    })?;

    std::fs::rename(&staging, path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to move tessdata into place: {}", e))
    })?;

    Ok(())
}
