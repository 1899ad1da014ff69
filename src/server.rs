use crate::config::Config;
use crate::engine::Recognizer;
use crate::engines::tesseract::TesseractRecognizer;
use crate::error::OcrError;
use crate::preprocessing::{Pipeline, PreprocessOptions, StepTiming};
use crate::reading_mode::ReadingMode;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

const NO_TEXT_HINT: &str =
    "No text detected. Try enabling color inversion or adjusting the threshold.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recognizer: Arc<dyn Recognizer>,
    pub config: Arc<Config>,
}

/// Preprocessing stats reported back to the client
#[derive(Debug, Serialize)]
pub struct PreprocessingSummary {
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Recognition response
#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    pub text: String,
    pub confidence: f32,
    /// True when the engine ran successfully but found no text
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub processing_time_ms: u64,
    pub preprocessing: PreprocessingSummary,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub supported_formats: Vec<String>,
    pub supported_languages: Vec<String>,
    pub max_file_size_bytes: usize,
    pub default_language: String,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let recognizer = TesseractRecognizer::new(&config)?;
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState {
        recognizer: Arc::new(recognizer),
        config: Arc::new(config),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;
    Router::new()
        .route("/recognize", post(handle_recognize))
        .route("/preview", post(handle_preview))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fields parsed from the multipart upload form
struct UploadForm {
    data: Bytes,
    options: PreprocessOptions,
    mode: ReadingMode,
    language: Option<String>,
}

async fn parse_form(mut multipart: Multipart, max_file_size: usize) -> Result<UploadForm, OcrError> {
    let mut file_data: Option<Bytes> = None;
    let mut options = PreprocessOptions::default();
    let mut mode = ReadingMode::default();
    let mut language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "invert" => {
                options.invert = parse_bool_field("invert", &field_text(field).await?)?;
            }
            "binarize" => {
                options.binarize = parse_bool_field("binarize", &field_text(field).await?)?;
            }
            "threshold" => {
                let raw = field_text(field).await?;
                options.threshold = raw.trim().parse::<u8>().map_err(|_| {
                    OcrError::InvalidRequest(format!(
                        "threshold must be an integer in 0..=255, got '{}'",
                        raw
                    ))
                })?;
            }
            "mode" => {
                let raw = field_text(field).await?;
                mode = ReadingMode::from_str(&raw).ok_or_else(|| {
                    OcrError::InvalidRequest(format!(
                        "mode must be one of 'block', 'line', 'word', got '{}'",
                        raw
                    ))
                })?;
            }
            "language" => {
                language = Some(field_text(field).await?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(OcrError::MissingFile)?;

    if data.len() > max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: data.len(),
            max: max_file_size,
        });
    }

    Ok(UploadForm {
        data,
        options,
        mode,
        language,
    })
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, OcrError> {
    field
        .text()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Invalid form field: {}", e)))
}

fn parse_bool_field(name: &str, raw: &str) -> Result<bool, OcrError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" | "" => Ok(false),
        _ => Err(OcrError::InvalidRequest(format!(
            "{} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}

/// Decode, preprocess, and recognize one upload.
///
/// The whole flow is a linear pipeline over transient values; nothing is
/// cached or kept past the invocation.
fn run_recognition(
    recognizer: &dyn Recognizer,
    data: &[u8],
    options: PreprocessOptions,
    mode: ReadingMode,
    language: &str,
) -> Result<RecognizeResponse, OcrError> {
    let start = Instant::now();

    let image = image::load_from_memory(data)
        .map_err(|e| OcrError::UndecodableImage(e.to_string()))?;

    let preprocessed = Pipeline::new(options).process(image)?;

    let result = recognizer.recognize(&preprocessed.image, language, mode)?;

    let empty = result.is_empty();
    let hint = empty.then(|| NO_TEXT_HINT.to_string());

    Ok(RecognizeResponse {
        text: result.text,
        confidence: result.confidence,
        empty,
        hint,
        processing_time_ms: start.elapsed().as_millis() as u64,
        preprocessing: PreprocessingSummary {
            total_time_ms: preprocessed.total_time_ms,
            steps: preprocessed.steps,
        },
    })
}

/// Handle recognition requests
async fn handle_recognize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RecognizeResponse>, OcrError> {
    let form = parse_form(multipart, state.config.max_file_size).await?;
    let language = form
        .language
        .unwrap_or_else(|| state.config.default_language.clone());

    let response = run_recognition(
        state.recognizer.as_ref(),
        &form.data,
        form.options,
        form.mode,
        &language,
    )?;

    tracing::info!(
        "Recognition completed in {}ms, confidence: {:.2}, text length: {}",
        response.processing_time_ms,
        response.confidence,
        response.text.len()
    );

    Ok(Json(response))
}

/// Handle preview requests: return the preprocessed image as PNG so the
/// client can show what the engine will actually see
async fn handle_preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, OcrError> {
    let form = parse_form(multipart, state.config.max_file_size).await?;

    let image = image::load_from_memory(&form.data)
        .map_err(|e| OcrError::UndecodableImage(e.to_string()))?;

    let preprocessed = Pipeline::new(form.options).process(image)?;

    let mut png_data = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut png_data);
    preprocessed
        .image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| OcrError::EncodingError(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_data))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.recognizer.name().to_string(),
        supported_formats: state.recognizer.supported_formats(),
        supported_languages: state.recognizer.supported_languages(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language.clone(),
    })
}
