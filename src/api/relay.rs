//! Voice interaction endpoint
//!
//! Validates the inbound clip, runs the pipeline, and shapes the response.
//! Validation failures are client errors (415/422); provider failures map to
//! a generic internal error with the cause logged for operators.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::pipeline::InteractionState;

/// Upload cap, matching the provider's transcription limit
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Filename assumed when the upload did not carry one
const DEFAULT_FILENAME: &str = "clip.wav";

/// Build the relay router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/v1/voice-interact", post(voice_interact))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Query parameters for the interaction endpoint
#[derive(Debug, Deserialize)]
pub struct InteractParams {
    pub language: Option<String>,
}

/// Metadata returned alongside the relay's response
#[derive(Debug, Serialize)]
pub struct InteractMetadata {
    /// Model used for transcription
    pub stt_model: String,
    /// Model used for text reasoning
    pub llm_model: String,
    /// Model used for speech synthesis
    pub tts_model: String,
    /// Voice preset used for speech synthesis
    pub tts_voice: String,
    /// Audio container/codec of the synthesized speech
    pub tts_format: String,
    /// Approximate transcription confidence in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Total processing time in milliseconds
    pub processing_ms: f64,
}

/// Response returned when the relay processes voice input
#[derive(Debug, Serialize)]
pub struct InteractResponse {
    pub language: String,
    pub transcript: String,
    pub response_text: String,
    /// Synthesized speech as base64; omitted when no audio was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    pub metadata: InteractMetadata,
}

struct AudioUpload {
    bytes: Vec<u8>,
    filename: String,
    mime_type: Option<String>,
}

/// Run the full voice interaction loop for the uploaded clip
async fn voice_interact(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<InteractParams>,
    mut multipart: Multipart,
) -> Result<Json<InteractResponse>, RelayError> {
    let upload = read_audio_field(&mut multipart).await?;

    let mime_type = upload.mime_type.unwrap_or_default();
    if !state.allowed_mime_types.iter().any(|m| *m == mime_type) {
        tracing::debug!(mime = %mime_type, "rejected audio upload");
        return Err(RelayError::UnsupportedMediaType);
    }

    if upload.bytes.is_empty() {
        return Err(RelayError::EmptyAudio);
    }

    let language = params
        .language
        .map_or_else(|| state.default_language.clone(), |l| l.to_lowercase());

    let started = Instant::now();

    let initial = InteractionState::new(
        upload.bytes,
        upload.filename,
        Some(mime_type),
        Some(language.clone()),
    );

    let result = Arc::clone(&state.pipeline).run_detached(initial).await.map_err(|e| {
        tracing::error!(error = %e, "voice interaction failed");
        RelayError::Provider
    })?;

    let processing_ms = started.elapsed().as_secs_f64() * 1000.0;

    let transcript = result
        .transcript
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();
    let response_text = result
        .reply_text
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();

    tracing::info!(
        transcript_chars = transcript.len(),
        response_chars = response_text.len(),
        processing_ms,
        "voice interaction complete"
    );

    let audio_base64 = result
        .reply_audio
        .as_deref()
        .filter(|audio| !audio.is_empty())
        .map(|audio| base64::engine::general_purpose::STANDARD.encode(audio));

    let metadata = InteractMetadata {
        stt_model: result.stt_model.unwrap_or_else(|| state.stt_model.clone()),
        llm_model: result
            .reasoning_model
            .unwrap_or_else(|| state.reasoning_model.clone()),
        tts_model: result.tts_model.unwrap_or_else(|| state.tts_model.clone()),
        tts_voice: result.tts_voice.unwrap_or_else(|| state.tts_voice.clone()),
        tts_format: result.tts_format.unwrap_or_else(|| state.tts_format.clone()),
        confidence: result.confidence,
        processing_ms,
    };

    Ok(Json(InteractResponse {
        language: result.language.unwrap_or(language),
        transcript,
        response_text,
        audio_base64,
        metadata,
    }))
}

/// Pull the `audio` part out of the multipart body
///
/// A missing part or an unreadable body counts as an empty clip.
async fn read_audio_field(multipart: &mut Multipart) -> Result<AudioUpload, RelayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| RelayError::EmptyAudio)?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let mime_type = field.content_type().map(ToString::to_string);
        let bytes = field.bytes().await.map_err(|_| RelayError::EmptyAudio)?;

        return Ok(AudioUpload {
            bytes: bytes.to_vec(),
            filename,
            mime_type,
        });
    }

    Err(RelayError::EmptyAudio)
}

/// Client-facing errors for the interaction endpoint
#[derive(Debug)]
pub enum RelayError {
    /// MIME type not in the allow-list
    UnsupportedMediaType,
    /// Missing or zero-length audio payload
    EmptyAudio,
    /// Provider-layer failure; cause is logged, not exposed
    Provider,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            detail: &'static str,
        }

        let (status, detail) = match self {
            Self::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported audio type. Please upload WAV, WEBM, MP3, OGG, or FLAC.",
            ),
            Self::EmptyAudio => (StatusCode::UNPROCESSABLE_ENTITY, "Audio clip is empty."),
            Self::Provider => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Provider request failed. Please try again shortly.",
            ),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
