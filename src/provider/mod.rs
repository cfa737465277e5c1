//! Hosted AI provider client
//!
//! Three independent request/response operations (transcribe, generate-reply,
//! synthesize) against a hosted provider, normalized into plain result
//! records. Implementations hold only static configuration and may be shared
//! freely across concurrent pipeline runs. No retries happen at this layer;
//! provider failures propagate as distinguishable errors.

pub mod extract;
mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;

use crate::Result;

/// Result returned by speech transcription
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Recognized text, trimmed; empty when nothing was recognized
    pub text: String,
    /// Model that produced the transcript
    pub model: String,
    /// Language reported by the provider, falling back to the requested one
    pub language: Option<String>,
    /// Estimated confidence in [0, 1]; absent when no segments were returned
    pub confidence: Option<f64>,
}

/// Result returned by text reasoning
#[derive(Debug, Clone)]
pub struct ReplyResult {
    /// Reply text; empty when both reasoning modes came back empty
    pub text: String,
    /// Model that produced the reply
    pub model: String,
}

/// Result returned by speech synthesis
#[derive(Debug, Clone)]
pub struct SpeechResult {
    /// Synthesized audio payload
    pub audio: Vec<u8>,
    pub model: String,
    pub voice: String,
    pub format: String,
}

/// Request/response operations against the hosted AI provider
#[async_trait]
pub trait RelayProvider: Send + Sync {
    /// Transcribe an audio clip to text
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        language: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<TranscriptionResult>;

    /// Generate a reply to a transcript, answering in the given language
    ///
    /// An empty reply is a valid outcome, not an error; the pipeline's
    /// fallback logic absorbs it downstream.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    async fn generate_reply(
        &self,
        transcript: &str,
        language: &str,
        context: Option<&str>,
        model: Option<&str>,
    ) -> Result<ReplyResult>;

    /// Synthesize speech from text
    ///
    /// Voice, format, and model default from client configuration when not
    /// given.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        voice: Option<&str>,
        format: Option<&str>,
        model: Option<&str>,
    ) -> Result<SpeechResult>;
}
