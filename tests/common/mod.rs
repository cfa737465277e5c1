//! Shared test utilities

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use voice_relay::{
    Error, Pipeline, RelayProvider, ReplyResult, Result, SpeechResult, StageDefaults,
    TranscriptionResult,
};

/// Provider returning canned results and recording how it was called
pub struct ScriptedProvider {
    pub transcript: String,
    pub confidence: Option<f64>,
    pub reply: String,
    pub audio: Vec<u8>,
    pub transcribe_calls: AtomicUsize,
    pub reply_calls: AtomicUsize,
    pub synthesize_calls: AtomicUsize,
    pub synthesis_inputs: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(transcript: &str, reply: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            confidence: None,
            reply: reply.to_string(),
            audio: b"scripted-audio".to_vec(),
            transcribe_calls: AtomicUsize::new(0),
            reply_calls: AtomicUsize::new(0),
            synthesize_calls: AtomicUsize::new(0),
            synthesis_inputs: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        self.audio = audio;
        self
    }

    pub fn last_synthesis_input(&self) -> Option<String> {
        self.synthesis_inputs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RelayProvider for ScriptedProvider {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _filename: &str,
        language: Option<&str>,
        _mime_type: Option<&str>,
    ) -> Result<TranscriptionResult> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TranscriptionResult {
            text: self.transcript.clone(),
            model: "whisper-1".to_string(),
            language: language.map(ToString::to_string),
            confidence: self.confidence,
        })
    }

    async fn generate_reply(
        &self,
        _transcript: &str,
        _language: &str,
        _context: Option<&str>,
        _model: Option<&str>,
    ) -> Result<ReplyResult> {
        self.reply_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ReplyResult {
            text: self.reply.clone(),
            model: "gpt-4o-mini".to_string(),
        })
    }

    async fn synthesize(
        &self,
        text: &str,
        _language: &str,
        voice: Option<&str>,
        format: Option<&str>,
        model: Option<&str>,
    ) -> Result<SpeechResult> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        self.synthesis_inputs
            .lock()
            .unwrap()
            .push(text.to_string());
        Ok(SpeechResult {
            audio: self.audio.clone(),
            model: model.unwrap_or("gpt-4o-mini-tts").to_string(),
            voice: voice.unwrap_or("alloy").to_string(),
            format: format.unwrap_or("mp3").to_string(),
        })
    }
}

/// Provider whose transcription call always fails
pub struct FailingProvider;

#[async_trait]
impl RelayProvider for FailingProvider {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _filename: &str,
        _language: Option<&str>,
        _mime_type: Option<&str>,
    ) -> Result<TranscriptionResult> {
        Err(Error::Stt("transcription API error 500: boom".to_string()))
    }

    async fn generate_reply(
        &self,
        _transcript: &str,
        _language: &str,
        _context: Option<&str>,
        _model: Option<&str>,
    ) -> Result<ReplyResult> {
        Err(Error::Reasoning("unreachable".to_string()))
    }

    async fn synthesize(
        &self,
        _text: &str,
        _language: &str,
        _voice: Option<&str>,
        _format: Option<&str>,
        _model: Option<&str>,
    ) -> Result<SpeechResult> {
        Err(Error::Tts("unreachable".to_string()))
    }
}

/// Stage defaults matching the test configuration
#[must_use]
pub fn test_defaults() -> StageDefaults {
    StageDefaults {
        language: "ur".to_string(),
        reasoning_model: "gpt-4o-mini".to_string(),
    }
}

/// Build a pipeline over the given provider with test defaults
#[must_use]
pub fn build_pipeline(provider: std::sync::Arc<dyn RelayProvider>) -> std::sync::Arc<Pipeline> {
    std::sync::Arc::new(Pipeline::new(provider, test_defaults()))
}
