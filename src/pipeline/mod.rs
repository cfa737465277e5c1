//! Three-stage interaction pipeline
//!
//! Runs `Transcribing → Reasoning → Synthesizing` strictly in order, merging
//! each stage's output over the running [`InteractionState`]. There is no
//! branching, no retry, and no mid-stage cancellation; empty stage inputs are
//! absorbed by fixed fallback text so the pipeline always completes.

mod state;

pub use state::{InteractionState, StageUpdate};

use std::sync::Arc;

use crate::provider::RelayProvider;
use crate::{Error, Result};

/// Fallback reply spoken when transcription produced no usable text
#[must_use]
pub fn unheard_apology(language: &str) -> &'static str {
    if language.starts_with("ur") {
        "معذرت، مجھے آپ کی آواز واضح طور پر سنائی نہیں دی۔ براہ کرم دوبارہ بولیں۔"
    } else {
        "Sorry, I could not hear you clearly. Please speak again."
    }
}

/// Fallback synthesis input used when reasoning produced no reply text
#[must_use]
pub fn no_reply_apology(language: &str) -> &'static str {
    if language.starts_with("ur") {
        "معذرت، اس وقت جواب تیار نہیں ہو سکا۔"
    } else {
        "Sorry, I could not prepare a reply."
    }
}

/// Defaults applied when the state does not carry a value yet
#[derive(Debug, Clone)]
pub struct StageDefaults {
    /// Language assumed when the request did not specify one
    pub language: String,
    /// Reasoning model reported when the reasoning call is skipped
    pub reasoning_model: String,
}

/// The fixed, linear three-stage orchestrator
pub struct Pipeline {
    provider: Arc<dyn RelayProvider>,
    defaults: StageDefaults,
}

impl Pipeline {
    /// Create a pipeline over an injected provider client
    #[must_use]
    pub fn new(provider: Arc<dyn RelayProvider>, defaults: StageDefaults) -> Self {
        Self { provider, defaults }
    }

    /// Run all three stages in order and return the final state
    ///
    /// # Errors
    ///
    /// Returns the first provider error encountered; soft conditions (empty
    /// transcript, empty reply) are not errors.
    pub async fn run(&self, mut state: InteractionState) -> Result<InteractionState> {
        let update = self.transcribe(&state).await?;
        state.apply(update);

        let update = self.reason(&state).await?;
        state.apply(update);

        let update = self.synthesize(&state).await?;
        state.apply(update);

        Ok(state)
    }

    /// Run the pipeline on its own task
    ///
    /// The whole run is offloaded to an independent execution slot so a slow
    /// provider call never blocks the caller's dispatcher. From the caller's
    /// perspective it is a single awaitable unit with no partial results.
    ///
    /// # Errors
    ///
    /// Returns provider errors from [`Pipeline::run`], or a pipeline error if
    /// the offloaded task itself failed.
    pub async fn run_detached(self: Arc<Self>, state: InteractionState) -> Result<InteractionState> {
        tokio::spawn(async move { self.run(state).await })
            .await
            .map_err(|e| Error::Pipeline(format!("pipeline task failed: {e}")))?
    }

    fn resolved_language(&self, state: &InteractionState) -> String {
        state
            .language
            .clone()
            .unwrap_or_else(|| self.defaults.language.clone())
    }

    /// Transcribing: audio in, transcript out
    async fn transcribe(&self, state: &InteractionState) -> Result<StageUpdate> {
        let language = self.resolved_language(state);

        let result = self
            .provider
            .transcribe(
                &state.audio,
                &state.filename,
                Some(&language),
                state.mime_type.as_deref(),
            )
            .await?;

        tracing::debug!(
            transcript_chars = result.text.len(),
            confidence = ?result.confidence,
            "transcription stage complete"
        );

        Ok(StageUpdate {
            language: Some(result.language.unwrap_or(language)),
            transcript: Some(result.text),
            confidence: result.confidence,
            stt_model: Some(result.model),
            ..StageUpdate::default()
        })
    }

    /// Reasoning: transcript in, reply text out
    ///
    /// A blank transcript skips the provider call entirely and substitutes
    /// the fixed apology for the request language.
    async fn reason(&self, state: &InteractionState) -> Result<StageUpdate> {
        let language = self.resolved_language(state);
        let transcript = state.transcript.as_deref().unwrap_or("").trim();

        if transcript.is_empty() {
            tracing::warn!(language = %language, "transcript empty; substituting fallback reply");
            return Ok(StageUpdate {
                reply_text: Some(unheard_apology(&language).to_string()),
                reasoning_model: Some(self.defaults.reasoning_model.clone()),
                ..StageUpdate::default()
            });
        }

        let result = self
            .provider
            .generate_reply(transcript, &language, None, None)
            .await?;

        tracing::debug!(reply_chars = result.text.len(), "reasoning stage complete");

        Ok(StageUpdate {
            language: Some(language),
            reply_text: Some(result.text),
            reasoning_model: Some(result.model),
            ..StageUpdate::default()
        })
    }

    /// Synthesizing: reply text in, audio out
    ///
    /// A blank reply still reaches synthesis, voiced as the fixed apology.
    async fn synthesize(&self, state: &InteractionState) -> Result<StageUpdate> {
        let language = self.resolved_language(state);
        let reply = state.reply_text.as_deref().unwrap_or("").trim();

        let input = if reply.is_empty() {
            tracing::warn!(language = %language, "reply text empty; synthesizing fallback message");
            no_reply_apology(&language)
        } else {
            reply
        };

        let speech = self
            .provider
            .synthesize(input, &language, None, None, None)
            .await?;

        Ok(StageUpdate {
            language: Some(language),
            reply_audio: Some(speech.audio),
            tts_model: Some(speech.model),
            tts_voice: Some(speech.voice),
            tts_format: Some(speech.format),
            ..StageUpdate::default()
        })
    }
}
