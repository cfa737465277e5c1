//! Interaction state threaded through the pipeline stages

/// Accumulating record of fields produced across stages for a single request
///
/// Created fresh per inbound request and discarded once the response is
/// serialized. Stages only add or overwrite fields, never remove them, and
/// every stage-produced field is optional so downstream stages tolerate any
/// absent subset.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// Raw inbound audio
    pub audio: Vec<u8>,
    /// Filename the clip was uploaded under
    pub filename: String,
    /// MIME type of the inbound audio
    pub mime_type: Option<String>,
    /// Language code, refined as stages resolve it
    pub language: Option<String>,
    /// Recognized utterance
    pub transcript: Option<String>,
    /// Reply produced by the reasoning stage
    pub reply_text: Option<String>,
    /// Synthesized speech for the reply
    pub reply_audio: Option<Vec<u8>>,
    /// Transcription confidence estimate in [0, 1]
    pub confidence: Option<f64>,
    /// Model that produced the transcript
    pub stt_model: Option<String>,
    /// Model that produced the reply
    pub reasoning_model: Option<String>,
    /// Model that synthesized the speech
    pub tts_model: Option<String>,
    /// Voice preset used for synthesis
    pub tts_voice: Option<String>,
    /// Audio container/codec of the synthesized speech
    pub tts_format: Option<String>,
}

impl InteractionState {
    /// Build the initial state for one inbound request
    #[must_use]
    pub fn new(
        audio: Vec<u8>,
        filename: String,
        mime_type: Option<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            audio,
            filename,
            mime_type,
            language,
            ..Self::default()
        }
    }

    /// Merge a stage's output over the running state
    ///
    /// Only fields the stage actually set are written; later-written fields
    /// win on conflict.
    pub fn apply(&mut self, update: StageUpdate) {
        if update.language.is_some() {
            self.language = update.language;
        }
        if update.transcript.is_some() {
            self.transcript = update.transcript;
        }
        if update.reply_text.is_some() {
            self.reply_text = update.reply_text;
        }
        if update.reply_audio.is_some() {
            self.reply_audio = update.reply_audio;
        }
        if update.confidence.is_some() {
            self.confidence = update.confidence;
        }
        if update.stt_model.is_some() {
            self.stt_model = update.stt_model;
        }
        if update.reasoning_model.is_some() {
            self.reasoning_model = update.reasoning_model;
        }
        if update.tts_model.is_some() {
            self.tts_model = update.tts_model;
        }
        if update.tts_voice.is_some() {
            self.tts_voice = update.tts_voice;
        }
        if update.tts_format.is_some() {
            self.tts_format = update.tts_format;
        }
    }
}

/// Immutable per-stage output, combined into the state via
/// [`InteractionState::apply`]
#[derive(Debug, Clone, Default)]
pub struct StageUpdate {
    pub language: Option<String>,
    pub transcript: Option<String>,
    pub reply_text: Option<String>,
    pub reply_audio: Option<Vec<u8>>,
    pub confidence: Option<f64>,
    pub stt_model: Option<String>,
    pub reasoning_model: Option<String>,
    pub tts_model: Option<String>,
    pub tts_voice: Option<String>,
    pub tts_format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_overwrites_only_set_fields() {
        let mut state = InteractionState::new(
            vec![1, 2, 3],
            "clip.wav".to_string(),
            Some("audio/wav".to_string()),
            Some("ur".to_string()),
        );

        state.apply(StageUpdate {
            transcript: Some("hello".to_string()),
            stt_model: Some("whisper-1".to_string()),
            confidence: Some(0.9),
            ..StageUpdate::default()
        });

        assert_eq!(state.transcript.as_deref(), Some("hello"));
        assert_eq!(state.stt_model.as_deref(), Some("whisper-1"));
        assert_eq!(state.confidence, Some(0.9));
        // untouched fields survive
        assert_eq!(state.language.as_deref(), Some("ur"));
        assert_eq!(state.audio, vec![1, 2, 3]);
        assert!(state.reply_text.is_none());
    }

    #[test]
    fn later_updates_win_on_conflict() {
        let mut state = InteractionState::default();

        state.apply(StageUpdate {
            language: Some("ur".to_string()),
            ..StageUpdate::default()
        });
        state.apply(StageUpdate {
            language: Some("en".to_string()),
            ..StageUpdate::default()
        });

        assert_eq!(state.language.as_deref(), Some("en"));
    }

    #[test]
    fn unset_fields_do_not_clear_earlier_values() {
        let mut state = InteractionState::default();

        state.apply(StageUpdate {
            transcript: Some("kept".to_string()),
            ..StageUpdate::default()
        });
        state.apply(StageUpdate {
            reply_text: Some("reply".to_string()),
            ..StageUpdate::default()
        });

        assert_eq!(state.transcript.as_deref(), Some("kept"));
        assert_eq!(state.reply_text.as_deref(), Some("reply"));
    }
}
