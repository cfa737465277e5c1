//! `OpenAI`-hosted speech and reasoning client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{RelayProvider, ReplyResult, SpeechResult, TranscriptionResult, extract};
use crate::config::ProviderConfig;
use crate::{Error, Result};

/// Client for the hosted `OpenAI` speech-to-text, reasoning, and
/// text-to-speech APIs
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    stt_model: String,
    reasoning_model: String,
    tts_model: String,
    tts_voice: String,
    tts_format: String,
}

/// Verbose transcription payload
#[derive(Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    language: Option<String>,
    segments: Option<Vec<TranscriptionSegment>>,
}

#[derive(Deserialize)]
struct TranscriptionSegment {
    avg_logprob: Option<f64>,
}

impl OpenAiClient {
    /// Create a new client from provider configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("provider API key required".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            stt_model: config.stt_model.clone(),
            reasoning_model: config.reasoning_model.clone(),
            tts_model: config.tts_model.clone(),
            tts_voice: config.tts_voice.clone(),
            tts_format: config.tts_format.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    async fn reasoning_post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "reasoning API error");
            return Err(Error::Reasoning(format!(
                "reasoning API error {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RelayProvider for OpenAiClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        language: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<TranscriptionResult> {
        tracing::debug!(
            filename,
            bytes = audio.len(),
            ?language,
            ?mime_type,
            "requesting transcription"
        );

        let mut part =
            reqwest::multipart::Part::bytes(audio.to_vec()).file_name(filename.to_string());
        if let Some(mime) = mime_type {
            part = part.mime_str(mime).map_err(|e| Error::Stt(e.to_string()))?;
        }

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.stt_model.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(self.endpoint("audio/transcriptions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: VerboseTranscription = response.json().await?;
        let confidence = estimate_confidence(result.segments.as_deref());

        Ok(TranscriptionResult {
            text: result.text.trim().to_string(),
            model: self.stt_model.clone(),
            language: result.language.or_else(|| language.map(str::to_string)),
            confidence,
        })
    }

    async fn generate_reply(
        &self,
        transcript: &str,
        language: &str,
        context: Option<&str>,
        model: Option<&str>,
    ) -> Result<ReplyResult> {
        let target_model = model.unwrap_or(&self.reasoning_model);

        tracing::debug!(
            model = target_model,
            language,
            transcript_chars = transcript.len(),
            "generating reply"
        );

        let system_prompt = format!(
            "You are Zarai Dost, a caring agricultural expert helping Pakistani farmers. \
             Respond with empathy, concise actionable steps, and mention relevant local \
             context when known. Always reply using language code '{language}'."
        );
        let user_prompt = context.map_or_else(
            || transcript.to_string(),
            |context| format!("{context}\n\nFarmer: {transcript}"),
        );

        let body = json!({
            "model": target_model,
            "input": [
                {"role": "system", "content": [{"type": "input_text", "text": system_prompt}]},
                {"role": "user", "content": [{"type": "input_text", "text": user_prompt}]},
            ],
        });

        let payload = self.reasoning_post("responses", &body).await?;
        let text = extract::reply_text(&payload);
        if !text.is_empty() {
            return Ok(ReplyResult {
                text,
                model: target_model.to_string(),
            });
        }

        tracing::warn!("responses API returned empty text; falling back to chat completions");

        let body = json!({
            "model": target_model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });

        let payload = self.reasoning_post("chat/completions", &body).await?;
        let text = chat_reply_text(&payload);
        if text.is_empty() {
            tracing::warn!("chat completions fallback also returned no content");
        }

        Ok(ReplyResult {
            text,
            model: target_model.to_string(),
        })
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        voice: Option<&str>,
        format: Option<&str>,
        model: Option<&str>,
    ) -> Result<SpeechResult> {
        let target_voice = voice.unwrap_or(&self.tts_voice);
        let target_format = format.unwrap_or(&self.tts_format);
        let target_model = model.unwrap_or(&self.tts_model);

        tracing::debug!(
            model = target_model,
            voice = target_voice,
            language,
            "synthesizing speech"
        );

        let body = json!({
            "model": target_model,
            "input": text,
            "voice": target_voice,
            "response_format": target_format,
        });

        let response = self
            .client
            .post(self.endpoint("audio/speech"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "TTS API error");
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        // The payload arrives as the raw body whether the provider buffered
        // or streamed it.
        let audio = response.bytes().await?.to_vec();

        tracing::debug!(
            model = target_model,
            voice = target_voice,
            format = target_format,
            bytes = audio.len(),
            "synthesized speech"
        );

        Ok(SpeechResult {
            audio,
            model: target_model.to_string(),
            voice: target_voice.to_string(),
            format: target_format.to_string(),
        })
    }
}

/// Estimate transcription confidence from segment log-probabilities
///
/// Mean of `exp(avg_logprob)` across segments, clamped to [0, 1]. Absent or
/// logprob-free segments yield no estimate.
fn estimate_confidence(segments: Option<&[TranscriptionSegment]>) -> Option<f64> {
    let segments = segments?;

    let probabilities: Vec<f64> = segments
        .iter()
        .filter_map(|segment| segment.avg_logprob)
        .map(f64::exp)
        .collect();

    if probabilities.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = probabilities.iter().sum::<f64>() / probabilities.len() as f64;
    Some(mean.clamp(0.0, 1.0))
}

/// Extract reply text from a chat-completions payload
fn chat_reply_text(payload: &Value) -> String {
    let Some(first_choice) = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        return String::new();
    };

    // Some API modes report the message under `delta` instead
    first_choice
        .get("message")
        .or_else(|| first_choice.get("delta"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(avg_logprob: Option<f64>) -> TranscriptionSegment {
        TranscriptionSegment { avg_logprob }
    }

    #[test]
    fn confidence_absent_without_segments() {
        assert_eq!(estimate_confidence(None), None);
        assert_eq!(estimate_confidence(Some(&[])), None);
    }

    #[test]
    fn confidence_absent_when_segments_lack_logprobs() {
        let segments = [segment(None), segment(None)];
        assert_eq!(estimate_confidence(Some(&segments)), None);
    }

    #[test]
    fn confidence_is_mean_of_exponentiated_logprobs() {
        let segments = [segment(Some(0.0)), segment(Some(-1.0))];
        let expected = f64::midpoint(1.0, (-1.0f64).exp());
        let confidence = estimate_confidence(Some(&segments)).unwrap();
        assert!((confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn confidence_clamps_to_unit_interval() {
        // A positive logprob would exponentiate above 1
        let segments = [segment(Some(0.5))];
        assert_eq!(estimate_confidence(Some(&segments)), Some(1.0));
    }

    #[test]
    fn confidence_skips_segments_without_logprobs() {
        let segments = [segment(None), segment(Some(0.0))];
        assert_eq!(estimate_confidence(Some(&segments)), Some(1.0));
    }

    #[test]
    fn chat_reply_reads_message_content() {
        let payload = json!({
            "choices": [{"message": {"content": "  hello  "}}],
        });
        assert_eq!(chat_reply_text(&payload), "hello");
    }

    #[test]
    fn chat_reply_falls_back_to_delta() {
        let payload = json!({
            "choices": [{"delta": {"content": "partial"}}],
        });
        assert_eq!(chat_reply_text(&payload), "partial");
    }

    #[test]
    fn chat_reply_empty_when_missing() {
        assert_eq!(chat_reply_text(&json!({"choices": []})), "");
        assert_eq!(chat_reply_text(&json!({})), "");
        assert_eq!(
            chat_reply_text(&json!({"choices": [{"message": {}}]})),
            ""
        );
    }

    #[test]
    fn client_requires_api_key() {
        let config = ProviderConfig {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            reasoning_model: "gpt-4o-mini".to_string(),
            tts_model: "gpt-4o-mini-tts".to_string(),
            tts_voice: "alloy".to_string(),
            tts_format: "mp3".to_string(),
        };
        assert!(OpenAiClient::new(&config).is_err());
    }

    #[test]
    fn client_trims_trailing_slash_from_base() {
        let config = ProviderConfig {
            api_key: "sk-test".to_string(),
            api_base: "https://api.openai.com/v1/".to_string(),
            stt_model: "whisper-1".to_string(),
            reasoning_model: "gpt-4o-mini".to_string(),
            tts_model: "gpt-4o-mini-tts".to_string(),
            tts_voice: "alloy".to_string(),
            tts_format: "mp3".to_string(),
        };
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("audio/speech"),
            "https://api.openai.com/v1/audio/speech"
        );
    }
}
