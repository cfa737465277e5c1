//! Pipeline orchestration integration tests
//!
//! Exercises the three-stage run against scripted providers, without any
//! network or audio hardware.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use voice_relay::pipeline::{no_reply_apology, unheard_apology};
use voice_relay::voice::{SAMPLE_RATE, samples_to_wav};
use voice_relay::InteractionState;

mod common;
use common::{FailingProvider, ScriptedProvider, build_pipeline};

fn initial_state(audio: Vec<u8>, language: &str) -> InteractionState {
    InteractionState::new(
        audio,
        "question.wav".to_string(),
        Some("audio/wav".to_string()),
        Some(language.to_string()),
    )
}

#[tokio::test]
async fn full_run_populates_every_stage_field() {
    let provider = Arc::new(
        ScriptedProvider::new("آج ٹماٹر کا ریٹ کیا ہے؟", "آج لاہور میں ٹماٹر تقریباً 220 روپے فی کلو ہے۔")
            .with_confidence(0.91),
    );
    let pipeline = build_pipeline(provider.clone());

    let result = pipeline
        .run(initial_state(b"binary-data".to_vec(), "ur"))
        .await
        .unwrap();

    assert_eq!(result.transcript.as_deref(), Some("آج ٹماٹر کا ریٹ کیا ہے؟"));
    assert!(result.reply_text.as_deref().unwrap().contains("ٹماٹر"));
    assert_eq!(result.reply_audio.as_deref(), Some(&b"scripted-audio"[..]));
    assert_eq!(result.confidence, Some(0.91));
    assert_eq!(result.stt_model.as_deref(), Some("whisper-1"));
    assert_eq!(result.reasoning_model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(result.tts_model.as_deref(), Some("gpt-4o-mini-tts"));
    assert_eq!(result.tts_voice.as_deref(), Some("alloy"));
    assert_eq!(result.tts_format.as_deref(), Some("mp3"));
    assert_eq!(result.language.as_deref(), Some("ur"));

    assert_eq!(provider.transcribe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.reply_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.synthesize_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_transcript_skips_reasoning_call() {
    let provider = Arc::new(ScriptedProvider::new("", "should never be asked"));
    let pipeline = build_pipeline(provider.clone());

    let result = pipeline
        .run(initial_state(b"audio".to_vec(), "ur"))
        .await
        .unwrap();

    assert_eq!(provider.reply_calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.reply_text.as_deref(), Some(unheard_apology("ur")));
    // the skipped stage still reports the configured default model
    assert_eq!(result.reasoning_model.as_deref(), Some("gpt-4o-mini"));
}

#[tokio::test]
async fn whitespace_transcript_counts_as_empty() {
    let provider = Arc::new(ScriptedProvider::new("   \n\t ", "should never be asked"));
    let pipeline = build_pipeline(provider.clone());

    let result = pipeline
        .run(initial_state(b"audio".to_vec(), "en"))
        .await
        .unwrap();

    assert_eq!(provider.reply_calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.reply_text.as_deref(), Some(unheard_apology("en")));
}

#[tokio::test]
async fn apology_follows_requested_language() {
    let provider = Arc::new(ScriptedProvider::new("", ""));
    let pipeline = build_pipeline(provider);

    let result = build_pipeline(Arc::new(ScriptedProvider::new("", "")))
        .run(initial_state(b"audio".to_vec(), "en"))
        .await
        .unwrap();
    assert_eq!(result.reply_text.as_deref(), Some(unheard_apology("en")));

    let result = pipeline
        .run(initial_state(b"audio".to_vec(), "ur"))
        .await
        .unwrap();
    assert_eq!(result.reply_text.as_deref(), Some(unheard_apology("ur")));
}

#[tokio::test]
async fn empty_reply_synthesizes_fallback_text() {
    let provider = Arc::new(ScriptedProvider::new("a real question", ""));
    let pipeline = build_pipeline(provider.clone());

    let result = pipeline
        .run(initial_state(b"audio".to_vec(), "ur"))
        .await
        .unwrap();

    // synthesis is still invoked, just on the fallback text
    assert_eq!(provider.synthesize_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        provider.last_synthesis_input().as_deref(),
        Some(no_reply_apology("ur"))
    );
    // the reply text itself stays empty; only the voiced output is substituted
    assert_eq!(result.reply_text.as_deref(), Some(""));
    assert!(!result.reply_audio.unwrap().is_empty());
}

#[tokio::test]
async fn confidence_is_absent_when_provider_reports_none() {
    let provider = Arc::new(ScriptedProvider::new("text", "reply"));
    let pipeline = build_pipeline(provider);

    let result = pipeline
        .run(initial_state(b"audio".to_vec(), "ur"))
        .await
        .unwrap();

    assert_eq!(result.confidence, None);
}

#[tokio::test]
async fn silence_in_urdu_ends_with_voiced_apology() {
    // 2 seconds of silence at 16kHz, tagged audio/wav, language "ur"
    let silence_samples = vec![0.0f32; 32_000];
    let silence = samples_to_wav(&silence_samples, SAMPLE_RATE).unwrap();

    let provider = Arc::new(ScriptedProvider::new("", "unused"));
    let pipeline = build_pipeline(provider.clone());

    let result = pipeline.run(initial_state(silence, "ur")).await.unwrap();

    assert_eq!(result.transcript.as_deref(), Some(""));
    assert_eq!(result.reply_text.as_deref(), Some(unheard_apology("ur")));
    assert_eq!(
        provider.last_synthesis_input().as_deref(),
        Some(unheard_apology("ur"))
    );
    assert!(!result.reply_audio.unwrap().is_empty());
    assert_eq!(result.tts_voice.as_deref(), Some("alloy"));
    assert_eq!(result.tts_format.as_deref(), Some("mp3"));
}

#[tokio::test]
async fn default_language_applies_when_request_has_none() {
    let provider = Arc::new(ScriptedProvider::new("", "unused"));
    let pipeline = build_pipeline(provider);

    let state = InteractionState::new(b"audio".to_vec(), "clip.wav".to_string(), None, None);
    let result = pipeline.run(state).await.unwrap();

    // test defaults configure "ur"
    assert_eq!(result.language.as_deref(), Some("ur"));
    assert_eq!(result.reply_text.as_deref(), Some(unheard_apology("ur")));
}

#[tokio::test]
async fn run_detached_matches_inline_run() {
    let provider = Arc::new(ScriptedProvider::new("question", "answer"));
    let pipeline = build_pipeline(provider);

    let result = pipeline
        .run_detached(initial_state(b"audio".to_vec(), "ur"))
        .await
        .unwrap();

    assert_eq!(result.transcript.as_deref(), Some("question"));
    assert_eq!(result.reply_text.as_deref(), Some("answer"));
    assert!(result.reply_audio.is_some());
}

#[tokio::test]
async fn provider_errors_propagate_unretried() {
    let pipeline = build_pipeline(Arc::new(FailingProvider));

    let err = pipeline
        .run(initial_state(b"audio".to_vec(), "ur"))
        .await
        .unwrap_err();

    assert!(err.is_provider());
    assert!(err.to_string().contains("STT"));
}
