//! Voice Relay - speech in, spoken answer out
//!
//! Accepts an audio clip over HTTP and relays it through three sequential
//! hosted-AI calls — transcription, text reasoning, speech synthesis —
//! returning the transcript, the reply text, and the synthesized audio.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Request Handler                │
//! │   validation │ language │ response shaping  │
//! └──────────────────────┬──────────────────────┘
//!                        │
//! ┌──────────────────────▼──────────────────────┐
//! │            Pipeline Orchestrator             │
//! │   Transcribing → Reasoning → Synthesizing   │
//! └──────────────────────┬──────────────────────┘
//!                        │
//! ┌──────────────────────▼──────────────────────┐
//! │             Hosted AI Provider               │
//! │        STT  │  Reasoning  │  TTS            │
//! └─────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{InteractionState, Pipeline, StageDefaults, StageUpdate};
pub use provider::{
    OpenAiClient, RelayProvider, ReplyResult, SpeechResult, TranscriptionResult,
};
