//! Configuration management for the voice relay
//!
//! Configuration is read once per process: built-in defaults, overlaid by the
//! optional TOML config file, overlaid by `RELAY_*` environment variables.

pub mod file;

use std::path::Path;

use crate::Result;
use file::RelayConfigFile;

/// Default provider API base URL
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default MIME allow-list for inbound audio uploads
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/wav",
    "audio/x-wav",
    "audio/webm",
    "audio/mpeg",
    "audio/mp3",
    "audio/ogg",
    "audio/flac",
];

/// Voice relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosted provider settings
    pub provider: ProviderConfig,

    /// Interaction defaults
    pub interaction: InteractionConfig,

    /// HTTP server port
    pub port: u16,
}

/// Hosted provider settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API credential; validated when the provider client is constructed
    pub api_key: String,

    /// Base URL of the provider API
    pub api_base: String,

    /// STT model identifier
    pub stt_model: String,

    /// Reasoning model identifier
    pub reasoning_model: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice preset
    pub tts_voice: String,

    /// TTS audio container/codec
    pub tts_format: String,
}

/// Interaction defaults consumed by the request handler and pipeline
#[derive(Debug, Clone)]
pub struct InteractionConfig {
    /// Language code used when the request does not specify one
    pub default_language: String,

    /// Allow-listed MIME types for inbound audio
    pub allowed_mime_types: Vec<String>,
}

/// Environment variable overlay, read once at load time
#[derive(Debug, Default)]
struct EnvOverlay {
    api_key: Option<String>,
    api_base: Option<String>,
    stt_model: Option<String>,
    reasoning_model: Option<String>,
    tts_model: Option<String>,
    tts_voice: Option<String>,
    tts_format: Option<String>,
    default_language: Option<String>,
    port: Option<u16>,
}

impl EnvOverlay {
    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            // RELAY_API_KEY wins; OPENAI_API_KEY is accepted for convenience
            api_key: var("RELAY_API_KEY").or_else(|| var("OPENAI_API_KEY")),
            api_base: var("RELAY_API_BASE"),
            stt_model: var("RELAY_STT_MODEL"),
            reasoning_model: var("RELAY_REASONING_MODEL"),
            tts_model: var("RELAY_TTS_MODEL"),
            tts_voice: var("RELAY_TTS_VOICE"),
            tts_format: var("RELAY_TTS_FORMAT"),
            default_language: var("RELAY_LANGUAGE"),
            port: var("RELAY_PORT").and_then(|v| v.parse().ok()),
        }
    }
}

impl Config {
    /// Load configuration from the default file location and environment
    ///
    /// # Errors
    ///
    /// Returns error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let file = RelayConfigFile::load()?;
        Ok(Self::merge(file, EnvOverlay::from_env()))
    }

    /// Load configuration from an explicit file path and environment
    ///
    /// # Errors
    ///
    /// Returns error if the config file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = RelayConfigFile::load_from(path)?;
        Ok(Self::merge(file, EnvOverlay::from_env()))
    }

    /// Merge precedence: env > file > defaults
    fn merge(file: RelayConfigFile, env: EnvOverlay) -> Self {
        let allowed_mime_types = file.interaction.allowed_mime_types.unwrap_or_else(|| {
            DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(ToString::to_string)
                .collect()
        });

        Self {
            provider: ProviderConfig {
                api_key: env
                    .api_key
                    .or(file.provider.api_key)
                    .unwrap_or_default(),
                api_base: env
                    .api_base
                    .or(file.provider.api_base)
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                stt_model: env
                    .stt_model
                    .or(file.provider.stt_model)
                    .unwrap_or_else(|| "whisper-1".to_string()),
                reasoning_model: env
                    .reasoning_model
                    .or(file.provider.reasoning_model)
                    .unwrap_or_else(|| "gpt-4o-mini".to_string()),
                tts_model: env
                    .tts_model
                    .or(file.provider.tts_model)
                    .unwrap_or_else(|| "gpt-4o-mini-tts".to_string()),
                tts_voice: env
                    .tts_voice
                    .or(file.provider.tts_voice)
                    .unwrap_or_else(|| "alloy".to_string()),
                tts_format: env
                    .tts_format
                    .or(file.provider.tts_format)
                    .unwrap_or_else(|| "mp3".to_string()),
            },
            interaction: InteractionConfig {
                default_language: env
                    .default_language
                    .or(file.interaction.default_language)
                    .unwrap_or_else(|| "ur".to_string())
                    .to_lowercase(),
                allowed_mime_types,
            },
            port: env.port.or(file.server.port).unwrap_or(8001),
        }
    }
}
