//! TOML configuration file loading
//!
//! Supports `~/.config/voice-relay/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top of
//! defaults, and environment variables win over the file.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct RelayConfigFile {
    /// Hosted provider configuration
    #[serde(default)]
    pub provider: ProviderFileConfig,

    /// Interaction defaults
    #[serde(default)]
    pub interaction: InteractionFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Hosted provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct ProviderFileConfig {
    /// API key for the hosted provider
    pub api_key: Option<String>,

    /// Base URL of the provider API
    pub api_base: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Reasoning model (e.g. "gpt-4o-mini")
    pub reasoning_model: Option<String>,

    /// TTS model (e.g. "gpt-4o-mini-tts")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS audio container/codec (e.g. "mp3", "wav")
    pub tts_format: Option<String>,
}

/// Interaction defaults
#[derive(Debug, Default, Deserialize)]
pub struct InteractionFileConfig {
    /// Default language code when the request does not specify one
    pub default_language: Option<String>,

    /// Allow-listed MIME types for inbound audio
    pub allowed_mime_types: Option<Vec<String>>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,
}

impl RelayConfigFile {
    /// Default config file path (`~/.config/voice-relay/config.toml`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "omni", "voice-relay")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the config file from the default location, if present
    ///
    /// A missing file is not an error — it yields the empty overlay.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load() -> crate::Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the config file from an explicit path
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load_from(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let parsed: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(parsed)
    }
}
