use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voice_relay::api::{ApiServer, ApiState};
use voice_relay::pipeline::{Pipeline, StageDefaults};
use voice_relay::provider::OpenAiClient;
use voice_relay::voice::{AudioCapture, AudioPlayback, SAMPLE_RATE, samples_to_wav};
use voice_relay::Config;

/// Voice relay - speech in, spoken answer out
#[derive(Parser)]
#[command(name = "voice-relay", version, about)]
struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(long, env = "RELAY_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Record a question from the microphone and play the relay's answer
    Ask {
        /// Base URL of a running relay
        #[arg(long, default_value = "http://localhost:8001")]
        url: String,

        /// Language code to send along with the request
        #[arg(short, long, default_value = "ur")]
        language: String,

        /// How long to record from the mic, in seconds
        #[arg(short, long, default_value = "8")]
        seconds: u64,

        /// Directory to save reply audio when direct playback is not possible
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voice_relay=info",
        1 => "info,voice_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask {
                url,
                language,
                seconds,
                save_dir,
            } => ask(&url, &language, seconds, save_dir.as_deref()).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
        };
    }

    serve(cli.port).await
}

/// Load config, build the provider client and pipeline, run the server
async fn serve(port_override: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let port = port_override.unwrap_or(config.port);

    tracing::info!(
        port,
        language = %config.interaction.default_language,
        stt_model = %config.provider.stt_model,
        reasoning_model = %config.provider.reasoning_model,
        tts_model = %config.provider.tts_model,
        "starting voice relay"
    );

    let provider = Arc::new(OpenAiClient::new(&config.provider)?);
    let defaults = StageDefaults {
        language: config.interaction.default_language.clone(),
        reasoning_model: config.provider.reasoning_model.clone(),
    };
    let pipeline = Arc::new(Pipeline::new(provider, defaults));
    let state = Arc::new(ApiState::new(&config, pipeline));

    ApiServer::new(state, port).run().await?;

    Ok(())
}

/// Record from the microphone, post to the relay, play or save the answer
#[allow(clippy::future_not_send)]
async fn ask(
    url: &str,
    language: &str,
    seconds: u64,
    save_dir: Option<&Path>,
) -> anyhow::Result<()> {
    anyhow::ensure!(seconds > 0, "recording duration must be positive");

    println!("Recording for {seconds}s... speak your question now.");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    capture.stop();

    let samples = capture.take_buffer();
    anyhow::ensure!(!samples.is_empty(), "no audio captured from the microphone");
    println!("Recording complete ({} samples).", samples.len());

    let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
    let part = reqwest::multipart::Part::bytes(wav)
        .file_name("question.wav")
        .mime_str("audio/wav")?;
    let form = reqwest::multipart::Form::new().part("audio", part);

    let endpoint = format!("{}/v1/voice-interact", url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&endpoint)
        .query(&[("language", language)])
        .multipart(form)
        .timeout(Duration::from_secs(120))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("relay returned {status}: {body}");
    }

    let payload: serde_json::Value = response.json().await?;

    let transcript = payload["transcript"].as_str().unwrap_or_default();
    let reply = payload["response_text"].as_str().unwrap_or_default();

    println!("\n---- Relay reply ----");
    println!(
        "Transcript: {}",
        if transcript.is_empty() { "<empty>" } else { transcript }
    );
    println!("Reply: {}", if reply.is_empty() { "<empty>" } else { reply });
    if let Some(metadata) = payload.get("metadata") {
        println!("Metadata: {}", serde_json::to_string_pretty(metadata)?);
    }
    println!("---------------------\n");

    let Some(audio_b64) = payload["audio_base64"].as_str() else {
        println!("No audio was returned by the relay.");
        return Ok(());
    };

    let audio = base64::engine::general_purpose::STANDARD.decode(audio_b64)?;
    let format = payload
        .pointer("/metadata/tts_format")
        .and_then(|v| v.as_str())
        .unwrap_or("mp3")
        .to_lowercase();

    play_or_save(&audio, &format, save_dir).await
}

/// Play the reply audio, saving to disk when playback is not possible
#[allow(clippy::future_not_send)]
async fn play_or_save(audio: &[u8], format: &str, save_dir: Option<&Path>) -> anyhow::Result<()> {
    match AudioPlayback::new() {
        Ok(mut playback) => {
            let played = match format {
                "mp3" => playback.play_mp3(audio).await,
                "wav" => playback.play_wav(audio).await,
                other => Err(voice_relay::Error::Audio(format!(
                    "no decoder for format: {other}"
                ))),
            };
            match played {
                Ok(()) => return Ok(()),
                Err(e) => println!("Unable to play audio directly ({e}); saving to disk instead."),
            }
        }
        Err(e) => println!("No audio output available ({e}); saving to disk instead."),
    }

    let dir = save_dir.map_or_else(|| PathBuf::from("relay_replies"), Path::to_path_buf);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("relay_reply.{format}"));
    std::fs::write(&path, audio)?;
    println!("Saved reply audio to {}", path.display());

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );

        capture.clear_buffer();
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;

    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples...", samples.len());
    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}
