use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use baatgpt::api::ApiServerBuilder;
use baatgpt::voice::{AudioUpload, Synthesizer, TextToSpeech};
use baatgpt::{Assistant, Config, Session};

/// BaatGPT - voice chat assistant
#[derive(Parser)]
#[command(name = "baatgpt", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Directory whose index.html replaces the built-in page
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe an audio file and print the text
    Transcribe {
        /// WAV or MP3 file
        file: PathBuf,
    },
    /// Run one full interaction with an audio file
    Ask {
        /// WAV or MP3 file
        file: PathBuf,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,baatgpt=info",
        1 => "info,baatgpt=debug",
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

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Missing API key halts here, before any input is accepted
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Transcribe { file } => cmd_transcribe(&config, &file).await,
            Command::Ask { file } => cmd_ask(&config, &file).await,
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    let port = cli.port.unwrap_or(config.server.port);
    let static_dir = cli.static_dir.or_else(|| config.server.static_dir.clone());

    tracing::info!(
        port,
        chat_model = %config.chat.model,
        stt_model = %config.api.stt_model,
        tts_engine = %config.tts.engine,
        "starting baatgpt"
    );

    let assistant = Arc::new(Assistant::from_config(&config)?);
    ApiServerBuilder::new(assistant, port)
        .static_dir(static_dir)
        .build()
        .run()
        .await?;

    Ok(())
}

fn read_upload(path: &Path) -> anyhow::Result<AudioUpload> {
    let data = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(AudioUpload::new(name, None, data)?)
}

/// Transcribe a single file
async fn cmd_transcribe(config: &Config, file: &Path) -> anyhow::Result<()> {
    let upload = read_upload(file)?;
    let assistant = Assistant::from_config(config)?;

    let text = assistant.transcribe(&upload).await?;
    println!("{text}");
    Ok(())
}

/// Run one interaction in a fresh session
async fn cmd_ask(config: &Config, file: &Path) -> anyhow::Result<()> {
    let upload = read_upload(file)?;
    let assistant = Assistant::from_config(config)?;
    let mut session = Session::new();

    let interaction = assistant.interact(&mut session, &upload).await?;

    println!("You said: {}", interaction.transcript);
    println!("BaatGPT says:\n{}", interaction.reply.content);

    match (&interaction.audio, &interaction.warning) {
        (Some(audio), _) => println!(
            "\nReply audio ({} bytes) written to {}",
            audio.data.len(),
            config.tts.output_path.display()
        ),
        (None, Some(warning)) => println!("\nWarning: {warning}"),
        (None, None) => {}
    }

    Ok(())
}

/// Test the local TTS engine
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::new(&config.tts);
    if !tts.engine_available() {
        anyhow::bail!("TTS engine '{}' not found on PATH", config.tts.engine);
    }

    let audio = tts.synthesize(text).await?;
    println!(
        "Got {} bytes of {} written to {}",
        audio.data.len(),
        audio.mime,
        tts.output_path().display()
    );

    Ok(())
}
