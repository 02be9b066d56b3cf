//! Quill - inspect what the composer core does with a message or a file
#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quill::api::MediaStore;
use quill::api::http::HttpMediaStore;
use quill::markup;
use quill::{BlurPreviewer, Config, EmojiDictionary, MediaFile};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match parse_args()? {
        Command::Preview { file, lite } => preview(&file, lite),
        Command::Blurhash { image } => blurhash(&image).await,
        Command::Upload { file } => upload(&file).await,
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    Preview { file: PathBuf, lite: bool },
    Blurhash { image: PathBuf },
    Upload { file: PathBuf },
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "preview" => {
            let file = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing message file"))?;
            let lite = args[3..].iter().any(|a| a == "--lite" || a == "-l");
            Ok(Command::Preview {
                file: PathBuf::from(file),
                lite,
            })
        }

        "blurhash" => {
            let image = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing image path"))?;
            Ok(Command::Blurhash {
                image: PathBuf::from(image),
            })
        }

        "upload" => {
            let file = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing file path"))?;
            Ok(Command::Upload {
                file: PathBuf::from(file),
            })
        }

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'quill --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"Quill - message composer core

USAGE:
    quill [COMMAND]

COMMANDS:
    preview <file> [OPTIONS]           Render a message and print its text
      Options:
        -l, --lite                     Single-line rendering
      Examples:
        quill preview note.md
        quill preview note.md --lite

    blurhash <image>                   Print the blur preview hash of an image

    upload <file>                      Upload a file to the configured media endpoint

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

CONFIG:
    {}
"#,
        config_path
    );
}

fn print_version() {
    println!("quill {}", quill::VERSION);
}

fn preview(file: &Path, lite: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let emojis = EmojiDictionary::new();
    let views = if lite {
        markup::render_lite(&text, &emojis)
    } else {
        markup::render(&text, &emojis)
    };

    println!("{}", markup::plain_text(&views));
    Ok(())
}

async fn blurhash(image: &Path) -> Result<()> {
    let config = Config::load()?;
    let previewer = BlurPreviewer::from_config(&config.media);

    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let hash = tokio::task::spawn_blocking(move || previewer.encode_bytes(&bytes)).await??;

    println!("{}", hash);
    Ok(())
}

async fn upload(file: &Path) -> Result<()> {
    let config = Config::load()?;
    let endpoint = config.media.upload_endpoint.as_deref().ok_or_else(|| {
        anyhow::anyhow!("No upload endpoint configured\nSet media.upload_endpoint in the config file")
    })?;

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    let media = MediaFile::new(name, guess_mime(file), bytes);

    let store = HttpMediaStore::new(endpoint);
    let url = store
        .upload(&media)
        .await
        .ok_or_else(|| anyhow::anyhow!("Upload of {} failed", media.name))?;

    println!("✓ Uploaded: {}", url);
    Ok(())
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}
