//! `guide` command line: the panel side of the plugin.
//!
//! `guide generate "a login form with email and password"` sends the prompt to
//! the generation service, draws the result on an in-memory canvas, writes a
//! live preview file and prints the canvas as JSON.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use guide_lib::config::{self, AppConfig};
use guide_lib::host::{HostMessage, PluginHost};
use guide_lib::{GenerationClient, Scene, logging, map_html_to_nodes, preview};

#[derive(Parser)]
#[command(name = "guide", version, about = "Turn a UI description into HTML and canvas shapes")]
struct Cli {
    /// Generation endpoint (overrides the config file)
    #[arg(long, global = true, env = "GUIDE_ENDPOINT")]
    endpoint: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a UI from a description and draw it
    Generate {
        /// What the UI should look like
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Write the canvas JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the live preview here (default: timestamped file in the preview dir)
        #[arg(long, conflicts_with = "no_preview")]
        preview: Option<PathBuf>,
        /// Do not write a preview file
        #[arg(long)]
        no_preview: bool,
    },
    /// Draw an existing HTML file ("-" reads stdin) without calling the service
    Map {
        file: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check that the generation service is up
    Health,
    /// Show or initialise the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = effective_config(config::load_app_config(), cli.endpoint);

    match cli.command {
        Command::Generate {
            prompt,
            out,
            preview: preview_arg,
            no_preview,
        } => {
            let preview_path = if no_preview {
                None
            } else {
                Some(preview_arg.unwrap_or_else(|| {
                    preview::timestamped_path(&config.preview_dir(), chrono::Utc::now())
                }))
            };
            generate(&config, &prompt.join(" "), out.as_deref(), preview_path.as_deref()).await
        }
        Command::Map { file, out } => map_file(&config, &file, out.as_deref()).await,
        Command::Health => {
            let client = GenerationClient::from_config(&config)?;
            client
                .health()
                .await
                .with_context(|| format!("{} is not healthy", client.health_url()))?;
            println!("ok {}", client.health_url());
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("# {}", config::app_config_path().display());
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Init => {
                config::save_app_config(&config).map_err(anyhow::Error::msg)?;
                println!("{}", config::app_config_path().display());
                Ok(())
            }
        },
    }
}

async fn generate(
    config: &AppConfig,
    prompt: &str,
    out: Option<&Path>,
    preview_path: Option<&Path>,
) -> anyhow::Result<()> {
    let client = GenerationClient::from_config(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut host = PluginHost::new(client, scene_for(config), config.font(), tx);

    let result = host
        .handle_raw(serde_json::json!({ "type": "generate", "text": prompt }))
        .await;

    let mut failure = None;
    while let Ok(message) = rx.try_recv() {
        match message {
            HostMessage::Status { message, .. } => eprintln!("⏳ {message}"),
            HostMessage::Success { count, .. } => {
                eprintln!("✅ Generated {count} components successfully!")
            }
            HostMessage::Error { message, debug } => {
                eprintln!("❌ Error: {message}");
                if let Some(detail) = debug {
                    tracing::debug!(%detail, "error detail");
                }
                failure = Some(message);
            }
        }
    }

    let Some(generation) = result else {
        bail!(failure.unwrap_or_else(|| "generation failed".to_string()));
    };

    if let Some(path) = preview_path {
        preview::write_preview(path, &generation.html).map_err(anyhow::Error::msg)?;
        eprintln!("Preview: {}", path.display());
    }

    write_scene(host.canvas(), out)
}

async fn map_file(config: &AppConfig, file: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let html = if file == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };

    let mut scene = scene_for(config);
    let nodes = map_html_to_nodes(&mut scene, &html, &config.font()).await?;
    eprintln!("Mapped {} components", nodes.len());
    write_scene(&scene, out)
}

/// Endpoint from `--endpoint` or `GUIDE_ENDPOINT` wins over the file; blank is ignored.
fn effective_config(mut config: AppConfig, endpoint: Option<String>) -> AppConfig {
    if let Some(endpoint) = endpoint.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        config.endpoint_url = endpoint.to_string();
    }
    config
}

/// Canvas with the stock font plus whatever the config asks for.
fn scene_for(config: &AppConfig) -> Scene {
    let mut scene = Scene::new();
    scene.install_font(config.font());
    scene
}

fn write_scene(scene: &Scene, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&scene.snapshot())?;
    match out {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
