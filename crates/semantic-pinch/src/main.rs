use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ladder::{direction_for_key, LadderState, Level};
use semantic_pinch::media::ReplicateMedia;
use semantic_pinch::{
    backend, seed_state, BackendKind, LadderKind, LadderTransformer, NavigationOutcome, Navigator,
    PinchConfig, TransformEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "semantic-pinch",
    about = "Zoom text between emoji, word, sentence, paragraph and article",
    version
)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ladder to walk
    #[arg(long, value_enum)]
    ladder: Option<LadderKind>,

    /// Text-generation backend
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Starting level (defaults to the ladder's seed level)
    #[arg(long)]
    level: Option<Level>,

    /// Starting content (defaults to the ladder's seed text)
    #[arg(long)]
    text: Option<String>,

    /// Serve cached levels instead of regenerating them
    #[arg(long)]
    reuse_cached: bool,
}

type SessionNavigator = Navigator<LadderTransformer>;

fn initial_state(kind: LadderKind, level: Option<Level>, text: Option<String>) -> Result<LadderState> {
    let seed = seed_state(kind)?;
    if level.is_none() && text.is_none() {
        return Ok(seed);
    }
    let level = level.unwrap_or_else(|| seed.current_level());
    let text = text.unwrap_or_else(|| seed.current_content().to_string());
    LadderState::new(seed.ladder().clone(), level, text)
        .with_context(|| format!("level '{level}' is not on the {kind:?} ladder"))
}

fn render(state: &LadderState) {
    let levels: Vec<String> = state
        .ladder()
        .levels()
        .iter()
        .enumerate()
        .map(|(i, level)| {
            if i == state.current_index() {
                format!("[{}]", level.label())
            } else {
                level.label()
            }
        })
        .collect();
    println!("{}", levels.join("  "));
    println!("{}", state.display());
    if let Some(err) = state.last_error() {
        println!("! {err}");
    }
}

fn spawn_navigation(navigator: Arc<SessionNavigator>, key: &str) {
    let Some(direction) = direction_for_key(key) else {
        return;
    };
    tokio::spawn(async move {
        let mut on_partial = |partial: &str| {
            if !partial.trim().is_empty() {
                println!("… {}", partial.trim_end());
            }
        };
        match navigator.navigate(direction, &mut on_partial).await {
            Ok(NavigationOutcome::Moved { .. }) | Ok(NavigationOutcome::Cached { .. }) => {
                render(&navigator.snapshot());
            }
            Ok(NavigationOutcome::Boundary) => println!("(nothing further {direction})"),
            Ok(NavigationOutcome::Busy) => println!("(busy, input dropped)"),
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "Navigation failed");
                render(&navigator.snapshot());
            }
        }
        let _ = std::io::stdout().flush();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PinchConfig::load(cli.config.as_deref())?;
    if let Some(kind) = cli.ladder {
        config.ladder = kind;
    }
    if let Some(kind) = cli.backend {
        config.backend = kind;
    }
    if cli.reuse_cached {
        config.reuse_cached = true;
    }
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {e}"))?;

    let client = config.http_client()?;
    let text_backend = backend::from_config(&config, client.clone())?;
    let mut transformer = LadderTransformer::new(TransformEngine::new(text_backend));
    if config.ladder == LadderKind::Multimodal {
        transformer = transformer.with_media(Arc::new(ReplicateMedia::new(client, &config.media)?));
    }

    let state = initial_state(config.ladder, cli.level, cli.text)?;
    let navigator = Arc::new(Navigator::new(state, transformer).with_reuse_cached(config.reuse_cached));

    info!(
        backend = ?config.backend,
        ladder = ?config.ladder,
        reuse_cached = config.reuse_cached,
        "Semantic pinch ready"
    );
    println!("up/down (k/j) to zoom, `edit <text>`, `show`, `quit`");
    render(&navigator.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "quit" | "exit" => break,
            "show" => render(&navigator.snapshot()),
            _ if line.starts_with("edit ") => {
                let text = line["edit ".len()..].trim();
                if navigator.edit(text) {
                    render(&navigator.snapshot());
                } else {
                    println!("(busy, edit dropped)");
                }
            }
            _ if direction_for_key(line).is_some() => {
                if navigator.is_busy() {
                    println!("(busy, input dropped)");
                } else {
                    spawn_navigation(Arc::clone(&navigator), line);
                }
            }
            other => println!("unknown command '{other}'"),
        }
    }

    info!(history = %navigator.history(), "Session finished");
    Ok(())
}
