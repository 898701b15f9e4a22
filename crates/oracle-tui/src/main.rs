use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use oracle_core::upload;
use oracle_core::{
    AskController, AskView, Config, MarkdownRenderer, Notice, NoticeKind, OracleClient, Rendered,
    Session,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;
mod view;

use app::App;
use tui::EventHandler;

const DEFAULT_LOG_FILTER: &str = "oracle_core=info,oracle_tui=info";

#[derive(Parser)]
#[command(name = "oracle")]
#[command(version, about = "Ask the Otaku Oracle about anime and manga")]
struct Cli {
    /// Backend base URL (overrides config and ORACLE_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Pre-fill the prompt box
    #[arg(short, long)]
    prompt: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        prompt: String,
        /// Public image URL to include
        #[arg(long)]
        image_url: Option<String>,
        /// Local image to attach
        #[arg(long)]
        image: Option<PathBuf>,
        /// Print the answer as sanitized HTML rendered from markdown
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command {
        Some(Commands::Ask { prompt, image_url, image, html }) => {
            init_stderr_logging();
            let client = connect(&config, cli.base_url.as_deref()).await;
            let ok = ask_once(client, &prompt, image_url.as_deref(), image.as_deref(), html).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        None => {
            init_file_logging();
            let client = connect(&config, cli.base_url.as_deref()).await;
            run_tui(client, &config, cli.prompt).await?;
        }
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The terminal belongs to the UI, so logs go to a file next to the config
fn init_file_logging() {
    let Ok(dir) = Config::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }

    let file = match OpenOptions::new().create(true).append(true).open(dir.join("oracle.log")) {
        Ok(file) => file,
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// Build the backend client, fetching a CSRF token when none is configured
async fn connect(config: &Config, base_url: Option<&str>) -> OracleClient {
    let base_url = base_url
        .map(str::to_string)
        .unwrap_or_else(|| config.resolved_base_url());

    let mut client = OracleClient::new(&base_url).with_csrf_token(config.resolved_csrf_token());
    if let Err(e) = client.ensure_csrf_token().await {
        // The backend may not enforce CSRF; carry on without a token
        tracing::warn!("no csrf token: {:#}", e);
    }
    client
}

async fn run_tui(client: OracleClient, config: &Config, prompt: Option<String>) -> Result<()> {
    let (view_tx, mut view_rx) = mpsc::unbounded_channel();
    let controller = AskController::new(client);
    let mut app = App::new(controller, view_tx, config.theme()).with_prompt(prompt);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result: Result<()> = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&app, frame))?;

            tokio::select! {
                Some(event) = events.next() => handler::handle_event(&mut app, event).await?,
                Some(view_event) = view_rx.recv() => app.apply(view_event),
                else => break,
            }
        }
        Ok(())
    }
    .await;

    tui::restore()?;
    result
}

/// `AskView` for one-shot use: notices to stderr, answer kept for stdout
#[derive(Default)]
struct ConsoleView {
    answer: Option<Rendered>,
}

impl AskView for ConsoleView {
    fn show_loading(&mut self) {
        eprint!("{}", "Thinking...".dimmed());
        let _ = std::io::stderr().flush();
    }

    fn hide_loading(&mut self) {
        eprintln!();
    }

    fn notify(&mut self, notice: Notice) {
        let label = match notice.kind {
            NoticeKind::Info => "info".cyan(),
            NoticeKind::Warn => "warn".yellow(),
            NoticeKind::Error => "error".red(),
        };
        eprintln!("[{}] {}", label.bold(), notice.message);
    }

    fn render_answer(&mut self, answer: Rendered) {
        self.answer = Some(answer);
    }
}

async fn ask_once(
    client: OracleClient,
    prompt: &str,
    image_url: Option<&str>,
    image: Option<&Path>,
    html: bool,
) -> Result<bool> {
    let mut session = Session::new();
    if let Some(path) = image {
        upload::attach_file(&mut session, path).await?;
    }

    let mut controller = AskController::new(client);
    if html {
        controller = controller.with_markdown(MarkdownRenderer::new());
    }

    let mut view = ConsoleView::default();
    let outcome = controller
        .submit(&mut session, &mut view, prompt, image_url.unwrap_or(""))
        .await;

    if let Some(answer) = view.answer {
        println!("{}", answer.as_str());
    }

    Ok(outcome.is_ok())
}
