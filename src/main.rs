#![deny(clippy::all)]

mod capture;
mod controller;
mod error;
mod gateway;
mod hotkeys;
mod screenshot;
mod session;

use capture::{CaptureNotification, CapturePipeline};
use controller::SessionController;
use gateway::HttpGateway;
use session::{Role, Session};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::info;

/// Application configuration
#[derive(serde::Deserialize)]
struct Config {
    gateway: GatewayConfig,
}

#[derive(serde::Deserialize)]
struct GatewayConfig {
    url: String,
}

/// Load configuration from embedded config.toml
fn load_config() -> anyhow::Result<Config> {
    const CONFIG_TOML: &str = include_str!("../config.toml");
    let config: Config = toml::from_str(CONFIG_TOML)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    let gateway_url =
        std::env::var("SHOWDESK_GATEWAY_URL").unwrap_or(config.gateway.url);
    info!(url = %gateway_url, "Using SHOWDESK gateway");

    let gateway: Arc<dyn gateway::Gateway> = Arc::new(HttpGateway::new(&gateway_url)?);
    let controller = SessionController::new(gateway.clone());

    // Screen-check notifications reach the presentation loop on this channel
    let (notify_tx, notify_rx) = mpsc::channel(16);
    let pipeline = Arc::new(CapturePipeline::new(
        gateway,
        notify_tx,
        tokio::runtime::Handle::current(),
    ));

    // Initialize global hotkeys
    let hotkey_manager = hotkeys::init_hotkeys().map_err(anyhow::Error::msg)?;
    info!("Global hotkeys initialized successfully");

    let pipeline_for_hotkey = pipeline.clone();
    hotkeys::start_hotkey_listener(Arc::new(move || {
        pipeline_for_hotkey.trigger();
    }));

    // Keep hotkey manager alive
    std::mem::forget(hotkey_manager);

    run_presentation(controller, notify_rx).await
}

/// Minimal line-oriented presentation loop.
///
/// Renders session snapshots, dispatches controller operations, and prints
/// screen-check notifications as they arrive. Real rendering belongs to the
/// UI layer; this shim only exercises the boundary.
async fn run_presentation(
    mut controller: SessionController,
    mut notify_rx: mpsc::Receiver<CaptureNotification>,
) -> anyhow::Result<()> {
    println!("SHOWDESK: /watch <url> to analyze a video, then ask questions.");
    println!("Commands: /watch <url>, /suggest, /toggle, /reset, /quit. Ctrl+Shift+S: screen check.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            maybe_line = lines.next_line() => {
                let Some(line) = maybe_line? else { break };
                if !handle_line(&mut controller, &mut lines, line.trim()).await? {
                    break;
                }
            }
            Some(notification) = notify_rx.recv() => {
                render_capture_notification(&notification);
            }
        }
    }

    Ok(())
}

/// Dispatch one input line. Returns false when the user quits.
async fn handle_line(
    controller: &mut SessionController,
    lines: &mut Lines<BufReader<Stdin>>,
    line: &str,
) -> anyhow::Result<bool> {
    match line {
        "" => {}
        "/quit" | "/exit" => return Ok(false),
        "/suggest" => {
            if let Err(e) = controller.refresh_suggestions().await {
                eprintln!("! {}", e);
            }
            render_suggestions(controller.session());
        }
        "/toggle" => {
            controller.toggle_suggestions_visible();
            render_suggestions(controller.session());
        }
        "/reset" => {
            print!("Reset the session? [y/N] ");
            std::io::stdout().flush()?;
            let answer = lines.next_line().await?.unwrap_or_default();
            let confirmed = matches!(answer.trim(), "y" | "Y" | "yes");
            controller.reset_session(|| confirmed);
            if confirmed {
                println!("Session cleared.");
            }
        }
        _ if line.starts_with("/watch") => {
            let url = line.strip_prefix("/watch").unwrap_or_default().trim();
            match controller.start_session(url).await {
                Ok(()) => render_session(controller.session()),
                Err(e) => eprintln!("! Could not start session: {}", e),
            }
        }
        _ if line.starts_with('/') => {
            eprintln!("! Unknown command: {}", line);
        }
        question => {
            controller.set_pending_input(question);
            match controller.send_message(question).await {
                Ok(()) => render_last_answer(controller.session()),
                Err(e) => eprintln!("! Message failed: {}", e),
            }
        }
    }
    Ok(true)
}

fn render_session(session: &Session) {
    if let Some(subject) = &session.subject {
        println!(
            "Subject: {} / {} ({})",
            subject.subject, subject.topic, subject.level
        );
        if !subject.concepts.is_empty() {
            println!("Concepts: {}", subject.concepts.join(", "));
        }
    }
    for turn in &session.history {
        let speaker = match turn.role {
            Role::User => "you",
            Role::Assistant => "showdesk",
        };
        println!("{}> {}", speaker, turn.content);
    }
    render_suggestions(session);
}

fn render_last_answer(session: &Session) {
    if let Some(turn) = session.history.last() {
        println!("showdesk> {}", turn.content);
    }
}

fn render_suggestions(session: &Session) {
    if session.suggestions_visible && !session.suggestions.is_empty() {
        println!("Try asking:");
        for suggestion in &session.suggestions {
            println!("  - {}", suggestion);
        }
    }
}

fn render_capture_notification(notification: &CaptureNotification) {
    println!("\n[screen check] Issue detected:");
    for (key, value) in &notification.payload {
        println!("  {}: {}", key, value);
    }
}
