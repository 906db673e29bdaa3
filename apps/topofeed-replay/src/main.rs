//! # Topofeed Replay
//!
//! A small CLI around the Topofeed SDK. It pushes node deltas through a
//! `BufferController` and prints what the consumer actually receives, so the
//! effect of pausing, consolidation and the paced catch-up can be watched.
//!
//! ## Delta log format
//!
//! One JSON delta per line, blank lines ignored:
//!
//! ```text
//! {"add": [{"id": "web-1", "label": "web"}]}
//! {"update": [{"id": "web-1", "label": "web (busy)"}], "remove": ["db-7"]}
//! ```

use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use topofeed_sdk::{
    decode_delta, BufferController, ChannelSink, FeedConfig, FeedConfigBuilder, FeedError, Node,
    NodesDelta,
};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "topofeed-replay")]
#[command(about = "Replay live-graph deltas through a pausable buffer")]
#[command(version)]
struct Cli {
    /// Maximum held deltas before the oldest two are consolidated
    #[arg(long, default_value_t = topofeed_sdk::DEFAULT_CAPACITY, global = true)]
    capacity: usize,

    /// Delay between deltas delivered while catching up (ms)
    #[arg(long, default_value_t = topofeed_sdk::DEFAULT_FEED_INTERVAL_MS, global = true)]
    interval_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scripted walkthrough of pause, consolidation and catch-up
    Demo,
    /// Replay a JSON-lines delta log
    Replay {
        /// Path to the delta log
        file: String,
        /// Pause the view before this delta (0-based)
        #[arg(long)]
        pause_at: Option<usize>,
        /// Resume the view after this delta (0-based)
        #[arg(long)]
        resume_at: Option<usize>,
        /// Delay between source deltas (ms)
        #[arg(long, default_value_t = 0)]
        source_delay_ms: u64,
    },
    /// Interactive REPL for manual experimentation
    Interactive,
}

// ─── Output helpers ────────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

fn warn_line(text: &str) {
    println!("  {} {}", "!".bright_red(), text);
}

fn describe(delta: &NodesDelta) -> String {
    let mut parts = Vec::new();
    for node in delta.added() {
        parts.push(format!("+{}", node.id).bright_green().to_string());
    }
    for node in delta.updated() {
        parts.push(format!("~{}", node.id).bright_yellow().to_string());
    }
    for id in delta.removed() {
        parts.push(format!("-{}", id).bright_red().to_string());
    }
    parts.join(" ")
}

/// Print everything the consumer receives, numbered in arrival order.
fn spawn_consumer(mut rx: mpsc::UnboundedReceiver<NodesDelta>) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut count = 0;
        while let Some(delta) = rx.recv().await {
            count += 1;
            println!(
                "  {} {:>3} {}",
                "view ◀".bright_magenta(),
                count,
                describe(&delta)
            );
        }
        count
    })
}

type Feed = (BufferController<ChannelSink>, tokio::task::JoinHandle<usize>);

fn build_feed(config: FeedConfig) -> Result<Feed, FeedError> {
    let (sink, rx) = ChannelSink::new();
    let feed = BufferController::new(sink, config)?;
    Ok((feed, spawn_consumer(rx)))
}

fn show_status(feed: &BufferController<ChannelSink>) {
    let stats = feed.stats();
    let state = if feed.is_paused() {
        "PAUSED".bright_red().bold()
    } else {
        "LIVE".bright_green().bold()
    };
    println!(
        "  {} held={} draining={} passed={} drained={} consolidations={} discarded={}",
        state,
        feed.buffered_len(),
        feed.is_draining(),
        stats.passed,
        stats.drained,
        stats.consolidations,
        stats.discarded
    );
}

/// Wait until every held delta has been delivered.
async fn wait_drained(feed: &BufferController<ChannelSink>) {
    while feed.buffered_len() > 0 && !feed.is_paused() {
        tokio::time::sleep(feed.config().feed_interval() / 4).await;
    }
    // let the consumer task print the last one
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// ─── Demo ──────────────────────────────────────────────────────────────────

async fn run_demo(config: FeedConfig) -> Result<(), FeedError> {
    header("DEMO — Pausing a Live Graph Without Losing Updates");
    let (feed, consumer) = build_feed(config)?;

    section("Phase 1: Live updates flow straight through");
    feed.on_delta_received(
        NodesDelta::new().with_add(vec![Node::new("web-1"), Node::new("db-1")]),
    );
    step("source: +web-1 +db-1");
    tokio::time::sleep(Duration::from_millis(20)).await;

    section("Phase 2: View paused, updates are held");
    feed.pause();
    let script = [
        NodesDelta::new().with_add(vec![Node::new("cache-1").with_attr("hits", 0)]),
        NodesDelta::new().with_update(vec![Node::new("cache-1").with_attr("hits", 42)]),
        NodesDelta::new().with_update(vec![Node::new("db-1").with_attr("load", 0.9)]),
        NodesDelta::new().with_remove(["db-1"]),
        NodesDelta::new().with_add(vec![Node::new("tmp-1")]),
        NodesDelta::new().with_remove(["tmp-1"]),
    ];
    for delta in script {
        step(&format!("source: {}", describe(&delta)));
        feed.on_delta_received(delta);
    }
    show_status(&feed);

    section("Phase 3: Resume, held deltas replay at the feed interval");
    feed.resume();
    wait_drained(&feed).await;
    show_status(&feed);

    section("Phase 4: Switching topology drops stale held deltas");
    feed.pause();
    feed.on_delta_received(NodesDelta::new().with_add(vec![Node::new("stale-1")]));
    let dropped = feed.switch_context("containers");
    step(&format!("dropped {} held delta(s)", dropped));
    feed.resume();
    show_status(&feed);

    drop(feed);
    let delivered = consumer.await.unwrap_or(0);
    println!(
        "\n  {} {}",
        "✓".bright_green().bold(),
        format!("consumer received {} delta(s)", delivered).bright_green().bold()
    );
    Ok(())
}

// ─── Replay ────────────────────────────────────────────────────────────────

async fn run_replay(
    config: FeedConfig,
    file: &str,
    pause_at: Option<usize>,
    resume_at: Option<usize>,
    source_delay_ms: u64,
) -> Result<(), FeedError> {
    header(&format!("REPLAY — {}", file));
    let raw = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| FeedError::Io(format!("{}: {}", file, e)))?;
    let (feed, consumer) = build_feed(config)?;

    let lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    for (index, line) in lines.enumerate() {
        if pause_at == Some(index) {
            feed.pause();
            section(&format!("paused before delta {}", index));
        }

        match decode_delta(line) {
            Ok(delta) => feed.on_delta_received(delta),
            Err(e) => warn_line(&format!("skipping delta {}: {}", index, e)),
        }

        if resume_at == Some(index) {
            section(&format!("resumed after delta {}", index));
            feed.resume();
        }
        if source_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(source_delay_ms)).await;
        }
    }

    if feed.is_paused() {
        section("end of log while paused, resuming");
        feed.resume();
    }
    wait_drained(&feed).await;
    show_status(&feed);

    drop(feed);
    let delivered = consumer.await.unwrap_or(0);
    step(&format!("consumer received {} delta(s)", delivered));
    Ok(())
}

// ─── Interactive ───────────────────────────────────────────────────────────

fn parse_node(parts: &[&str]) -> Option<Node> {
    let id = parts.first()?;
    let mut node = Node::new(*id);
    for pair in &parts[1..] {
        if let Some((key, value)) = pair.split_once('=') {
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            node = node.with_attr(key, value);
        }
    }
    Some(node)
}

async fn run_interactive(config: FeedConfig) -> Result<(), FeedError> {
    header("INTERACTIVE — Topofeed REPL");
    println!("  Type 'help' for commands.\n");

    let (feed, consumer) = build_feed(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "topofeed>".bright_cyan());
        use std::io::Write;
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first() else {
            continue;
        };

        match *command {
            "add" | "a" | "update" | "u" => match parse_node(&parts[1..]) {
                Some(node) if matches!(*command, "add" | "a") => {
                    feed.on_delta_received(NodesDelta::new().with_add(vec![node]))
                }
                Some(node) => feed.on_delta_received(NodesDelta::new().with_update(vec![node])),
                None => warn_line("Usage: add|update <id> [key=value ...]"),
            },
            "remove" | "rm" => {
                if parts.len() < 2 {
                    warn_line("Usage: remove <id> [id ...]");
                    continue;
                }
                feed.on_delta_received(NodesDelta::new().with_remove(parts[1..].iter().copied()));
            }
            "json" => {
                let raw = line.trim_start_matches("json").trim();
                match decode_delta(raw) {
                    Ok(delta) => feed.on_delta_received(delta),
                    Err(e) => warn_line(&e.to_string()),
                }
            }
            "pause" | "p" => feed.pause(),
            "resume" | "r" => feed.resume(),
            "reset" => {
                let dropped = match parts.get(1) {
                    Some(context) => feed.switch_context(context),
                    None => feed.reset(),
                };
                step(&format!("dropped {} held delta(s)", dropped));
            }
            "status" | "s" => show_status(&feed),
            "quit" | "exit" | "q" => {
                println!("  {}", "Goodbye!".dimmed());
                break;
            }
            "help" | "h" | "?" => {
                println!("  add <id> [k=v ...] | update <id> [k=v ...] | remove <id> [id ...]");
                println!("  json <delta> | pause | resume | reset [context] | status | quit");
            }
            other => warn_line(&format!("Unknown command '{}' — type 'help'", other)),
        }
        // give the consumer a chance to print before the next prompt
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    drop(feed);
    let _ = consumer.await;
    Ok(())
}

// ─── Entry point ───────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = FeedConfigBuilder::new()
        .capacity(cli.capacity)
        .feed_interval(cli.interval_ms)
        .build();

    let result = match cli.command {
        Commands::Demo => run_demo(config).await,
        Commands::Replay {
            file,
            pause_at,
            resume_at,
            source_delay_ms,
        } => run_replay(config, &file, pause_at, resume_at, source_delay_ms).await,
        Commands::Interactive => run_interactive(config).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}
