//! qa-picker
//!
//! Command line front end: capture page snapshots, replay extraction rules and
//! inspect the selectors synthesized for a point on a captured page.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use qa_rule_picker::dom::{AccessibleLayerQuirk, Page, PageSnapshot, snapshot_from_json};
use qa_rule_picker::extract::derive_url_pattern;
use qa_rule_picker::{
    BrowserSession, Command, ConnectionOptions, ExtractionRule, LaunchOptions, ProximityEngine,
    SelectorSynthesizer,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qa-picker")]
#[command(version)]
#[command(about = "Question/answer selector picking and rule replay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct BrowserArgs {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL of a running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a page snapshot (all same-origin frames) as JSON
    Capture {
        #[arg(long)]
        url: String,

        /// Write the snapshot here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        browser: BrowserArgs,
    },
    /// Replay a saved rule
    Extract {
        /// Rule JSON file
        #[arg(long, value_name = "FILE")]
        rule: PathBuf,

        /// Page to capture
        #[arg(long, conflicts_with = "snapshot", required_unless_present = "snapshot")]
        url: Option<String>,

        /// Previously captured snapshot
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        #[command(flatten)]
        browser: BrowserArgs,
    },
    /// Show candidate selectors for the node at a point of a snapshot
    Suggest {
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,
    },
    /// Print the rule-store key for a URL
    Pattern { url: String },
    /// Print the JSON Schema of rules and host commands
    Schema,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { url, output, browser } => {
            let snapshot = capture(&browser, &url)?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Snapshot written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Extract { rule, url, snapshot, browser } => {
            let rule_json =
                std::fs::read_to_string(&rule).with_context(|| format!("Failed to read rule {}", rule.display()))?;
            let rule = ExtractionRule::from_json(&rule_json)?;

            let snapshot = match (snapshot, url) {
                (Some(path), _) => read_snapshot(&path)?,
                (None, Some(url)) => capture(&browser, &url)?,
                (None, None) => bail!("either --url or --snapshot is required"),
            };
            if !rule.url_pattern.is_empty() && derive_url_pattern(&snapshot.url) != rule.url_pattern {
                log::warn!("Rule pattern {} does not cover {}", rule.url_pattern, snapshot.url);
            }

            let page = Page::from_snapshot(&snapshot);
            let result = ProximityEngine::default().extract(&page, &rule)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Suggest { snapshot, x, y } => {
            let page = Page::from_snapshot(&read_snapshot(&snapshot)?);
            let hit = page.hit_test(x, y).with_context(|| format!("No node at ({}, {})", x, y))?;
            let node = AccessibleLayerQuirk::default().resolve(&page, hit.node, hit.x, hit.y).node().unwrap_or(hit.node);

            let synthesizer = SelectorSynthesizer::default();
            let candidates = synthesizer.generate(&page, node);
            let best = synthesizer.find_best_match(&page, &candidates, node);

            let report = serde_json::json!({
                "node": node,
                "tag": page.node(node).map(|n| n.tag_name.clone()),
                "text": page.text(node),
                "candidates": candidates,
                "best": best,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Pattern { url } => println!("{}", derive_url_pattern(&url)),
        Commands::Schema => {
            let schema = serde_json::json!({
                "rule": schemars::schema_for!(ExtractionRule),
                "command": schemars::schema_for!(Command),
            });
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn open_session(args: &BrowserArgs) -> anyhow::Result<BrowserSession> {
    if let Some(ws) = &args.ws_endpoint {
        eprintln!("Connecting to {}", ws);
        return Ok(BrowserSession::connect(ConnectionOptions::new(ws.clone()))?);
    }

    let mut options = LaunchOptions::new().headless(!args.headed);
    if let Some(path) = &args.executable_path {
        options = options.chrome_path(path);
    }
    if let Some(dir) = &args.user_data_dir {
        options = options.user_data_dir(dir);
    }
    eprintln!("Browser mode: {}", if options.headless { "headless" } else { "headed" });
    BrowserSession::launch(options).context("Failed to launch browser")
}

/// Capture `url`, closing the tabs of a browser this process launched
fn capture(args: &BrowserArgs, url: &str) -> anyhow::Result<PageSnapshot> {
    let session = open_session(args)?;
    let snapshot = session.capture_url(url).with_context(|| format!("Failed to capture {}", url))?;
    if args.ws_endpoint.is_none() {
        session.close()?;
    }
    Ok(snapshot)
}

fn read_snapshot(path: &Path) -> anyhow::Result<PageSnapshot> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    Ok(snapshot_from_json(&json)?)
}
