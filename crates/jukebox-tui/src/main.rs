mod action;
mod app;
mod app_state;
mod component;
mod components;
mod controller;
mod controls;
mod engine;
mod focus;
mod mpv;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use jukebox_proto::config::Config;
use jukebox_proto::platform;
use jukebox_proto::urls::SiteUrls;

/// Terminal jukebox for a static music site.
#[derive(Parser, Debug)]
#[command(name = "jukebox", version, about)]
struct Args {
    /// Page URL of the site, e.g. https://host/music/index.html
    #[arg(long)]
    site: Option<String>,

    /// Config file (default: ~/.config/jukebox/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use mpv from PATH only, skipping a bundled copy
    #[arg(long)]
    system_deps: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    platform::set_use_system_deps(args.system_deps);

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_file_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG wins; by default keep HTTP client internals quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("jukebox log: {}", log_path.display());
    tracing::info!("jukebox starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .unwrap_or_else(|e| {
        tracing::warn!("config: {}; using defaults", e);
        Config::default()
    });

    if let Some(page) = &args.site {
        let (origin, base_path) = SiteUrls::split_page_url(page)?;
        config.site.origin = origin;
        config.site.base_path = base_path;
    }
    let urls = SiteUrls::from_config(&config.site);
    tracing::info!("site: {}{}", urls.origin(), urls.base_path());

    // ── Playback engine ──────────────────────────────────────────────────────
    let (engine, events_tx) = engine::spawn(config.mpv.default_volume);
    let engine_rx = events_tx.subscribe();

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(&config, urls, engine);
    app.run(engine_rx).await
}
