//! Builds `music-data.json` from a local `songs/` tree.

use std::path::PathBuf;

use clap::Parser;
use jukebox_proto::builder::{build_manifest, with_remote_base, write_manifest};
use jukebox_proto::names::AUDIO_EXTENSION;
use tracing::info;

/// Scan a songs directory and write the site manifest.
#[derive(Parser, Debug)]
#[command(name = "jukebox-manifest", version, about)]
struct Args {
    /// Directory holding one sub-directory per folder
    #[arg(long, default_value = "songs")]
    songs: PathBuf,

    /// Output file
    #[arg(long, default_value = "music-data.json")]
    out: PathBuf,

    /// Rewrite every song to `{ file, url: <BASE>/<file> }`
    #[arg(long)]
    remote_base: Option<String>,

    /// Audio file extension to collect
    #[arg(long, default_value = AUDIO_EXTENSION)]
    extension: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter.as_str())
        .init();

    let extension = args.extension.trim_start_matches('.');
    let mut manifest = build_manifest(&args.songs, extension)?;
    if let Some(base) = &args.remote_base {
        manifest = with_remote_base(manifest, base, extension);
    }
    write_manifest(&manifest, &args.out)?;

    let songs: usize = manifest.folders.iter().map(|f| f.songs.len()).sum();
    info!(
        "wrote {} ({} folders, {} songs)",
        args.out.display(),
        manifest.folders.len(),
        songs
    );
    Ok(())
}
