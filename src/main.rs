//! Carabiner - convert AlpineQuest tracks and archives to GPX
//!
//! # Usage
//!
//! ```bash
//! # Write hike.gpx next to the track
//! carabiner hike.trk
//!
//! # Write one file per track in the archive, named "out <track name>.gpx"
//! carabiner landmarks.ldk -o out.gpx
//! ```
//!
//! Diagnostics go to stderr and are filtered through `RUST_LOG`.

use std::{
    collections::BTreeSet,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use carabiner::{
    avec::{self, Options},
    gpx::{self, sanitize_file_name},
    model::TrackDocument,
};
use clap::Parser;
use either::Either::{Left, Right};

#[derive(Parser)]
#[command(name = "carabiner")]
#[command(about = "Convert AlpineQuest .trk and .ldk files to GPX", long_about = None)]
#[command(version)]
struct Cli {
    /// Track (.trk) or archive (.ldk) to convert
    input: PathBuf,

    /// Output file. Defaults to the input with a .gpx extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Most overflow blocks followed for a single archive entry
    #[arg(long, default_value_t = Options::default().max_chain_blocks)]
    max_chain_blocks: usize,

    /// Deepest node nesting followed in an archive
    #[arg(long, default_value_t = Options::default().max_depth)]
    max_depth: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = Options {
        max_chain_blocks: cli.max_chain_blocks,
        max_depth: cli.max_depth,
    };
    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("gpx"));

    let decoded = avec::decode_file(&cli.input, &options)
        .with_context(|| format!("Failed to decode {}", cli.input.display()))?;

    match decoded {
        Left(document) => write_document(&document, &output)?,
        Right(archive) => {
            if archive.tracks.is_empty() {
                tracing::info!("No tracks found in {}", cli.input.display());
            }
            if !archive.skipped.is_empty() {
                tracing::info!("Skipped {} archive parts", archive.skipped.len());
            }

            let mut taken = BTreeSet::new();
            for track in &archive.tracks {
                let path = track_path(&output, &track.document, &mut taken);
                write_document(&track.document, &path)?;
            }
        }
    }

    Ok(())
}

fn write_document(document: &TrackDocument, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    gpx::write(document, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// `<output stem> <track name>.gpx` beside the output path, with a numeric
/// suffix for names already taken.
fn track_path(output: &Path, document: &TrackDocument, taken: &mut BTreeSet<PathBuf>) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = sanitize_file_name(&gpx::display_name(document));

    let mut n = 1;
    loop {
        let file_name = match n {
            1 => format!("{stem} {name}.gpx"),
            n => format!("{stem} {name} ({n}).gpx"),
        };
        let path = output.with_file_name(file_name.trim());

        if taken.insert(path.clone()) {
            return path;
        }
        n += 1;
    }
}
