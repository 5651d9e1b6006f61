use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "spritecut", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Slice sprite sheets into per-character frames, previews and descriptors.
    Extract(ExtractArgs),
    /// Rebuild the character index from existing descriptors.
    Index(IndexArgs),
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Sheets to process. Defaults to every PNG directly inside `--assets`.
    sheets: Vec<PathBuf>,

    /// Directory scanned for sheets when none are given.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Output root; one subdirectory per character.
    #[arg(long, default_value = "extracted_frames")]
    out: PathBuf,

    /// JSON file overriding the grid layout and preview settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip rebuilding the character index afterwards.
    #[arg(long, default_value_t = false)]
    no_index: bool,
}

#[derive(Parser, Debug)]
struct IndexArgs {
    /// Output root holding the character directories.
    #[arg(long, default_value = "extracted_frames")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Extract(args) => cmd_extract(args),
        Command::Index(args) => cmd_index(args),
    }
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let cfg = match &args.config {
        Some(path) => spritecut::SlicerConfig::from_path(path)?,
        None => spritecut::SlicerConfig::default(),
    };

    let sheets = if args.sheets.is_empty() {
        spritecut::discover_sheets(&args.assets)
            .with_context(|| format!("find sheets in '{}'", args.assets.display()))?
    } else {
        args.sheets
    };
    if sheets.is_empty() {
        tracing::warn!(assets = %args.assets.display(), "no sprite sheets found");
    }

    let report = spritecut::run_batch(&sheets, &args.out, &cfg);
    for sheet in &report.processed {
        eprintln!(
            "{}: {} characters",
            sheet.sheet.display(),
            sheet.characters.len()
        );
    }

    if !args.no_index {
        let (path, index) = spritecut::rebuild_index(&args.out)?;
        eprintln!("wrote {} ({} characters)", path.display(), index.len());
    }

    if !report.is_success() {
        for (sheet, err) in &report.failed {
            eprintln!("failed {}: {err}", sheet.display());
        }
        anyhow::bail!(
            "{} of {} sheets failed",
            report.failed.len(),
            sheets.len()
        );
    }
    Ok(())
}

fn cmd_index(args: IndexArgs) -> anyhow::Result<()> {
    let (path, index) = spritecut::rebuild_index(&args.out)
        .with_context(|| format!("rebuild index in '{}'", args.out.display()))?;
    eprintln!("wrote {} ({} characters)", path.display(), index.len());
    Ok(())
}
