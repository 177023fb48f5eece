use clap::Parser;
use std::path::PathBuf;

/// Sort photos into a date-based directory tree.
///
/// Every file under SOURCE with an allowlisted extension is dated (from its
/// EXIF capture time when possible, its filesystem timestamps otherwise) and
/// copied to `destination-root` under a path rendered from `path-template`.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory to scan [default: `source-root` from configuration]
    pub source: Option<PathBuf>,

    /// Log at debug level, whatever `log-level` says.
    #[arg(short, long)]
    pub debug: bool,

    /// Answer a few questions, save them as configuration, then exit.
    #[arg(long)]
    pub init: bool,

    /// Configuration file to read (and write, with --init).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Work out where everything would go without writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
