//! Runs a whole organization pass: walk the source tree, then place every
//! candidate, one at a time.
//!
//! The primary entry point is [`run`], which reports progress to a
//! [`Reporter`] and returns [`RunStats`] on completion. The first placement
//! error aborts the run; files already placed stay where they are.

use crate::error::{Error, ErrorKind, Result};
use crate::place::{Action, Context, Placement, place_file};
use exn::ResultExt;
use shoebox_storage::{Destination, Extensions, walk};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::instrument;

/// How bytes get to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transfer {
    #[default]
    Copy,
    /// Accepted by configuration, rejected by [`run`].
    Move,
}
impl FromStr for Transfer {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            _ => exn::bail!(ErrorKind::Unsupported(s.to_string())),
        }
    }
}
impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "copy",
            Self::Move => "move",
        })
    }
}

/// Progress events emitted by [`run`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete), exactly once, with the
///    total candidate count.
/// 3. [`Placed`](Self::Placed), once per candidate.
/// 4. [`Complete`](Self::Complete), exactly once.
///
/// An error ends the run early, in which case [`Complete`](Self::Complete) is
/// never emitted.
#[derive(Debug)]
pub enum PipelineEvent {
    Started,
    DiscoveryComplete(u64),
    Placed(Placement),
    Complete(RunStats),
}

/// Observes a run. Reporters can't influence it.
pub trait Reporter {
    fn report(&mut self, event: &PipelineEvent);
}
impl Reporter for () {
    fn report(&mut self, _event: &PipelineEvent) {}
}

/// Tallies for a single run. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub candidates: u64,
    pub copied: u64,
    pub overwritten: u64,
    pub renamed: u64,
    pub skipped: u64,
    /// Sources that were already at their destination.
    pub unchanged: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}
impl RunStats {
    fn record(&mut self, placement: &Placement) {
        match placement.action {
            Action::Copied(_) => self.copied += 1,
            Action::Overwrote(_) => self.overwritten += 1,
            Action::Renamed(_) => self.renamed += 1,
            Action::Skipped(_) => self.skipped += 1,
            Action::AlreadyCorrect(_) => self.unchanged += 1,
        }
        self.bytes += placement.bytes;
    }

    /// Files whose bytes were written during the run.
    pub fn written(&self) -> u64 {
        self.copied + self.overwritten + self.renamed
    }
}

/// Organizes every allowlisted file under `source` into `destination`.
///
/// Candidates are placed sequentially in path order. Unreadable directories
/// are skipped during the walk (with a warning each); every other failure
/// aborts the run before the next file is touched. A destination tree nested
/// inside `source` is not walked.
///
/// # Errors
/// - [`ErrorKind::Unsupported`] for [`Transfer::Move`], before anything is
///   read.
/// - [`ErrorKind::Walk`] if the source tree can't be walked.
/// - [`ErrorKind::Place`] for the first file that can't be placed.
#[instrument(skip_all, fields(source = %source.display(), destination = destination.name()))]
pub fn run(
    source: &Path,
    allowlist: &Extensions,
    destination: &dyn Destination,
    ctx: &Context,
    transfer: Transfer,
    reporter: &mut dyn Reporter,
) -> Result<RunStats> {
    if transfer != Transfer::Copy {
        exn::bail!(ErrorKind::Unsupported(transfer.to_string()));
    }
    let started = Instant::now();
    reporter.report(&PipelineEvent::Started);

    let discovered = walk(source, allowlist, destination.on_disk()).or_raise(|| ErrorKind::Walk)?;
    let mut stats = RunStats {
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        candidates: u64::try_from(discovered.candidates.len()).unwrap_or(0),
        ..RunStats::default()
    };
    tracing::info!(candidates = stats.candidates, denied = discovered.denied.len(), "Discovery complete");
    reporter.report(&PipelineEvent::DiscoveryComplete(stats.candidates));

    for candidate in &discovered.candidates {
        let placement = place_file(destination, ctx, candidate)?;
        stats.record(&placement);
        reporter.report(&PipelineEvent::Placed(placement));
    }

    stats.elapsed = started.elapsed();
    tracing::info!(
        written = stats.written(),
        skipped = stats.skipped,
        unchanged = stats.unchanged,
        bytes = stats.bytes,
        elapsed = %format_elapsed(stats.elapsed),
        "Run complete"
    );
    reporter.report(&PipelineEvent::Complete(stats));
    Ok(stats)
}

/// Formats a duration as `1h02m03.45s`, leaving out the hours when there
/// are none (`02m03.45s`). Hundredths are truncated, not rounded.
pub fn format_elapsed(elapsed: Duration) -> String {
    let centis = elapsed.as_millis() / 10;
    let hours = centis / 360_000;
    let minutes = centis / 6_000 % 60;
    let seconds = centis % 6_000;
    let hours = match hours {
        0 => String::new(),
        h => format!("{h}h"),
    };
    format!("{hours}{minutes:02}m{:02}.{:02}s", seconds / 100, seconds % 100)
}
