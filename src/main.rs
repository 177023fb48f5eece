mod cli;
mod error;
mod logging;
mod progress;
mod setup;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use crate::progress::ProgressReporter;
use clap::Parser;
use exn::{OptionExt, ResultExt};
use shoebox_config::{Config, Settings};
use shoebox_library::date::DateResolver;
use shoebox_library::pipeline::{self, Transfer, format_elapsed};
use shoebox_library::place::Context;
use shoebox_storage::DestinationHandle;
use shoebox_storage::backend::{LocalBackend, ReadOnlyBackend};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    match execute(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().or_else(Config::default_path);
    let config = Config::load(config_path.as_deref()).or_raise(|| ErrorKind::Config)?;

    if cli.init {
        let path = config_path.ok_or_raise(|| ErrorKind::Setup)?;
        let config = setup::interactive(config, &mut io::stdin().lock(), &mut io::stdout())?;
        config.save(&path).or_raise(|| ErrorKind::Setup)?;
        println!("Saved configuration to {}", path.display());
        return Ok(());
    }

    let settings = config.validate(cli.source).or_raise(|| ErrorKind::Config)?;
    let level = logging::level(cli.debug, settings.log_level);
    let subscriber = logging::subscriber(level, settings.log_path.as_deref())?;
    let _guard = tracing::subscriber::set_default(subscriber);
    organize(&settings, cli.dry_run)
}

fn organize(settings: &Settings, dry_run: bool) -> Result<()> {
    if settings.transfer != Transfer::Copy {
        exn::bail!(ErrorKind::Unsupported(settings.transfer.to_string()));
    }
    let root = &settings.destination_root;
    let destination: DestinationHandle = match dry_run {
        true => {
            let local = LocalBackend::untouched("destination", root).or_raise(|| ErrorKind::Destination(root.clone()))?;
            Box::new(ReadOnlyBackend::new(Box::new(local)))
        },
        false => Box::new(LocalBackend::new("destination", root).or_raise(|| ErrorKind::Destination(root.clone()))?),
    };
    let ctx = Context {
        resolver: DateResolver::probe(settings.on_metadata_failure),
        template: settings.template.clone(),
        collision: settings.collision,
    };
    tracing::info!(
        source = %settings.source_root.display(),
        destination = %root.display(),
        template = %ctx.template,
        collision = %ctx.collision,
        dry_run,
        "Organizing"
    );

    let mut reporter = ProgressReporter::new(dry_run);
    let stats = pipeline::run(
        &settings.source_root,
        &settings.extensions,
        destination.as_ref(),
        &ctx,
        settings.transfer,
        &mut reporter,
    )
    .or_raise(|| ErrorKind::Run)?;

    println!("{}", format_elapsed(stats.elapsed));
    println!("{}", stats.candidates);
    Ok(())
}
