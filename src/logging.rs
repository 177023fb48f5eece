//! Subscriber wiring for the binary.
//!
//! Events go to stderr and, when `log-path` is configured, are appended to
//! that file without colours. `SHOEBOX_LOG` accepts the usual `EnvFilter`
//! directives and takes precedence over the configured level.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV_VAR: &str = "SHOEBOX_LOG";

/// `--debug` wins over the configured level.
pub fn level(debug: bool, configured: LevelFilter) -> LevelFilter {
    match debug {
        true => LevelFilter::DEBUG.max(configured),
        false => configured,
    }
}

pub fn subscriber(level: LevelFilter, log_path: Option<&Path>) -> Result<impl Subscriber + Send + Sync + 'static> {
    let filter = EnvFilter::builder().with_default_directive(level.into()).with_env_var(LOG_ENV_VAR).from_env_lossy();

    let stderr = fmt::layer().with_writer(std::io::stderr).with_ansi(std::io::stderr().is_terminal()).with_target(false);

    let file = match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .or_raise(|| ErrorKind::Logging(path.to_path_buf()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        },
        None => None,
    };

    Ok(tracing_subscriber::registry().with(filter).with(stderr).with(file))
}
