//! First-run setup: a handful of prompts whose answers become the saved
//! configuration.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shoebox_config::Config;
use shoebox_library::PathGenerator;
use shoebox_storage::Extensions;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Asks for the settings a first run needs, offering current values as
/// defaults (an empty answer keeps them).
///
/// Invalid answers are explained and asked again.
pub fn interactive(mut config: Config, input: &mut impl BufRead, output: &mut impl Write) -> Result<Config> {
    let mut prompt = Prompt { input, output };
    config.source_root = Some(prompt.path("Directory to scan", config.source_root)?);
    config.destination_root = Some(prompt.path("Directory to organize into", config.destination_root)?);
    config.extensions = prompt.parsed::<Extensions>("Extensions (comma-separated)", &config.extensions)?.to_string();
    config.path_template = prompt.parsed::<PathGenerator>("Path template", &config.path_template)?.to_string();
    config.fallback_on_metadata_failure =
        prompt.flag("Use file timestamps when a photo has no capture date?", config.fallback_on_metadata_failure)?;
    Ok(config)
}

struct Prompt<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}
impl<R: BufRead, W: Write> Prompt<'_, R, W> {
    /// Returns the trimmed answer, or `None` for an empty one.
    fn ask(&mut self, question: &str, current: Option<&str>) -> Result<Option<String>> {
        match current {
            Some(current) => write!(self.output, "{question} [{current}]: "),
            None => write!(self.output, "{question}: "),
        }
        .or_raise(|| ErrorKind::Setup)?;
        self.output.flush().or_raise(|| ErrorKind::Setup)?;

        let mut line = String::new();
        if self.input.read_line(&mut line).or_raise(|| ErrorKind::Setup)? == 0 {
            // Input closed; asking again would loop forever.
            exn::bail!(ErrorKind::Setup);
        }
        let answer = line.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    fn complain(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.output, "  {message}").or_raise(|| ErrorKind::Setup)
    }

    fn path(&mut self, question: &str, current: Option<PathBuf>) -> Result<PathBuf> {
        loop {
            let shown = current.as_ref().map(|p| p.display().to_string());
            match (self.ask(question, shown.as_deref())?, &current) {
                (Some(answer), _) => return Ok(PathBuf::from(answer)),
                (None, Some(current)) => return Ok(current.clone()),
                (None, None) => self.complain("a directory is required")?,
            }
        }
    }

    fn parsed<T: FromStr>(&mut self, question: &str, current: &str) -> Result<T> {
        loop {
            let answer = self.ask(question, Some(current))?.unwrap_or_else(|| current.to_string());
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(_) => self.complain(format_args!("`{answer}` is not valid here"))?,
            }
        }
    }

    fn flag(&mut self, question: &str, current: bool) -> Result<bool> {
        let shown = if current { "Y/n" } else { "y/N" };
        loop {
            match self.ask(question, Some(shown))?.map(|a| a.to_lowercase()).as_deref() {
                None => return Ok(current),
                Some("y" | "yes" | "true") => return Ok(true),
                Some("n" | "no" | "false") => return Ok(false),
                Some(_) => self.complain("answer yes or no")?,
            }
        }
    }
}
