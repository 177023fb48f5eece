//! Configuration for shoebox.
//!
//! Settings are layered with [`figment`], later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, YAML or JSON, picked by extension), by
//!    default `config.toml` in the platform configuration directory,
//! 3. environment variables prefixed with `SHOEBOX_`, e.g.
//!    `SHOEBOX_DESTINATION_ROOT=/photos` sets `destination-root`.
//!
//! The raw [`Config`] only holds strings and flags; [`Config::validate`] turns
//! it into typed [`Settings`] so that a bad template or extension list fails
//! at startup, before any file is touched.

mod error;

pub use crate::error::{Error, ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use shoebox_library::date::MetadataFailure;
use shoebox_library::pipeline::Transfer;
use shoebox_library::place::CollisionPolicy;
use shoebox_library::{DEFAULT_TEMPLATE, PathGenerator};
use shoebox_storage::{DEFAULT_EXTENSIONS, Extensions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SHOEBOX_";

/// Configuration as written by a human: every key optional, nothing parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Tree scanned when no source is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_root: Option<PathBuf>,
    /// Comma-separated, case-insensitive.
    pub extensions: String,
    pub path_template: String,
    pub fallback_on_metadata_failure: bool,
    /// `overwrite`, `skip`, `fail` or `rename`.
    pub collision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    pub log_level: String,
    pub copy_vs_move: String,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: None,
            destination_root: None,
            extensions: DEFAULT_EXTENSIONS.to_string(),
            path_template: DEFAULT_TEMPLATE.to_string(),
            fallback_on_metadata_failure: true,
            collision: CollisionPolicy::default().to_string(),
            log_path: None,
            log_level: LevelFilter::INFO.to_string().to_lowercase(),
            copy_vs_move: Transfer::default().to_string(),
        }
    }
}

/// Validated settings for a single run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    pub extensions: Extensions,
    pub template: PathGenerator,
    pub on_metadata_failure: MetadataFailure,
    pub collision: CollisionPolicy,
    pub transfer: Transfer,
    pub log_path: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Config {
    /// `config.toml` in the platform configuration directory, if the platform
    /// has one (`~/.config/shoebox/config.toml` on Linux).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "shoebox").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Layers defaults, the file at `path` (or [`default_path`](Self::default_path))
    /// and the environment.
    ///
    /// A missing file is not an error; only defaults and the environment
    /// apply then.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            figment = match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().replace('_', "-").into()))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path).extract().or_raise(|| ErrorKind::Load)?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Parses every value, filling in the source root from `source_override`
    /// when given.
    ///
    /// Relative roots are made absolute against the current directory.
    pub fn validate(&self, source_override: Option<PathBuf>) -> Result<Settings> {
        let source_root =
            source_override.or_else(|| self.source_root.clone()).ok_or_raise(|| ErrorKind::Missing("source-root"))?;
        let destination_root = self.destination_root.clone().ok_or_raise(|| ErrorKind::Missing("destination-root"))?;
        Ok(Settings {
            source_root: absolute(&source_root, "source-root")?,
            destination_root: absolute(&destination_root, "destination-root")?,
            extensions: self.extensions.parse::<Extensions>().or_raise(|| ErrorKind::Invalid("extensions"))?,
            template: self.path_template.parse::<PathGenerator>().or_raise(|| ErrorKind::Invalid("path-template"))?,
            on_metadata_failure: MetadataFailure::from(self.fallback_on_metadata_failure),
            collision: self.collision.parse::<CollisionPolicy>().or_raise(|| ErrorKind::Invalid("collision"))?,
            transfer: self.copy_vs_move.parse::<Transfer>().or_raise(|| ErrorKind::Invalid("copy-vs-move"))?,
            log_path: match &self.log_path {
                Some(path) => Some(absolute(path, "log-path")?),
                None => None,
            },
            log_level: self.log_level.trim().parse::<LevelFilter>().or_raise(|| ErrorKind::Invalid("log-level"))?,
        })
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raise = || ErrorKind::Save(path.to_path_buf());
        let contents = toml::to_string_pretty(self).or_raise(raise)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).or_raise(raise)?;
        }
        fs::write(path, contents).or_raise(raise)?;
        tracing::info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

fn absolute(path: &Path, key: &'static str) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        exn::bail!(ErrorKind::Missing(key));
    }
    std::path::absolute(path).or_raise(|| ErrorKind::Invalid(key))
}
