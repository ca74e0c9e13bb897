//! Configuration file loader with multi-source merging

use super::file_config::{FileConfig, FileConfigError, KNOWN_SECTIONS};
use figment::{
    Figment, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
};
use moa_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project-level file names, checked in this order.
const PROJECT_FILES: &[&str] = &["moa.toml", ".moa.toml"];

/// Prefix of environment overrides; `__` separates nested keys
/// (`MOA_MODELS__CYCLES=2`).
pub const ENV_PREFIX: &str = "MOA_";

/// One place configuration may come from, for `--show-config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    /// `None` for sources that are not files.
    pub path: Option<PathBuf>,
    pub found: bool,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.found { "FOUND" } else { "     " };
        match &self.path {
            Some(path) => write!(f, "[{}] {:<8} {}", mark, self.label, path.display()),
            None => write!(f, "[{}] {}", mark, self.label),
        }
    }
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `MOA_*` environment variables
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./moa.toml` or `./.moa.toml`
    /// 4. Global: `~/.config/moa/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, FileConfigError> {
        Ok(Self::load_checked(config_path)?.0)
    }

    /// Like [`load`](Self::load), also returning warnings for top-level
    /// tables nothing reads.
    pub fn load_checked(
        config_path: Option<&Path>,
    ) -> Result<(FileConfig, Vec<ConfigIssue>), FileConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(FileConfigError::NotFound(path.to_path_buf()));
        }

        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();
        let figment = Self::layered(global.as_deref(), project.as_deref(), config_path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::extract(&figment)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Defaults followed by whichever files are given, lowest priority first.
    pub(crate) fn layered(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        for path in [global, project, explicit].into_iter().flatten() {
            debug!("Merging config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment
    }

    pub(crate) fn extract(
        figment: &Figment,
    ) -> Result<(FileConfig, Vec<ConfigIssue>), FileConfigError> {
        let config: FileConfig = figment.extract().map_err(Box::new)?;
        let data = figment.data().map_err(Box::new)?;

        let issues = data
            .get(&Profile::Default)
            .into_iter()
            .flat_map(|dict| dict.keys())
            .filter(|key| !KNOWN_SECTIONS.contains(&key.as_str()))
            .map(|key| {
                ConfigIssue::warning(
                    ConfigIssueCode::UnknownKey,
                    format!("unknown configuration section '{}' is ignored", key),
                )
            })
            .collect();

        Ok((config, issues))
    }

    /// Global config file path (`~/.config/moa/config.toml` on Linux)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("moa").join("config.toml"))
    }

    /// Project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Every configuration source, highest priority first.
    pub fn sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = vec![ConfigSource {
            label: "Env: MOA_* variables",
            path: None,
            found: std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX)),
        }];

        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                path: Some(path.to_path_buf()),
                found: path.exists(),
            });
        }

        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                path: Some(path),
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                path: Some(PathBuf::from(PROJECT_FILES.join(" or "))),
                found: false,
            },
        });

        if let Some(path) = Self::global_config_path() {
            let found = path.exists();
            sources.push(ConfigSource {
                label: "Global",
                path: Some(path),
                found,
            });
        }

        sources.push(ConfigSource {
            label: "Default: built-in defaults",
            path: None,
            found: true,
        });
        sources
    }
}
