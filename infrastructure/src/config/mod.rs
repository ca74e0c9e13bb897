//! Configuration file loading for layered-moa
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MOA_*` environment variables (`MOA_MODELS__CYCLES=2`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./moa.toml` or `./.moa.toml`
//! 4. Global: `~/.config/moa/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ECHO_BACKEND, FileConfig, FileConfigError, FileExecutionConfig, FileHttpBackendConfig,
    FileLayerAgentConfig, FileLoggingConfig, FileModelsConfig, FileOutputConfig,
    FileProvidersConfig, FileReplConfig, KNOWN_SECTIONS, ResolvedConfig,
};
pub use loader::{ConfigLoader, ConfigSource, ENV_PREFIX};
