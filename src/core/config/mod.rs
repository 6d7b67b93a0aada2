use std::fmt;

mod aliases;
mod loader;
mod paths;

pub use aliases::AliasManager;
pub use loader::ConfigLoader;
pub use paths::ConfigPaths;

use super::env::EnvVarManager;

/// Startup state assembled from the rc file.
#[derive(Debug, Clone)]
pub struct Config {
    paths: ConfigPaths,
    pub env_vars: EnvVarManager,
    pub aliases: AliasManager,
}

impl Config {
    pub fn new(paths: ConfigPaths) -> Self {
        Config {
            paths,
            env_vars: EnvVarManager::new(),
            aliases: AliasManager::new(),
        }
    }

    /// Builds a config and applies the rc file named in `paths`.
    pub fn load(paths: ConfigPaths) -> Result<Self, ConfigError> {
        let mut config = Config::new(paths);
        let paths = config.paths.clone();
        ConfigLoader::new(&paths).load_configs(&mut config)?;
        Ok(config)
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }
}

#[derive(Debug)]
pub enum ConfigError {
    HomeDirNotFound,
    IoError(std::io::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::HomeDirNotFound => write!(f, "Home directory not found"),
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
