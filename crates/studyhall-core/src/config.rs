//! Application configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the application starts with zero
//! configuration.

use std::path::PathBuf;

/// Core configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Directory holding the SQLite database.
    /// Env: `STUDYHALL_DATA_DIR`
    /// Default: the platform data directory (`None`).
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("STUDYHALL_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        // RUST_LOG is handled directly by the embedding UI's subscriber,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_platform_dir() {
        let config = AppConfig::default();
        assert!(config.data_dir.is_none());
    }
}
