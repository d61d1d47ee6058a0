use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::watcher::batcher::DEFAULT_QUIET_PERIOD;

/// Configuration loaded from `import-mend.toml` at the project root.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MendConfig {
    /// Additional path patterns to exclude from rewriting (beyond .gitignore and node_modules).
    pub exclude: Option<Vec<String>>,
    /// Quiet period in milliseconds before a batch of filesystem events is
    /// considered complete. Defaults to 100.
    pub quiet_ms: Option<u64>,
}

impl MendConfig {
    /// Load configuration from `import-mend.toml` in the given root directory.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join("import-mend.toml");

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to parse import-mend.toml, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to read import-mend.toml, using defaults");
                Self::default()
            }
        }
    }

    /// Quiet period for the event batcher, falling back to the default.
    pub fn quiet_period(&self) -> Duration {
        self.quiet_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QUIET_PERIOD)
    }
}
