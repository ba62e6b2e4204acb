//! Configuration file parsing for `sift.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `sift.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiftConfig {
    /// Scan execution settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Filter defaults.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl SiftConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(engine) = overrides.engine {
                if let Some(threshold) = engine.parallel_threshold {
                    self.engine.parallel_threshold = threshold;
                }
                if let Some(threads) = engine.worker_threads {
                    self.engine.worker_threads = threads;
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(log_filters) = debug.log_filters {
                    self.debug.log_filters = log_filters;
                }
                if debug.log_level.is_some() {
                    self.debug.log_level = debug.log_level;
                }
            }
        }
        self
    }
}

/// Scan execution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Row count at or above which a scan is split across worker threads.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Worker threads for parallel scans; `0` uses the CPU count.
    #[serde(default)]
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
            worker_threads: 0,
        }
    }
}

fn default_parallel_threshold() -> usize {
    65_536
}

/// Filter defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Combinator used when a filter spec does not name one.
    #[serde(default)]
    pub default_combinator: CombinatorSetting,
}

/// Combinator token accepted in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinatorSetting {
    /// Every clause must pass.
    #[default]
    And,
    /// At least one clause must pass.
    Or,
}

/// Debug/logging settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every compiled clause at debug level.
    #[serde(default)]
    pub log_filters: bool,

    /// Log level passed to the subscriber (trace, debug, info, warn, error).
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Environment-specific override block.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Engine overrides.
    #[serde(default)]
    pub engine: Option<EngineOverride>,

    /// Debug overrides.
    #[serde(default)]
    pub debug: Option<DebugOverride>,
}

/// Engine override values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOverride {
    /// Override for `engine.parallel_threshold`.
    pub parallel_threshold: Option<usize>,
    /// Override for `engine.worker_threads`.
    pub worker_threads: Option<usize>,
}

/// Debug override values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override for `debug.log_filters`.
    pub log_filters: Option<bool>,
    /// Override for `debug.log_level`.
    pub log_level: Option<String>,
}

/// Expand `${VAR}` and `${VAR:-default}` references. Unset variables without
/// a default are left as written.
fn expand_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}") else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        match std::env::var(&caps[1]) {
            Ok(value) => value,
            Err(_) => match caps.get(2) {
                Some(default) => default.as_str().to_string(),
                None => caps[0].to_string(),
            },
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiftConfig::default();
        assert_eq!(config.engine.parallel_threshold, 65_536);
        assert_eq!(config.engine.worker_threads, 0);
        assert_eq!(config.filter.default_combinator, CombinatorSetting::And);
        assert!(!config.debug.log_filters);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [filter]
            default_combinator = "or"
        "#;

        let config = SiftConfig::from_str(toml).unwrap();
        assert_eq!(config.filter.default_combinator, CombinatorSetting::Or);
        assert_eq!(config.engine.parallel_threshold, 65_536);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SiftConfig::from_str("[engine]\nthreads = 4\n").unwrap_err();
        assert!(matches!(err, SchemaError::TomlError { .. }));
    }

    #[test]
    fn test_environment_override() {
        let toml = r#"
            [engine]
            parallel_threshold = 1000

            [environments.test.engine]
            parallel_threshold = 10
            worker_threads = 2

            [environments.test.debug]
            log_filters = true
        "#;

        let config = SiftConfig::from_str(toml).unwrap().with_environment("test");
        assert_eq!(config.engine.parallel_threshold, 10);
        assert_eq!(config.engine.worker_threads, 2);
        assert!(config.debug.log_filters);
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: This test runs single-threaded and we clean up after
        unsafe {
            std::env::set_var("SIFT_TEST_THRESHOLD", "42");
        }
        let expanded = expand_env_vars("parallel_threshold = ${SIFT_TEST_THRESHOLD}");
        assert_eq!(expanded, "parallel_threshold = 42");
        unsafe {
            std::env::remove_var("SIFT_TEST_THRESHOLD");
        }
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nworker_threads = 4").unwrap();

        let config = SiftConfig::from_file(file.path()).unwrap();
        assert_eq!(config.engine.worker_threads, 4);

        let err = SiftConfig::from_file(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, SchemaError::IoError { .. }));
    }

    #[test]
    fn test_env_var_default() {
        let expanded = expand_env_vars("worker_threads = ${SIFT_TEST_UNSET_VAR:-3}");
        assert_eq!(expanded, "worker_threads = 3");
        let untouched = expand_env_vars("x = \"${SIFT_TEST_UNSET_VAR}\"");
        assert_eq!(untouched, "x = \"${SIFT_TEST_UNSET_VAR}\"");
    }
}
