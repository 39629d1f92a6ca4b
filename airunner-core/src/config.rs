//! Configuration types for the AI Runner agent core

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::agents::DEFAULT_MIN_SCORE;
use crate::error::{Result, RunnerError};

/// Main configuration for the agent core
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    /// Agent routing configuration
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Tool surface configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Agent routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Minimum relevance score an agent needs to be selected
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Maximum number of agents selected per routed task
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Run several selected agents concurrently instead of one after another
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,

    /// Per-agent execution timeout (none = wait indefinitely)
    #[serde(default, with = "humantime_serde")]
    pub agent_timeout: Option<Duration>,
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

fn default_max_agents() -> usize {
    1
}

fn default_concurrent() -> bool {
    true
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_agents: default_max_agents(),
            concurrent: default_concurrent(),
            agent_timeout: None,
        }
    }
}

/// Tool surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory the file tools are confined to
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Load user-authored tools from the custom tool store
    #[serde(default = "default_custom_tools_enabled")]
    pub custom_tools_enabled: bool,

    /// Memory ceiling for each custom tool's script VM, in bytes
    #[serde(default = "default_script_memory_limit")]
    pub script_memory_limit: usize,

    /// Wall-clock budget for loading or running one custom tool script
    #[serde(default = "default_script_timeout", with = "humantime_serde")]
    pub script_timeout: Duration,

    /// Capacity of the host command channel
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_custom_tools_enabled() -> bool {
    true
}

fn default_script_memory_limit() -> usize {
    16 * 1024 * 1024
}

fn default_script_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_command_buffer() -> usize {
    64
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            custom_tools_enabled: default_custom_tools_enabled(),
            script_memory_limit: default_script_memory_limit(),
            script_timeout: default_script_timeout(),
            command_buffer: default_command_buffer(),
        }
    }
}

/// Configuration builder for programmatic setup
pub struct ConfigBuilder {
    config: RunnerConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    /// Set routing configuration
    pub fn routing(mut self, config: RoutingConfig) -> Self {
        self.config.routing = config;
        self
    }

    /// Set tools configuration
    pub fn tools(mut self, config: ToolsConfig) -> Self {
        self.config.tools = config;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RunnerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `airunner.toml` in the working directory
    /// 3. The file named by `AIRUNNER_CONFIG_PATH`, if set
    /// 4. `AIRUNNER_` environment variables (`__` separates nested keys,
    ///    e.g. `AIRUNNER_ROUTING__MAX_AGENTS=2`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source is malformed or the result fails validation.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(RunnerConfig::default()))
            .merge(Toml::file("airunner.toml"));

        if let Ok(path) = std::env::var("AIRUNNER_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("AIRUNNER_")
                .ignore(&["CONFIG_PATH"])
                .split("__"),
        );

        let config: RunnerConfig = figment.extract().map_err(|e| {
            RunnerError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let path = path.as_ref();
        if !path.is_file() {
            return Err(RunnerError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let config: RunnerConfig = Figment::from(Serialized::defaults(RunnerConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                RunnerError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is outside its accepted range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.routing.min_score) {
            return Err(RunnerError::Configuration(format!(
                "routing.min_score must be within [0, 1], got {}",
                self.routing.min_score
            )));
        }
        if self.routing.max_agents == 0 {
            return Err(RunnerError::Configuration(
                "routing.max_agents must be at least 1".to_string(),
            ));
        }
        if self.tools.script_timeout.is_zero() {
            return Err(RunnerError::Configuration(
                "tools.script_timeout must be greater than zero".to_string(),
            ));
        }
        if self.tools.command_buffer == 0 {
            return Err(RunnerError::Configuration(
                "tools.command_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RunnerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.min_score, 0.3);
        assert_eq!(config.routing.max_agents, 1);
        assert!(config.routing.concurrent);
        assert!(config.routing.agent_timeout.is_none());
        assert!(config.tools.custom_tools_enabled);
        assert_eq!(config.tools.script_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[routing]
max_agents = 3
agent_timeout = "5s"

[tools]
workspace_root = "/tmp/airunner"
script_timeout = "250ms"
"#
        )
        .unwrap();

        let config = RunnerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.routing.max_agents, 3);
        assert_eq!(config.routing.agent_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.routing.min_score, 0.3);
        assert_eq!(config.tools.workspace_root, PathBuf::from("/tmp/airunner"));
        assert_eq!(config.tools.command_buffer, 64);
        assert_eq!(config.tools.script_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[routing]\nmin_score = 1.5").unwrap();

        let err = RunnerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, RunnerError::Configuration(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(RunnerConfig::from_file("/nonexistent/airunner.toml").is_err());
    }

    #[test]
    fn test_load_merges_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("airunner.toml", "[routing]\nmin_score = 0.5")?;
            jail.set_env("AIRUNNER_ROUTING__MAX_AGENTS", "2");

            let config = RunnerConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.routing.min_score, 0.5);
            assert_eq!(config.routing.max_agents, 2);
            Ok(())
        });
    }

    #[test]
    fn test_builder_validates() {
        let result = ConfigBuilder::new()
            .routing(RoutingConfig {
                max_agents: 0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());

        let config = ConfigBuilder::new()
            .tools(ToolsConfig {
                custom_tools_enabled: false,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert!(!config.tools.custom_tools_enabled);
    }
}
