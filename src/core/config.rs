//! Deployment configuration from YAML

use crate::core::step::StepKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the target path when no config is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "deploy.yaml";

/// Top-level deployment configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Git remote fetched from and merged against
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Kill commands running longer than this (no limit when absent)
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,

    #[serde(default = "StepCommands::dependencies")]
    pub dependencies: StepCommands,

    #[serde(default = "StepCommands::frontend")]
    pub frontend: StepCommands,

    #[serde(default = "StepCommands::reload")]
    pub reload: StepCommands,

    #[serde(default = "StepCommands::cache")]
    pub cache: StepCommands,

    #[serde(default = "StepCommands::database")]
    pub database: StepCommands,

    #[serde(default = "StepCommands::worker")]
    pub worker: StepCommands,
}

/// Commands run by one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepCommands {
    /// Set to false to always skip the step
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Path, relative to the target, that must exist for the step to run
    #[serde(default)]
    pub requires: Option<String>,

    /// Argument vectors, run in order; `{{ name }}` placeholders are substituted
    pub commands: Vec<Vec<String>>,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_enabled() -> bool {
    true
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

impl StepCommands {
    fn new(requires: Option<&str>, commands: Vec<Vec<String>>) -> Self {
        Self {
            enabled: true,
            requires: requires.map(str::to_string),
            commands,
        }
    }

    pub fn dependencies() -> Self {
        Self::new(None, vec![argv(&["composer", "install", "--no-dev"])])
    }

    pub fn frontend() -> Self {
        Self::new(
            Some("package.json"),
            vec![argv(&["npm", "ci"]), argv(&["npm", "run", "build"])],
        )
    }

    pub fn reload() -> Self {
        Self::new(None, vec![argv(&["apachectl", "graceful"])])
    }

    pub fn cache() -> Self {
        Self::new(
            Some("public/cache/translate"),
            vec![argv(&["find", "{{ cache_dir }}", "-mindepth", "1", "-delete"])],
        )
    }

    pub fn database() -> Self {
        Self::new(
            None,
            vec![argv(&["php", "{{ path }}/scripts/build/build.php", "update"])],
        )
    }

    pub fn worker() -> Self {
        Self::new(None, vec![argv(&["supervisorctl", "restart", "{{ worker }}"])])
    }

    /// Render every command with the given variables
    pub fn render(&self, variables: &HashMap<String, String>) -> Vec<Vec<String>> {
        self.commands
            .iter()
            .map(|command| command.iter().map(|arg| render_template(arg, variables)).collect())
            .collect()
    }
}

/// Replace `{{ name }}` placeholders in a single argument
///
/// One left-to-right pass: substituted values are never scanned again, and
/// unknown placeholders are kept as written.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let inside = &rest[start + 2..];
        let Some(end) = inside.find("}}") else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };

        match variables.get(inside[..end].trim()) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(&rest[start..start + end + 4]),
        }
        rest = &inside[end + 2..];
    }

    rendered.push_str(rest);
    rendered
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            command_timeout_secs: None,
            dependencies: StepCommands::dependencies(),
            frontend: StepCommands::frontend(),
            reload: StepCommands::reload(),
            cache: StepCommands::cache(),
            database: StepCommands::database(),
            worker: StepCommands::worker(),
        }
    }
}

impl DeployConfig {
    /// Load deployment configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse deployment configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: DeployConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Find the configuration for a deployment
    ///
    /// An explicit file wins; otherwise `deploy.yaml` in the target path is
    /// used when present, and the built-in defaults when not.
    pub fn discover(explicit: Option<&Path>, target: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate: PathBuf = target.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using config file {}", candidate.display());
            return Self::from_file(candidate);
        }

        Ok(Self::default())
    }

    /// Validate the deployment configuration
    pub fn validate(&self) -> Result<()> {
        if self.remote.trim().is_empty() {
            anyhow::bail!("'remote' must not be empty");
        }
        if self.remote.starts_with('-') {
            anyhow::bail!("Invalid remote '{}'", self.remote);
        }

        if self.command_timeout_secs == Some(0) {
            anyhow::bail!("'command_timeout_secs' must be greater than zero");
        }

        for kind in StepKind::ORDER {
            let Some(step) = self.commands_for(kind) else {
                continue;
            };
            for (index, command) in step.commands.iter().enumerate() {
                match command.first() {
                    None => anyhow::bail!("Step '{}' command #{} is empty", kind.id(), index + 1),
                    Some(program) if program.trim().is_empty() => anyhow::bail!(
                        "Step '{}' command #{} has an empty program name",
                        kind.id(),
                        index + 1
                    ),
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Command section for a step; the git step is not configurable this way
    pub fn commands_for(&self, kind: StepKind) -> Option<&StepCommands> {
        match kind {
            StepKind::GitUpdate => None,
            StepKind::DependencyInstall => Some(&self.dependencies),
            StepKind::FrontendBuild => Some(&self.frontend),
            StepKind::ServiceReload => Some(&self.reload),
            StepKind::CacheInvalidate => Some(&self.cache),
            StepKind::DatabaseMigrate => Some(&self.database),
            StepKind::WorkerRestart => Some(&self.worker),
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}
