//! Project configuration stored in `.devtool.toml` at the repository root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::files::write_file;
use crate::core::version::{Components, Version};
use crate::core::workflow::{Workflow, validate_workflow};

pub const CONFIG_FILE_NAME: &str = ".devtool.toml";

/// Devtool configuration (TOML).
///
/// This file is intended to be edited by humans and checked in. Missing
/// fields default to the behaviour of an unconfigured repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DevtoolConfig {
    /// Branches on which `bump-version` may create release tags.
    pub release_branches: Vec<String>,

    /// Tag used for the first release when the repository has no tags.
    pub initial_version: Version,

    /// Cargo manifests to update, relative to the repository root.
    /// Discovered by walking the repository when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_toml_paths: Option<Vec<PathBuf>>,

    /// Python project manifests to update, relative to the repository root.
    /// Discovered by walking the repository when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pyproject_toml_paths: Option<Vec<PathBuf>>,

    pub lock: LockConfig,

    pub workflow: Workflow,
}

/// How `Cargo.lock` is refreshed after manifest versions change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LockConfig {
    /// Command run in the repository root (e.g. `["cargo","update","--workspace"]`).
    pub command: Vec<String>,

    /// Wall-clock budget for the command in seconds.
    pub timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "cargo".to_string(),
                "update".to_string(),
                "--workspace".to_string(),
            ],
            timeout_secs: 10 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for DevtoolConfig {
    fn default() -> Self {
        Self {
            release_branches: vec!["main".to_string(), "master".to_string()],
            initial_version: Version::new(true, Components::Full(0, 0, 0)),
            cargo_toml_paths: None,
            pyproject_toml_paths: None,
            lock: LockConfig::default(),
            workflow: Workflow::default(),
        }
    }
}

impl DevtoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.release_branches.is_empty()
            || self.release_branches.iter().any(|b| b.trim().is_empty())
        {
            return Err(anyhow!("release_branches must be a non-empty array of names"));
        }
        if self.lock.command.is_empty() || self.lock.command[0].trim().is_empty() {
            return Err(anyhow!("lock.command must be a non-empty array"));
        }
        if self.lock.timeout_secs == 0 {
            return Err(anyhow!("lock.timeout_secs must be > 0"));
        }
        if self.lock.output_limit_bytes == 0 {
            return Err(anyhow!("lock.output_limit_bytes must be > 0"));
        }
        let errors = validate_workflow(&self.workflow);
        if !errors.is_empty() {
            return Err(anyhow!("invalid workflow:\n- {}", errors.join("\n- ")));
        }
        Ok(())
    }
}

/// Path of the config file for a repository root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DevtoolConfig::default()`.
pub fn load_config(path: &Path) -> Result<DevtoolConfig> {
    if !path.exists() {
        let cfg = DevtoolConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DevtoolConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Write config to disk, refusing to replace an existing file unless `overwrite`.
pub fn write_config(path: &Path, cfg: &DevtoolConfig, overwrite: bool) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    write_file(path, &buf, overwrite)
}
