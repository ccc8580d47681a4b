//! `devtool gen-config`: write `.devtool.toml` with the discovered manifests.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::io::config::{DevtoolConfig, config_path, write_config};
use crate::io::manifest::Manifests;

/// Build the default configuration for `root` with manifest paths pinned.
pub fn default_config_for(root: &Path) -> Result<DevtoolConfig> {
    let manifests = Manifests::discover(root)?.relative_to(root);
    Ok(DevtoolConfig {
        cargo_toml_paths: Some(manifests.cargo_toml_paths),
        pyproject_toml_paths: Some(manifests.pyproject_toml_paths),
        ..DevtoolConfig::default()
    })
}

pub fn generate_config(root: &Path, force: bool) -> Result<PathBuf> {
    let cfg = default_config_for(root)?;
    let path = config_path(root);
    write_config(&path, &cfg, force)?;
    debug!(path = %path.display(), "wrote config");
    Ok(path)
}
