//! `devtool gen-workflow`: write the CI workflow described by the config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::io::config::{config_path, load_config};
use crate::io::files::write_file;
use crate::io::workflow::{render_workflow, workflow_path};

/// Render the configured workflow without writing it.
pub fn render_configured_workflow(root: &Path) -> Result<String> {
    let cfg = load_config(&config_path(root)).context("load config")?;
    render_workflow(&cfg.workflow)
}

pub fn generate_workflow(root: &Path, force: bool) -> Result<PathBuf> {
    let rendered = render_configured_workflow(root)?;
    let path = workflow_path(root);
    write_file(&path, &rendered, force)?;
    Ok(path)
}
