//! `devtool show-description`: where `HEAD` stands relative to the latest tag.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::bump::next_version;
use crate::core::description::GitDescription;
use crate::io::config::{config_path, load_config};
use crate::io::git::Git;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescribeReport {
    pub description: Option<GitDescription>,
    /// Version `bump-version` would release, if any.
    pub next_version: Option<String>,
}

impl DescribeReport {
    /// Human-readable report lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.description {
            None => out.push_str("description: (no tags)\n"),
            Some(d) => {
                out.push_str(&format!("description: {}\n", d.description));
                out.push_str(&format!("tag: {}\n", d.tag));
                match &d.offset {
                    Some(offset) => out.push_str(&format!(
                        "commits since tag: {} (at {})\n",
                        offset.count, offset.commit
                    )),
                    None => out.push_str("commits since tag: 0\n"),
                }
            }
        }
        match &self.next_version {
            Some(version) => out.push_str(&format!("next version: {version}\n")),
            None => out.push_str("next version: (none)\n"),
        }
        out
    }
}

pub fn describe_repo(root: &Path) -> Result<DescribeReport> {
    let cfg = load_config(&config_path(root)).context("load config")?;
    let git = Git::new(root);
    let description = git.describe()?;
    let next_version = match next_version(description.as_ref(), &cfg.initial_version) {
        Ok(next) => next.version().map(ToString::to_string),
        Err(err) => {
            warn!(err = %format!("{err:#}"), "cannot derive next version");
            None
        }
    };
    Ok(DescribeReport {
        description,
        next_version,
    })
}
