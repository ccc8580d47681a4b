//! `devtool bump-version`: update manifest versions, tag the release and push.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument, warn};

use crate::core::description::GitDescription;
use crate::core::version::{Components, Version};
use crate::io::config::{LockConfig, config_path, load_config};
use crate::io::git::Git;
use crate::io::manifest::{Manifests, write_cargo_version, write_pyproject_version};
use crate::io::process::run_with_timeout;

#[derive(Debug, Clone)]
pub struct BumpOptions {
    /// Explicit version to release; derived from the latest tag when `None`.
    pub version: Option<Version>,
    /// Push commits and tags after tagging.
    pub push: bool,
    /// Run checks and report the plan without changing anything.
    pub dry_run: bool,
}

impl Default for BumpOptions {
    fn default() -> Self {
        Self {
            version: None,
            push: true,
            dry_run: false,
        }
    }
}

/// Result of a bump attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpOutcome {
    Released(Release),
    /// `HEAD` is already at the most recent tag; nothing was changed.
    NoNewCommits { tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: Version,
    pub tag: String,
    /// Manifests rewritten (all candidates when `dry_run`).
    pub manifests: Vec<PathBuf>,
    pub lock_refreshed: bool,
    pub committed: bool,
    pub pushed: bool,
    pub dry_run: bool,
}

/// The version the next release would get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextVersion {
    /// No tags yet: start from the configured initial version.
    Initial(Version),
    /// Latest tag incremented.
    Increment(Version),
    /// `HEAD` is exactly at the latest tag.
    AtTag,
}

impl NextVersion {
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::Initial(version) | Self::Increment(version) => Some(version),
            Self::AtTag => None,
        }
    }
}

/// Work out the next version from `git describe`.
pub fn next_version(
    description: Option<&GitDescription>,
    initial: &Version,
) -> Result<NextVersion> {
    let Some(description) = description else {
        return Ok(NextVersion::Initial(initial.clone()));
    };
    if description.is_at_tag() {
        return Ok(NextVersion::AtTag);
    }
    let tag: Version = description
        .tag
        .parse()
        .with_context(|| format!("cannot parse tag '{}' as version", description.tag))?;
    Ok(NextVersion::Increment(tag.incremented()?))
}

#[instrument(skip_all, fields(root = %root.display(), push = options.push, dry_run = options.dry_run))]
pub fn run_bump(root: &Path, options: &BumpOptions) -> Result<BumpOutcome> {
    let cfg = load_config(&config_path(root)).context("load config")?;
    let git = Git::new(root);

    ensure_identity(&git)?;

    let branch = git.current_branch()?;
    if !cfg.release_branches.contains(&branch) {
        bail!(
            "must be on a release branch ({}), currently on '{branch}'",
            cfg.release_branches.join(", ")
        );
    }

    git.ensure_clean()?;

    if options.push && git.upstream(&branch)?.is_none() {
        bail!(
            "branch {branch} has no upstream set: set with git push -u origin {branch} or similar"
        );
    }

    let version = match &options.version {
        Some(version) => version.clone(),
        None => {
            let description = git.describe()?;
            let next = next_version(description.as_ref(), &cfg.initial_version)?;
            match next.version() {
                Some(version) => version.clone(),
                None => {
                    let tag = description.map(|d| d.tag).unwrap_or_default();
                    info!(tag = %tag, "no commits since most recent tag");
                    return Ok(BumpOutcome::NoNewCommits { tag });
                }
            }
        }
    };
    let tag = version.to_string();
    if git.tag_exists(&tag)? {
        bail!("tag {tag} already exists");
    }

    let manifests = Manifests::resolve(root, &cfg)?;
    if !manifests.cargo_toml_paths.is_empty()
        && !matches!(version.components(), Components::Full(..))
    {
        bail!("Cargo packages need a major.minor.patch version, got '{version}'");
    }
    let package_version = version.with_prefix(false).to_string();
    debug!(%version, package_version = %package_version, ?manifests, "release plan");

    if options.dry_run {
        let mut all = manifests.cargo_toml_paths.clone();
        all.extend(manifests.pyproject_toml_paths.iter().cloned());
        return Ok(BumpOutcome::Released(Release {
            version,
            tag,
            manifests: all,
            lock_refreshed: false,
            committed: false,
            pushed: false,
            dry_run: true,
        }));
    }

    let staged = match stage_release(root, &git, &cfg.lock, &manifests, &package_version) {
        Ok(staged) => staged,
        Err(err) => {
            // The worktree was clean before any manifest was touched.
            if let Err(reset_err) = git.discard_changes() {
                warn!(err = %format!("{reset_err:#}"), "failed to restore worktree");
            }
            return Err(err);
        }
    };

    git.create_annotated_tag(&tag)?;
    info!(tag = %tag, "created tag");

    if options.push {
        git.push_follow_tags()?;
        info!("pushed commits and tags");
    }

    Ok(BumpOutcome::Released(Release {
        version,
        tag,
        manifests: staged.manifests,
        lock_refreshed: staged.lock_refreshed,
        committed: staged.committed,
        pushed: options.push,
        dry_run: false,
    }))
}

/// Result of rewriting manifests and committing them.
struct Staged {
    manifests: Vec<PathBuf>,
    lock_refreshed: bool,
    committed: bool,
}

/// Rewrite manifest versions, refresh the lock file and commit.
fn stage_release(
    root: &Path,
    git: &Git,
    lock: &LockConfig,
    manifests: &Manifests,
    package_version: &str,
) -> Result<Staged> {
    let mut updated = Vec::new();
    for path in &manifests.cargo_toml_paths {
        if write_cargo_version(path, package_version)? {
            git.add(path)?;
            updated.push(path.clone());
        }
    }
    let cargo_changed = !updated.is_empty();
    for path in &manifests.pyproject_toml_paths {
        if write_pyproject_version(path, package_version)? {
            git.add(path)?;
            updated.push(path.clone());
        }
    }

    let lock_refreshed = cargo_changed && refresh_lock(root, git, lock)?;

    let committed = git.commit_staged(&format!("Bump version to {package_version}"))?;
    Ok(Staged {
        manifests: updated,
        lock_refreshed,
        committed,
    })
}

fn ensure_identity(git: &Git) -> Result<()> {
    if git.read_config("user.name")?.is_none() {
        bail!("Git user name is not set");
    }
    if git.read_config("user.email")?.is_none() {
        bail!("Git e-mail address is not set");
    }
    Ok(())
}

/// Regenerate and stage `Cargo.lock` when the root manifest and lock file are tracked.
#[instrument(skip_all)]
fn refresh_lock(root: &Path, git: &Git, lock: &LockConfig) -> Result<bool> {
    let cargo_toml = root.join("Cargo.toml");
    let cargo_lock = root.join("Cargo.lock");
    if !git.is_tracked(&cargo_toml)? || !git.is_tracked(&cargo_lock)? {
        debug!("Cargo.lock not tracked, skipping lock refresh");
        return Ok(false);
    }
    let output = run_with_timeout(
        &lock.command,
        root,
        Duration::from_secs(lock.timeout_secs),
        lock.output_limit_bytes,
    )?;
    output.ensure_success(&lock.command.join(" "))?;
    git.add(&cargo_lock)?;
    Ok(true)
}
