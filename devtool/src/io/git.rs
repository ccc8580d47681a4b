//! Git adapter for devtool commands.
//!
//! Release operations must refuse to run on a dirty or misconfigured
//! repository, so we keep a small, explicit wrapper around `git` subprocess
//! calls and classify the few failures that are expected answers.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, trace, warn};

use crate::core::description::GitDescription;

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, "??" for untracked or "!!" for ignored.
    pub code: String,
    /// Path for the changed file.
    pub path: String,
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Return the current branch name (errors on detached HEAD).
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(anyhow!("detached HEAD (refuse to run)"));
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    /// Read a config value; `None` when the key is unset.
    pub fn read_config(&self, name: &str) -> Result<Option<String>> {
        let output = self.run(&["config", "--get", name])?;
        if output.status.code() == Some(1) {
            return Ok(None);
        }
        let output = check(&["config", "--get", name], output)?;
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    /// Return the upstream of `branch` (e.g. `origin/main`), if one is set.
    #[instrument(skip_all, fields(branch))]
    pub fn upstream(&self, branch: &str) -> Result<Option<String>> {
        let spec = format!("{branch}@{{upstream}}");
        let args = ["rev-parse", "--abbrev-ref", spec.as_str()];
        let output = self.run(&args)?;
        if !output.status.success()
            && String::from_utf8_lossy(&output.stderr).contains("no upstream")
        {
            debug!(branch, "no upstream configured");
            return Ok(None);
        }
        let output = check(&args, output)?;
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }

    /// Describe `HEAD` relative to the most recent annotated tag.
    ///
    /// Returns `Ok(None)` when the repository has no tags to describe with.
    #[instrument(skip_all)]
    pub fn describe(&self) -> Result<Option<GitDescription>> {
        let output = self.run(&["describe"])?;
        if !output.status.success()
            && String::from_utf8_lossy(&output.stderr).contains("cannot describe anything")
        {
            debug!("no tags found");
            return Ok(None);
        }
        let output = check(&["describe"], output)?;
        let description = GitDescription::parse(&String::from_utf8_lossy(&output.stdout));
        debug!(?description, "described HEAD");
        Ok(description)
    }

    /// Get status entries (including untracked) in porcelain format.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1", "-uall"])?;
        parse_status(&out)
    }

    /// Get untracked and ignored entries, collapsing whole directories.
    pub fn status_ignored(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1", "--ignored"])?;
        parse_status(&out)
    }

    /// Ensure the worktree is fully clean (including untracked files).
    #[instrument(skip_all)]
    pub fn ensure_clean(&self) -> Result<()> {
        let entries = self.status_porcelain()?;
        if entries.is_empty() {
            debug!("worktree is clean");
            return Ok(());
        }
        warn!(dirty_count = entries.len(), "worktree not clean");
        let mut msg = String::new();
        msg.push_str("working tree not clean (revert or commit pending changes):\n");
        for entry in entries {
            msg.push_str(&format!("{} {}\n", entry.code, entry.path));
        }
        Err(anyhow!(msg.trim_end().to_string()))
    }

    /// True if `path` is tracked in the index.
    pub fn is_tracked(&self, path: &Path) -> Result<bool> {
        let rel = self.relative(path);
        let out = self.run_capture_os(&[
            OsStr::new("ls-files"),
            OsStr::new("--"),
            rel.as_os_str(),
        ])?;
        Ok(!out.trim().is_empty())
    }

    /// Stage a single path.
    pub fn add(&self, path: &Path) -> Result<()> {
        let rel = self.relative(path);
        self.run_checked_os(&[OsStr::new("add"), OsStr::new("--"), rel.as_os_str()])?;
        Ok(())
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run(&["diff", "--cached", "--name-only"])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    /// Commit staged changes with a message.
    ///
    /// If there are no staged changes, this returns Ok(false) and does nothing.
    #[instrument(skip_all)]
    pub fn commit_staged(&self, message: &str) -> Result<bool> {
        if !self.has_staged_changes()? {
            debug!("no staged changes, skipping commit");
            return Ok(false);
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "-m", message])?;
        Ok(true)
    }

    /// Reset the index and tracked files to `HEAD`.
    ///
    /// Untracked files are kept.
    #[instrument(skip_all)]
    pub fn discard_changes(&self) -> Result<()> {
        warn!("discarding uncommitted changes");
        self.run_checked(&["reset", "--hard", "--quiet", "HEAD"])?;
        Ok(())
    }

    /// Check whether a tag exists.
    pub fn tag_exists(&self, tag: &str) -> Result<bool> {
        let status = self
            .run(&[
                "show-ref",
                "--verify",
                "--quiet",
                &format!("refs/tags/{tag}"),
            ])?
            .status;
        Ok(status.success())
    }

    /// Create an annotated tag at `HEAD` whose message is the tag name.
    #[instrument(skip_all, fields(tag))]
    pub fn create_annotated_tag(&self, tag: &str) -> Result<()> {
        debug!(tag, "creating annotated tag");
        self.run_checked(&["tag", "--annotate", tag, "--message", tag])?;
        Ok(())
    }

    /// Push the current branch along with reachable annotated tags.
    #[instrument(skip_all)]
    pub fn push_follow_tags(&self) -> Result<()> {
        debug!("pushing commits and tags");
        self.run_checked(&["push", "--follow-tags"])?;
        Ok(())
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.workdir).unwrap_or(path)
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_capture_os(&self, args: &[&OsStr]) -> Result<String> {
        let output = self.run_checked_os(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        check(args, output)
    }

    fn run_checked_os(&self, args: &[&OsStr]) -> Result<Output> {
        let output = self.run_os(args)?;
        let display: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        check(display.as_slice(), output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
        self.run_os(&args)
    }

    fn run_os(&self, args: &[&OsStr]) -> Result<Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", join_args(args)))?;
        trace!(
            args = %join_args(args),
            exit_code = ?output.status.code(),
            "git finished"
        );
        Ok(output)
    }
}

/// Find the nearest ancestor of `start` (inclusive) that contains `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn check<S: AsRef<str>>(args: &[S], output: Output) -> Result<Output> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
    }
    Ok(output)
}

fn join_args(args: &[&OsStr]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_status(out: &str) -> Result<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    for line in out.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_status_line(line)?);
    }
    Ok(entries)
}

fn parse_status_line(line: &str) -> Result<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Ok(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    if line.len() < 4 {
        return Err(anyhow!("unexpected porcelain line: '{line}'"));
    }
    let code = line[..2].to_string();
    let mut path = line[3..].trim().to_string();
    // Renames and copies are reported as `old -> new`.
    if code.starts_with(['R', 'C'])
        && let Some((_, new)) = path.split_once(" -> ")
    {
        path = new.trim().to_string();
    }
    Ok(StatusEntry { code, path })
}
