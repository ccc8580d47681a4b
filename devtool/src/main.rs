//! Release helper CLI.
//!
//! Bumps versions from the latest Git tag, tags and pushes releases, and
//! generates `.gitignore` entries, `.devtool.toml` and the CI workflow.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use devtool::bump::{BumpOptions, BumpOutcome, Release, run_bump};
use devtool::core::version::Version;
use devtool::describe::describe_repo;
use devtool::exit_codes;
use devtool::gen_config::generate_config;
use devtool::gen_ignore::generate_ignore;
use devtool::gen_workflow::{generate_workflow, render_configured_workflow};
use devtool::io::git::find_repo_root;
use devtool::logging;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "devtool",
    version,
    about = "Release helper: bump versions, tag and push, generate ignore and CI files",
    after_help = env!("CARGO_PKG_HOMEPAGE")
)]
struct Cli {
    /// Path to the Git repository (defaults to the enclosing repository).
    #[arg(global = true, short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(global = true, short = 'l', long = "log-level", default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update Cargo.toml/pyproject.toml versions, create a release tag and push.
    BumpVersion {
        /// Version to release (defaults to the latest tag incremented).
        version: Option<Version>,

        /// Do not push commits and tags.
        #[arg(long)]
        no_push: bool,

        /// Check preconditions and print the plan without changing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show Git description and the next release version.
    ShowDescription {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print .gitignore entries for untracked and ignored files.
    GenIgnore,
    /// Generate the .devtool.toml configuration file.
    GenConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Generate the CI workflow (.github/workflows/ci.yaml).
    GenWorkflow {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,

        /// Print the workflow instead of writing it.
        #[arg(long, conflicts_with = "force")]
        stdout: bool,
    },
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::FAILED
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let root = resolve_root(cli.dir.as_deref())?;
    match cli.command {
        Command::BumpVersion {
            version,
            no_push,
            dry_run,
        } => {
            let options = BumpOptions {
                version,
                push: !no_push,
                dry_run,
            };
            match run_bump(&root, &options)? {
                BumpOutcome::Released(release) => {
                    print_release(&root, &release);
                    Ok(exit_codes::OK)
                }
                BumpOutcome::NoNewCommits { tag } => {
                    eprintln!("no commits since most recent tag \"{tag}\"");
                    Ok(exit_codes::NO_NEW_COMMITS)
                }
            }
        }
        Command::ShowDescription { json } => {
            let report = describe_repo(&root)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("serialize report")?
                );
            } else {
                print!("{}", report.render());
            }
            Ok(exit_codes::OK)
        }
        Command::GenIgnore => {
            print!("{}", generate_ignore(&root)?.render());
            Ok(exit_codes::OK)
        }
        Command::GenConfig { force } => {
            let path = generate_config(&root, force)?;
            println!("wrote {}", path.display());
            Ok(exit_codes::OK)
        }
        Command::GenWorkflow { force, stdout } => {
            if stdout {
                print!("{}", render_configured_workflow(&root)?);
            } else {
                let path = generate_workflow(&root, force)?;
                println!("wrote {}", path.display());
            }
            Ok(exit_codes::OK)
        }
    }
}

/// Repository root from `--dir`, or the nearest enclosing Git repository.
fn resolve_root(dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return std::path::absolute(dir).with_context(|| format!("resolve {}", dir.display()));
    }
    let cwd = env::current_dir().context("read current directory")?;
    find_repo_root(&cwd).ok_or_else(|| anyhow!("cannot infer Git project directory"))
}

fn print_release(root: &Path, release: &Release) {
    let display = |path: &PathBuf| path.strip_prefix(root).unwrap_or(path).display().to_string();
    if release.dry_run {
        println!("version: {} (dry run)", release.version);
        for path in &release.manifests {
            println!("manifest: {}", display(path));
        }
        return;
    }
    for path in &release.manifests {
        println!("updated {}", display(path));
    }
    if release.lock_refreshed {
        println!("refreshed Cargo.lock");
    }
    if release.committed {
        println!(
            "committed version {}",
            release.version.with_prefix(false)
        );
    }
    println!("created tag {}", release.tag);
    if release.pushed {
        println!("pushed commits and tags");
    } else {
        println!("skipped push of commits and tags");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bump_defaults() {
        let cli = Cli::parse_from(["devtool", "bump-version"]);
        assert!(matches!(
            cli.command,
            Command::BumpVersion {
                version: None,
                no_push: false,
                dry_run: false
            }
        ));
        assert_eq!(cli.log_level, LevelFilter::WARN);
    }

    #[test]
    fn parse_bump_with_version() {
        let cli = Cli::parse_from(["devtool", "bump-version", "v1.2.3", "--no-push"]);
        match cli.command {
            Command::BumpVersion {
                version, no_push, ..
            } => {
                assert_eq!(version.map(|v| v.to_string()).as_deref(), Some("v1.2.3"));
                assert!(no_push);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_bad_version() {
        assert!(Cli::try_parse_from(["devtool", "bump-version", "1.2.3.4"]).is_err());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["devtool", "gen-ignore", "--dir", "/tmp/repo", "-l", "debug"]);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/repo")));
        assert_eq!(cli.log_level, LevelFilter::DEBUG);
        assert!(matches!(cli.command, Command::GenIgnore));
    }

    #[test]
    fn parse_gen_workflow_stdout_conflicts_with_force() {
        assert!(Cli::try_parse_from(["devtool", "gen-workflow", "--stdout", "--force"]).is_err());
        let cli = Cli::parse_from(["devtool", "gen-workflow", "--stdout"]);
        assert!(matches!(
            cli.command,
            Command::GenWorkflow {
                force: false,
                stdout: true
            }
        ));
    }
}
