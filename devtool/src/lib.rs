//! Release helper for Git repositories.
//!
//! `devtool` bumps package versions from the most recent tag, creates and
//! pushes annotated release tags, and generates `.gitignore` entries, its own
//! configuration and a CI workflow. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (versions, describe parsing,
//!   ignore entries, workflow model). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (git, filesystem, child processes,
//!   templates).
//!
//! Command modules ([`bump`], [`describe`], [`gen_config`], [`gen_ignore`],
//! [`gen_workflow`]) coordinate core logic with I/O to implement the CLI.

pub mod bump;
pub mod core;
pub mod describe;
pub mod exit_codes;
pub mod gen_config;
pub mod gen_ignore;
pub mod gen_workflow;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
