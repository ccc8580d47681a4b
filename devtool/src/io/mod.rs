//! I/O helpers for devtool commands.

pub mod config;
pub mod files;
pub mod git;
pub mod manifest;
pub mod process;
pub mod workflow;
