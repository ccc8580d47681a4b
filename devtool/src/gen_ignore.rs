//! `devtool gen-ignore`: suggest `.gitignore` entries for untracked and ignored files.

use std::path::Path;

use anyhow::Result;

use crate::core::ignore::IgnoreEntries;
use crate::io::git::Git;

pub fn generate_ignore(root: &Path) -> Result<IgnoreEntries> {
    let entries = Git::new(root).status_ignored()?;
    Ok(IgnoreEntries::collect(
        entries.iter().map(|e| (e.code.as_str(), e.path.as_str())),
    ))
}
