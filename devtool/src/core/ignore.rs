//! Compute `.gitignore` content from untracked and ignored status entries.

const UNTRACKED_CODE: &str = "??";
const IGNORED_CODE: &str = "!!";

/// Paths to list in a generated `.gitignore`, split by kind and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreEntries {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl IgnoreEntries {
    /// Build entries from `(code, path)` status pairs.
    ///
    /// Only untracked (`??`) and ignored (`!!`) entries are considered. Paths
    /// ending in `/` are directories; anything strictly inside a listed
    /// directory is dropped.
    pub fn collect<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut all_dirs = Vec::new();
        let mut all_files = Vec::new();
        for (code, path) in entries {
            if code != UNTRACKED_CODE && code != IGNORED_CODE {
                continue;
            }
            if path.ends_with('/') {
                all_dirs.push(path.to_string());
            } else {
                all_files.push(path.to_string());
            }
        }
        all_dirs.sort();
        all_dirs.dedup();
        all_files.sort();
        all_files.dedup();

        let dirs = all_dirs
            .iter()
            .filter(|p| !is_covered_by_dir(&all_dirs, p))
            .cloned()
            .collect();
        let files = all_files
            .into_iter()
            .filter(|p| !is_covered_by_dir(&all_dirs, p))
            .collect();
        Self { dirs, files }
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Render as `.gitignore` text anchored at the repository root.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.dirs.is_empty() {
            out.push_str("# Directories\n");
            for dir in &self.dirs {
                out.push_str(&format!("/{dir}\n"));
            }
        }
        if !self.files.is_empty() {
            out.push_str("# Files\n");
            for file in &self.files {
                out.push_str(&format!("/{file}\n"));
            }
        }
        out
    }
}

fn is_covered_by_dir(dirs: &[String], path: &str) -> bool {
    dirs.iter()
        .any(|dir| path != dir && path.starts_with(dir.as_str()))
}
