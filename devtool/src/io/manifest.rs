//! Package manifests whose version follows the release tag.
//!
//! Edits go through `toml_edit` so comments, ordering and formatting of the
//! manifests survive a version bump.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use toml_edit::{DocumentMut, Item, Table, Value};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::config::DevtoolConfig;
use super::files::write_atomic;

pub const CARGO_TOML: &str = "Cargo.toml";
pub const PYPROJECT_TOML: &str = "pyproject.toml";

const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Manifest files of a repository, as absolute sorted paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifests {
    pub cargo_toml_paths: Vec<PathBuf>,
    pub pyproject_toml_paths: Vec<PathBuf>,
}

impl Manifests {
    /// Walk `root` for `Cargo.toml` and `pyproject.toml` files.
    ///
    /// Hidden directories, `target` and `node_modules` are skipped.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut manifests = Self::default();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
        for entry in walker {
            let entry = entry.with_context(|| format!("walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name();
            if name == CARGO_TOML {
                manifests.cargo_toml_paths.push(entry.into_path());
            } else if name == PYPROJECT_TOML {
                manifests.pyproject_toml_paths.push(entry.into_path());
            }
        }
        manifests.cargo_toml_paths.sort();
        manifests.pyproject_toml_paths.sort();
        debug!(
            cargo = manifests.cargo_toml_paths.len(),
            pyproject = manifests.pyproject_toml_paths.len(),
            "discovered manifests"
        );
        Ok(manifests)
    }

    /// Manifests listed in the config, discovering any kind it leaves unset.
    pub fn resolve(root: &Path, cfg: &DevtoolConfig) -> Result<Self> {
        if let (Some(cargo), Some(pyproject)) = (&cfg.cargo_toml_paths, &cfg.pyproject_toml_paths) {
            return Ok(Self {
                cargo_toml_paths: absolutize_all(root, cargo),
                pyproject_toml_paths: absolutize_all(root, pyproject),
            });
        }
        let discovered = Self::discover(root)?;
        Ok(Self {
            cargo_toml_paths: match &cfg.cargo_toml_paths {
                Some(paths) => absolutize_all(root, paths),
                None => discovered.cargo_toml_paths,
            },
            pyproject_toml_paths: match &cfg.pyproject_toml_paths {
                Some(paths) => absolutize_all(root, paths),
                None => discovered.pyproject_toml_paths,
            },
        })
    }

    /// Same manifests with paths relative to `root` (for writing config).
    pub fn relative_to(&self, root: &Path) -> Self {
        let rel = |paths: &[PathBuf]| -> Vec<PathBuf> {
            paths
                .iter()
                .map(|p| p.strip_prefix(root).unwrap_or(p).to_path_buf())
                .collect()
        };
        Self {
            cargo_toml_paths: rel(&self.cargo_toml_paths),
            pyproject_toml_paths: rel(&self.pyproject_toml_paths),
        }
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn absolutize_all(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|p| root.join(p)).collect()
}

/// Set the package version in `Cargo.toml` contents.
///
/// Updates `[package].version` (inserting it when missing) and a literal
/// `[workspace.package].version`. Inherited versions
/// (`version.workspace = true`) are left alone. Returns `None` when nothing
/// changed.
pub fn update_cargo_manifest(contents: &str, version: &str) -> Result<Option<String>> {
    let mut doc: DocumentMut = contents.parse().context("parse Cargo.toml")?;

    if let Some(package) = doc.get_mut("package").and_then(Item::as_table_mut) {
        if package.contains_key("version") {
            set_literal_version(package, version);
        } else {
            package.insert("version", toml_edit::value(version));
        }
    }

    if let Some(package) = doc
        .get_mut("workspace")
        .and_then(Item::as_table_mut)
        .and_then(|ws| ws.get_mut("package"))
        .and_then(Item::as_table_mut)
    {
        set_literal_version(package, version);
    }

    let updated = doc.to_string();
    Ok((updated != contents).then_some(updated))
}

/// Set the project version in `pyproject.toml` contents.
///
/// Updates `[project].version`, falling back to `[tool.poetry].version`.
/// Projects with a dynamic version have neither and are left alone.
pub fn update_pyproject_manifest(contents: &str, version: &str) -> Result<Option<String>> {
    let mut doc: DocumentMut = contents.parse().context("parse pyproject.toml")?;

    let mut applied = false;
    if let Some(project) = doc.get_mut("project").and_then(Item::as_table_mut) {
        applied = set_literal_version(project, version);
    }
    if !applied
        && let Some(poetry) = doc
            .get_mut("tool")
            .and_then(Item::as_table_mut)
            .and_then(|tool| tool.get_mut("poetry"))
            .and_then(Item::as_table_mut)
    {
        set_literal_version(poetry, version);
    }

    let updated = doc.to_string();
    Ok((updated != contents).then_some(updated))
}

/// Replace a string `version` value in place, keeping its decoration.
fn set_literal_version(table: &mut Table, version: &str) -> bool {
    let Some(value) = table.get_mut("version").and_then(Item::as_value_mut) else {
        return false;
    };
    if !value.is_str() {
        return false;
    }
    let decor = value.decor().clone();
    *value = Value::from(version);
    *value.decor_mut() = decor;
    true
}

/// Rewrite the manifest at `path`; returns whether the file changed.
pub fn write_cargo_version(path: &Path, version: &str) -> Result<bool> {
    rewrite(path, |contents| update_cargo_manifest(contents, version))
}

/// Rewrite the manifest at `path`; returns whether the file changed.
pub fn write_pyproject_version(path: &Path, version: &str) -> Result<bool> {
    rewrite(path, |contents| update_pyproject_manifest(contents, version))
}

fn rewrite<F>(path: &Path, update: F) -> Result<bool>
where
    F: FnOnce(&str) -> Result<Option<String>>,
{
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    match update(&contents).with_context(|| format!("update {}", path.display()))? {
        Some(updated) => {
            write_atomic(path, &updated)?;
            debug!(path = %path.display(), "manifest version updated");
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cargo_version_update_preserves_formatting() {
        let input = "[package]\nname = \"demo\"\nversion = \"0.1.0\" # bumped by devtool\nedition = \"2024\"\n\n[dependencies]\nanyhow = \"1\"\n";
        let out = update_cargo_manifest(input, "0.2.0")
            .expect("update")
            .expect("changed");
        assert_eq!(
            out,
            "[package]\nname = \"demo\"\nversion = \"0.2.0\" # bumped by devtool\nedition = \"2024\"\n\n[dependencies]\nanyhow = \"1\"\n"
        );
    }

    #[test]
    fn cargo_inserts_missing_package_version() {
        let out = update_cargo_manifest("[package]\nname = \"demo\"\n", "1.0.0")
            .expect("update")
            .expect("changed");
        let doc: DocumentMut = out.parse().expect("parse");
        assert_eq!(doc["package"]["version"].as_str(), Some("1.0.0"));
    }

    #[test]
    fn cargo_inherited_version_is_left_alone() {
        let input = "[package]\nname = \"member\"\nversion.workspace = true\n";
        assert_eq!(update_cargo_manifest(input, "1.0.0").expect("update"), None);
    }

    #[test]
    fn cargo_workspace_package_version_is_updated() {
        let input = "[workspace]\nmembers = [\"a\"]\n\n[workspace.package]\nversion = \"0.3.1\"\n";
        let out = update_cargo_manifest(input, "0.3.2")
            .expect("update")
            .expect("changed");
        assert!(out.contains("version = \"0.3.2\""));
        assert!(out.contains("members = [\"a\"]"));
    }

    #[test]
    fn cargo_virtual_manifest_without_version_is_unchanged() {
        let input = "[workspace]\nmembers = [\"a\"]\n";
        assert_eq!(update_cargo_manifest(input, "1.0.0").expect("update"), None);
    }

    #[test]
    fn cargo_same_version_reports_no_change() {
        let input = "[package]\nname = \"demo\"\nversion = \"1.0.0\"\n";
        assert_eq!(update_cargo_manifest(input, "1.0.0").expect("update"), None);
    }

    #[test]
    fn pyproject_prefers_project_table() {
        let input = "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[tool.poetry]\nversion = \"0.1.0\"\n";
        let out = update_pyproject_manifest(input, "0.1.1")
            .expect("update")
            .expect("changed");
        assert_eq!(
            out,
            "[project]\nname = \"demo\"\nversion = \"0.1.1\"\n\n[tool.poetry]\nversion = \"0.1.0\"\n"
        );
    }

    #[test]
    fn pyproject_falls_back_to_poetry() {
        let input = "[tool.poetry]\nname = \"demo\"\nversion = \"2.0\"\n";
        let out = update_pyproject_manifest(input, "2.1")
            .expect("update")
            .expect("changed");
        assert!(out.contains("version = \"2.1\""));
    }

    #[test]
    fn pyproject_dynamic_version_is_unchanged() {
        let input = "[project]\nname = \"demo\"\ndynamic = [\"version\"]\n";
        assert_eq!(update_pyproject_manifest(input, "1.0").expect("update"), None);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(update_cargo_manifest("[package\n", "1.0.0").is_err());
    }

    #[test]
    fn discover_skips_build_and_hidden_dirs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        for rel in [
            "Cargo.toml",
            "crates/a/Cargo.toml",
            "crates/a/target/package/Cargo.toml",
            ".git/Cargo.toml",
            "python/pyproject.toml",
            "node_modules/x/pyproject.toml",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, "").expect("write");
        }

        let manifests = Manifests::discover(root).expect("discover");
        assert_eq!(
            manifests.relative_to(root),
            Manifests {
                cargo_toml_paths: vec![
                    PathBuf::from("Cargo.toml"),
                    PathBuf::from("crates/a/Cargo.toml"),
                ],
                pyproject_toml_paths: vec![PathBuf::from("python/pyproject.toml")],
            }
        );
    }

    #[test]
    fn resolve_uses_configured_paths() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("Cargo.toml"), "").expect("write");
        let cfg = DevtoolConfig {
            cargo_toml_paths: Some(vec![PathBuf::from("only/Cargo.toml")]),
            ..DevtoolConfig::default()
        };

        let manifests = Manifests::resolve(root, &cfg).expect("resolve");
        assert_eq!(manifests.cargo_toml_paths, vec![root.join("only/Cargo.toml")]);
        assert!(manifests.pyproject_toml_paths.is_empty());
    }
}
