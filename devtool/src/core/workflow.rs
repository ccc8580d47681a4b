//! CI workflow model: triggers plus a build matrix delegating to one action.
//!
//! The workflow is declarative. Each matrix entry becomes an independent job
//! on its own runner; the only input passed to the action is the target
//! triple.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "CI";
pub const DEFAULT_BRANCH: &str = "main";
/// Daily at 05:00 UTC.
pub const DEFAULT_CRON: &str = "0 5 * * *";
pub const DEFAULT_ACTION: &str = "rcook/rust-package-action@v0.0.5";

/// One matrix entry: a target triple and the runner image that builds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildTarget {
    pub target: String,
    pub os: String,
}

impl BuildTarget {
    pub fn new(target: &str, os: &str) -> Self {
        Self {
            target: target.to_string(),
            os: os.to_string(),
        }
    }
}

/// Events that start the workflow, serialized with an `event` tag naming the
/// GitHub Actions key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Trigger {
    Push { branch: String },
    PullRequest { branch: String },
    Schedule { cron: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Workflow {
    /// Workflow display name.
    pub name: String,
    /// Branch watched by the push and pull-request triggers.
    pub branch: String,
    /// Five-field cron expression for the scheduled trigger (UTC).
    pub cron: String,
    /// External action invoked by every job, as `owner/repo@ref`.
    pub action: String,
    /// Build matrix in declaration order.
    pub targets: Vec<BuildTarget>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            cron: DEFAULT_CRON.to_string(),
            action: DEFAULT_ACTION.to_string(),
            targets: vec![
                BuildTarget::new("x86_64-apple-darwin", "macos-13"),
                BuildTarget::new("x86_64-pc-windows-msvc", "windows-latest"),
                BuildTarget::new("x86_64-unknown-linux-gnu", "ubuntu-latest"),
            ],
        }
    }
}

impl Workflow {
    pub fn triggers(&self) -> Vec<Trigger> {
        vec![
            Trigger::Push {
                branch: self.branch.clone(),
            },
            Trigger::PullRequest {
                branch: self.branch.clone(),
            },
            Trigger::Schedule {
                cron: self.cron.clone(),
            },
        ]
    }
}

static SCALAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/+-]*$").unwrap());
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]*$").unwrap());
static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_./-]+@[A-Za-z0-9_./-]+$").unwrap()
});
/// Plain scalars YAML resolves to something other than a string: null,
/// booleans (YAML 1.1 spellings included), numbers and dates.
static YAML_TYPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^(?:
            ~ | (?i:null|true|false|yes|no|on|off|y|n)
            | [-+]?(?:[0-9][0-9_]*(?:\.[0-9_]*)?|\.[0-9_]+)(?:[eE][-+]?[0-9]+)?
            | [-+]?\.(?i:inf) | \.(?i:nan)
            | 0x[0-9a-fA-F_]+ | 0o[0-7_]+ | 0b[01_]+
            | [0-9]{4}-[0-9]{1,2}-[0-9]{1,2}
        )$",
    )
    .unwrap()
});
static CRON_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9*/,-]+$").unwrap());

/// True when `value` is safe to render as an unquoted YAML string.
fn is_plain_string(re: &Regex, value: &str) -> bool {
    re.is_match(value) && !YAML_TYPED_RE.is_match(value)
}

/// Validate workflow values, returning human-readable violations.
///
/// Values are rendered into YAML unquoted, so anything that could change the
/// document structure, or would be read back as a number, boolean, null or
/// date, is rejected here.
pub fn validate_workflow(workflow: &Workflow) -> Vec<String> {
    let mut errors = Vec::new();

    if !is_plain_string(&NAME_RE, &workflow.name) {
        errors.push(format!("invalid workflow name '{}'", workflow.name));
    }
    if !is_plain_string(&SCALAR_RE, &workflow.branch) {
        errors.push(format!("invalid branch '{}'", workflow.branch));
    }
    if !ACTION_RE.is_match(&workflow.action) {
        errors.push(format!(
            "invalid action '{}': expected owner/repo@ref",
            workflow.action
        ));
    }

    let fields: Vec<&str> = workflow.cron.split_whitespace().collect();
    if fields.len() != 5 || !fields.iter().all(|f| CRON_FIELD_RE.is_match(f)) {
        errors.push(format!(
            "invalid cron '{}': expected five fields",
            workflow.cron
        ));
    }

    if workflow.targets.is_empty() {
        errors.push("build matrix must contain at least one target".to_string());
    }
    let mut seen = HashSet::new();
    for entry in &workflow.targets {
        if !is_plain_string(&SCALAR_RE, &entry.target) {
            errors.push(format!("invalid target triple '{}'", entry.target));
        }
        if !is_plain_string(&SCALAR_RE, &entry.os) {
            errors.push(format!(
                "invalid runner '{}' for target '{}'",
                entry.os, entry.target
            ));
        }
        if !seen.insert(entry.target.as_str()) {
            errors.push(format!("duplicate target '{}'", entry.target));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_workflow_is_valid() {
        assert_eq!(validate_workflow(&Workflow::default()), Vec::<String>::new());
    }

    #[test]
    fn default_matrix_pairs_targets_with_hosts() {
        let workflow = Workflow::default();
        let pairs: Vec<(&str, &str)> = workflow
            .targets
            .iter()
            .map(|t| (t.target.as_str(), t.os.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("x86_64-apple-darwin", "macos-13"),
                ("x86_64-pc-windows-msvc", "windows-latest"),
                ("x86_64-unknown-linux-gnu", "ubuntu-latest"),
            ]
        );
    }

    #[test]
    fn triggers_cover_push_pull_request_and_schedule() {
        let triggers = Workflow::default().triggers();
        assert_eq!(
            triggers,
            vec![
                Trigger::Push {
                    branch: "main".to_string()
                },
                Trigger::PullRequest {
                    branch: "main".to_string()
                },
                Trigger::Schedule {
                    cron: "0 5 * * *".to_string()
                },
            ]
        );
    }

    #[test]
    fn reports_each_violation() {
        let mut workflow = Workflow::default();
        workflow.cron = "0 5 * *".to_string();
        workflow.action = "rust-package-action".to_string();
        workflow.branch = "main: evil".to_string();
        workflow
            .targets
            .push(BuildTarget::new("x86_64-apple-darwin", "macos-14"));

        let errors = validate_workflow(&workflow);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("invalid cron")));
        assert!(errors.iter().any(|e| e.contains("invalid action")));
        assert!(errors.iter().any(|e| e.contains("invalid branch")));
        assert!(errors.iter().any(|e| e.contains("duplicate target")));
    }

    #[test]
    fn yaml_typed_scalars_are_rejected() {
        for value in [
            "1.10", "10", "true", "False", "yes", "ON", "null", "~", "0x1F", "1e3", ".inf",
            "2024-01-31",
        ] {
            let workflow = Workflow {
                branch: value.to_string(),
                targets: vec![BuildTarget::new(value, "ubuntu-latest")],
                ..Workflow::default()
            };
            let errors = validate_workflow(&workflow);
            assert_eq!(errors.len(), 2, "{value}: {errors:?}");
        }

        let workflow = Workflow {
            name: "Yes".to_string(),
            targets: vec![BuildTarget::new("x86_64-unknown-linux-gnu", "null")],
            ..Workflow::default()
        };
        let errors = validate_workflow(&workflow);
        assert!(errors.iter().any(|e| e.contains("invalid workflow name")));
        assert!(errors.iter().any(|e| e.contains("invalid runner 'null'")));
    }

    #[test]
    fn version_like_branch_names_remain_valid() {
        for branch in ["release-1.10", "v1.10", "1.x", "main", "no-ci", "y2k"] {
            let workflow = Workflow {
                branch: branch.to_string(),
                ..Workflow::default()
            };
            assert_eq!(validate_workflow(&workflow), Vec::<String>::new(), "{branch}");
        }
    }

    #[test]
    fn triggers_serialize_with_event_key() {
        let value = serde_json::to_value(Workflow::default().triggers()).expect("json");
        assert_eq!(value[0]["event"], "push");
        assert_eq!(value[1]["event"], "pull_request");
        assert_eq!(value[1]["branch"], "main");
        assert_eq!(value[2]["event"], "schedule");
        assert_eq!(value[2]["cron"], "0 5 * * *");
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let workflow = Workflow {
            targets: Vec::new(),
            ..Workflow::default()
        };
        let errors = validate_workflow(&workflow);
        assert_eq!(errors, vec!["build matrix must contain at least one target"]);
    }
}
