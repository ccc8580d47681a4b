//! Render the CI workflow file from its model.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use minijinja::{Environment, context};

use crate::core::workflow::{Workflow, validate_workflow};

const WORKFLOW_TEMPLATE: &str = include_str!("templates/ci.yaml.j2");

/// Location of the workflow file relative to the repository root.
pub const WORKFLOW_PATH: &str = ".github/workflows/ci.yaml";

pub fn workflow_path(root: &Path) -> PathBuf {
    root.join(WORKFLOW_PATH)
}

/// Render `workflow` as GitHub Actions YAML. Invalid models are rejected.
pub fn render_workflow(workflow: &Workflow) -> Result<String> {
    let errors = validate_workflow(workflow);
    if !errors.is_empty() {
        bail!("invalid workflow:\n- {}", errors.join("\n- "));
    }

    let mut env = Environment::new();
    env.add_template("workflow", WORKFLOW_TEMPLATE)
        .context("load workflow template")?;
    let template = env.get_template("workflow")?;
    let mut rendered = template
        .render(context! {
            name => &workflow.name,
            triggers => workflow.triggers(),
            action => &workflow.action,
            targets => &workflow.targets,
        })
        .context("render workflow template")?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workflow::BuildTarget;

    #[test]
    fn renders_matrix_and_expressions() {
        let rendered = render_workflow(&Workflow::default()).expect("render");
        assert!(rendered.starts_with("name: CI\n"));
        assert!(rendered.contains("    - cron: \"0 5 * * *\"\n"));
        assert!(rendered.contains(
            "        include:\n          - target: x86_64-apple-darwin\n            os: macos-13\n          - target: x86_64-pc-windows-msvc\n"
        ));
        assert!(rendered.contains("            os: ubuntu-latest\n    runs-on: ${{ matrix.os }}\n"));
        assert!(rendered.contains("      - uses: rcook/rust-package-action@v0.0.5\n"));
        assert!(rendered.ends_with("          target: ${{ matrix.target }}\n"));
    }

    #[test]
    fn renders_custom_targets_in_order() {
        let workflow = Workflow {
            branch: "trunk".to_string(),
            targets: vec![
                BuildTarget::new("aarch64-unknown-linux-gnu", "ubuntu-24.04-arm"),
                BuildTarget::new("aarch64-apple-darwin", "macos-14"),
            ],
            ..Workflow::default()
        };
        let rendered = render_workflow(&workflow).expect("render");
        assert_eq!(rendered.matches("      - trunk\n").count(), 2);
        let first = rendered.find("aarch64-unknown-linux-gnu").expect("first");
        let second = rendered.find("aarch64-apple-darwin").expect("second");
        assert!(first < second);
        assert_eq!(rendered.matches("- target: ").count(), 2);
    }

    #[test]
    fn rendered_values_parse_back_as_strings() {
        use serde_yaml_ng::Value;

        let workflow = Workflow {
            name: "Release 1.10".to_string(),
            branch: "release-1.10".to_string(),
            targets: vec![BuildTarget::new("wasm32-unknown-unknown", "ubuntu-24.04")],
            ..Workflow::default()
        };
        let rendered = render_workflow(&workflow).expect("render");
        let doc: Value = serde_yaml_ng::from_str(&rendered).expect("parse");

        assert_eq!(doc["name"], Value::from("Release 1.10"));
        for event in ["push", "pull_request"] {
            assert_eq!(
                doc["on"][event]["branches"][0],
                Value::from("release-1.10"),
                "{event}"
            );
        }
        let include = &doc["jobs"]["build"]["strategy"]["matrix"]["include"][0];
        assert_eq!(include["target"], Value::from("wasm32-unknown-unknown"));
        assert_eq!(include["os"], Value::from("ubuntu-24.04"));
    }

    #[test]
    fn yaml_typed_branch_is_not_rendered() {
        for branch in ["1.10", "true", "null"] {
            let workflow = Workflow {
                branch: branch.to_string(),
                ..Workflow::default()
            };
            let err = render_workflow(&workflow).unwrap_err();
            assert!(err.to_string().contains("invalid branch"), "{branch}: {err:#}");
        }
    }

    #[test]
    fn invalid_workflow_is_not_rendered() {
        let workflow = Workflow {
            cron: "@daily".to_string(),
            ..Workflow::default()
        };
        let err = render_workflow(&workflow).unwrap_err();
        assert!(err.to_string().contains("invalid cron"));
    }
}
