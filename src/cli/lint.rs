use anyhow::{bail, Result};

use super::App;
use crate::lint::{LintIssue, PromptLinter, Severity};

/// Lint a prompt item, reporting issues at `min_severity` or above.
/// Errors fail the run whatever the threshold.
pub fn run(app: &App, id: &str, min_severity: &str) -> Result<Vec<LintIssue>> {
    let Ok(threshold) = min_severity.parse::<Severity>() else {
        bail!(
            "Unknown severity: {} (expected error, warning or info)",
            min_severity
        );
    };
    let item = app.require_item(id)?;
    let Some(prompt) = item.as_prompt() else {
        bail!("Only prompt items can be linted ({} is a {})", id, item.item_type());
    };

    let linter = PromptLinter::new();
    let all = linter.lint(&prompt.prompt_spec);
    let errors = all
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let issues: Vec<LintIssue> = all
        .into_iter()
        .filter(|i| i.severity.at_least(threshold))
        .collect();

    linter.print_issues(&issues);

    if errors > 0 {
        bail!("{} lint error(s) found", errors);
    }

    Ok(issues)
}
