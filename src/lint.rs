use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::schema::prompt::TaskType;
use crate::schema::PromptSpec;

/// Total input size, in characters, above which a prompt is flagged as heavy.
pub const INPUT_SIZE_WARNING_THRESHOLD: usize = 12_000;

const VAGUE_PHRASES: &[&str] = &[
    "fix it",
    "make it better",
    "improve this",
    "clean this up",
    "optimize this",
    "help me",
];

const CONFLICTING_CONSTRAINT_PAIRS: &[(&str, &str)] = &[
    ("no new dependencies", "add dependency"),
    ("no schema changes", "update database schema"),
    ("no api changes", "change api"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintIssue {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl LintIssue {
    fn new(id: &str, severity: Severity, message: impl Into<String>, field_path: &str) -> Self {
        Self {
            id: id.to_string(),
            severity,
            message: message.into(),
            field_path: Some(field_path.to_string()),
            suggestions: Vec::new(),
        }
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error, // Must fix
    Warning, // Should fix
    Info,    // Nice to have
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(()),
        }
    }
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Error => 2,
            Severity::Warning => 1,
            Severity::Info => 0,
        }
    }

    /// True when `self` is as severe as `threshold` or more.
    pub fn at_least(self, threshold: Severity) -> bool {
        self.rank() >= threshold.rank()
    }
}

pub fn has_errors(issues: &[LintIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

#[derive(Debug, Default)]
pub struct PromptLinter;

impl PromptLinter {
    pub fn new() -> Self {
        Self
    }

    /// Lint a prompt spec. Errors first, then warnings and info, in a stable order.
    pub fn lint(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        issues.extend(self.check_required(spec));
        issues.extend(self.check_vagueness(spec));
        issues.extend(self.check_context(spec));
        issues.extend(self.check_input_size(spec));
        issues.extend(self.check_constraints(spec));
        issues.extend(self.check_examples(spec));

        issues
    }

    fn check_required(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        if spec.goal.trim().is_empty() {
            issues.push(
                LintIssue::new("missing-goal", Severity::Error, "Goal is required.", "goal")
                    .suggest("Describe the desired outcome in one sentence."),
            );
        }

        if spec.task_type.is_none() {
            issues.push(
                LintIssue::new(
                    "missing-task-type",
                    Severity::Error,
                    "Task type is required.",
                    "taskType",
                )
                .suggest("Select implement, debug, refactor, tests, architecture, or docs."),
            );
        }

        if spec.output_contract.is_none() {
            issues.push(
                LintIssue::new(
                    "missing-output-contract",
                    Severity::Error,
                    "Output contract is required.",
                    "outputContract",
                )
                .suggest("Choose output mode and list output requirements."),
            );
        }

        issues
    }

    fn check_vagueness(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        let goal = spec.goal.to_lowercase();
        let vague = VAGUE_PHRASES.iter().any(|phrase| goal.contains(phrase));
        let bare_debug = spec.task_type == Some(TaskType::Debug) && spec.context_notes.is_empty();

        if !(vague || bare_debug) {
            return Vec::new();
        }
        vec![LintIssue::new(
            "vague-goal-or-task",
            Severity::Warning,
            "Goal or task details may be too vague.",
            "goal",
        )
        .suggest("Add concrete acceptance criteria, expected behavior, and affected files.")]
    }

    fn check_context(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        if !spec.stack_tags.is_empty() || !spec.context_notes.is_empty() {
            return Vec::new();
        }
        vec![LintIssue::new(
            "missing-stack-context",
            Severity::Warning,
            "Stack tags or context notes are recommended.",
            "stackTags",
        )
        .suggest("Add your framework/runtime and relevant environment constraints.")]
    }

    fn check_input_size(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        let total: usize = spec.inputs.iter().map(|i| i.content.chars().count()).sum();
        if total <= INPUT_SIZE_WARNING_THRESHOLD {
            return Vec::new();
        }
        vec![LintIssue::new(
            "inputs-too-large",
            Severity::Warning,
            format!("Inputs are large ({} chars).", total),
            "inputs",
        )
        .suggest("Trim logs/code to only relevant sections.")
        .suggest("Add a brief summary before raw data.")]
    }

    fn check_constraints(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        let lowered: Vec<String> = spec.constraints.iter().map(|c| c.to_lowercase()).collect();
        let conflicts: Vec<String> = CONFLICTING_CONSTRAINT_PAIRS
            .iter()
            .filter(|(left, right)| {
                lowered.iter().any(|c| c.contains(left)) && lowered.iter().any(|c| c.contains(right))
            })
            .map(|(left, right)| format!("Resolve conflict: {} <-> {}", left, right))
            .collect();

        if conflicts.is_empty() {
            return Vec::new();
        }
        let mut issue = LintIssue::new(
            "conflicting-constraints",
            Severity::Warning,
            "Some constraints appear to conflict.",
            "constraints",
        );
        issue.suggestions = conflicts;
        vec![issue]
    }

    // Tests and docs prompts read best with a sample of the expected output.
    fn check_examples(&self, spec: &PromptSpec) -> Vec<LintIssue> {
        let wants_examples = matches!(spec.task_type, Some(TaskType::Tests | TaskType::Docs));
        if !wants_examples || !spec.examples.is_empty() {
            return Vec::new();
        }
        vec![LintIssue::new(
            "missing-examples",
            Severity::Info,
            "Examples help match the expected output style.",
            "examples",
        )
        .suggest("Add a short sample of the test or doc format you expect.")]
    }

    /// Print issues in a human-readable format
    pub fn print_issues(&self, issues: &[LintIssue]) {
        if issues.is_empty() {
            println!("✅ No linting issues found!");
            return;
        }

        println!("\n📋 Prompt Linting Results:\n");

        let sections = [
            (Severity::Error, "❌ Errors"),
            (Severity::Warning, "⚠️  Warnings"),
            (Severity::Info, "ℹ️  Info"),
        ];
        let mut counts = [0usize; 3];

        for (slot, (severity, heading)) in sections.iter().enumerate() {
            let matching: Vec<_> = issues.iter().filter(|i| i.severity == *severity).collect();
            counts[slot] = matching.len();
            if matching.is_empty() {
                continue;
            }
            println!("{} ({}):", heading, matching.len());
            for issue in &matching {
                match &issue.field_path {
                    Some(path) => println!("   • [{}] {} ({})", issue.id, issue.message, path),
                    None => println!("   • [{}] {}", issue.id, issue.message),
                }
                for suggestion in &issue.suggestions {
                    println!("     💡 {}", suggestion);
                }
            }
            println!();
        }

        println!(
            "Summary: {} errors, {} warnings, {} info",
            counts[0], counts[1], counts[2]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prompt::{OutputContract, OutputMode, PromptInput, PromptInputType};

    fn complete() -> PromptSpec {
        let mut spec = PromptSpec::default();
        spec.goal = "Implement feature".to_string();
        spec.task_type = Some(TaskType::Implement);
        spec.output_contract = Some(OutputContract {
            mode: OutputMode::Plan,
            requirements: Vec::new(),
        });
        spec.stack_tags = vec!["rust".to_string()];
        spec
    }

    fn ids(issues: &[LintIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_missing_required_fields() {
        let issues = PromptLinter::new().lint(&PromptSpec::default());
        let ids = ids(&issues);
        assert!(ids.contains(&"missing-goal"));
        assert!(ids.contains(&"missing-task-type"));
        assert!(ids.contains(&"missing-output-contract"));
        assert!(has_errors(&issues));
    }

    #[test]
    fn test_complete_spec_is_clean() {
        let issues = PromptLinter::new().lint(&complete());
        assert!(issues.is_empty(), "unexpected: {:?}", issues);
    }

    #[test]
    fn test_conflicting_constraints() {
        let mut spec = complete();
        spec.constraints = vec![
            "No new dependencies".to_string(),
            "Add dependency uuid".to_string(),
        ];
        let issues = PromptLinter::new().lint(&spec);
        let conflict = issues
            .iter()
            .find(|i| i.id == "conflicting-constraints")
            .unwrap();
        assert_eq!(conflict.severity, Severity::Warning);
        assert_eq!(
            conflict.suggestions,
            vec!["Resolve conflict: no new dependencies <-> add dependency"]
        );
        assert!(!has_errors(&issues));
    }

    #[test]
    fn test_vague_goal_and_bare_debug() {
        let mut spec = complete();
        spec.goal = "Please fix it".to_string();
        assert_eq!(ids(&PromptLinter::new().lint(&spec)), vec!["vague-goal-or-task"]);

        let mut spec = complete();
        spec.task_type = Some(TaskType::Debug);
        assert_eq!(ids(&PromptLinter::new().lint(&spec)), vec!["vague-goal-or-task"]);

        spec.context_notes = vec!["Fails on CI only".to_string()];
        assert!(PromptLinter::new().lint(&spec).is_empty());
    }

    #[test]
    fn test_missing_stack_context() {
        let mut spec = complete();
        spec.stack_tags.clear();
        assert_eq!(ids(&PromptLinter::new().lint(&spec)), vec!["missing-stack-context"]);
    }

    #[test]
    fn test_large_inputs() {
        let mut spec = complete();
        spec.inputs = vec![
            PromptInput::new(PromptInputType::Logs, "x".repeat(7_000)),
            PromptInput::new(PromptInputType::Code, "y".repeat(5_001)),
        ];
        let issues = PromptLinter::new().lint(&spec);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Inputs are large (12001 chars).");
        assert_eq!(issues[0].suggestions.len(), 2);

        spec.inputs.pop();
        assert!(PromptLinter::new().lint(&spec).is_empty());
    }

    #[test]
    fn test_examples_hint_for_tests_and_docs() {
        let mut spec = complete();
        spec.task_type = Some(TaskType::Docs);
        let issues = PromptLinter::new().lint(&spec);
        assert_eq!(ids(&issues), vec!["missing-examples"]);
        assert_eq!(issues[0].severity, Severity::Info);
        assert!(!has_errors(&issues));

        spec.examples = vec!["/// Returns the user id.".to_string()];
        assert!(PromptLinter::new().lint(&spec).is_empty());
    }

    #[test]
    fn test_severity_threshold() {
        assert!(Severity::Error.at_least(Severity::Warning));
        assert!(Severity::Warning.at_least(Severity::Warning));
        assert!(!Severity::Info.at_least(Severity::Warning));
        assert!(Severity::Info.at_least(Severity::Info));
    }

    #[test]
    fn test_severity_parse_and_display() {
        assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!(Severity::Info.to_string(), "info");
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let issues = PromptLinter::new().lint(&PromptSpec::default());
        let value = serde_json::to_value(&issues[0]).unwrap();
        assert_eq!(value["severity"], "error");
        assert_eq!(value["fieldPath"], "goal");
    }
}
