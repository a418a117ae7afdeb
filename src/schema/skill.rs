//! Reusable instructional documents: inputs, ordered steps, outputs, checks.

use serde::{Deserialize, Serialize};

use super::error::{field, index, Issues, Validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInput {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl SkillInput {
    pub fn new(id: &str, name: &str, description: &str, required: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            required,
        }
    }

    /// Blank row for an editor; fails validation until a name is filled in.
    pub fn empty() -> Self {
        Self {
            id: crate::util::generate_id("input"),
            name: String::new(),
            description: Some(String::new()),
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSourceFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSpec {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_to_use: Option<String>,
    #[serde(default)]
    pub inputs: Vec<SkillInput>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub verification: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SkillSpec {
    fn default() -> Self {
        Self {
            name: "Untitled Skill".to_string(),
            description: "Structured implementation skill with explicit inputs, workflow, deliverables, and quality checks.".to_string(),
            when_to_use: Some("Use when a task requires repeatable execution with clear requirements, implementation steps, and validation criteria.".to_string()),
            inputs: vec![
                SkillInput::new(
                    "input-objective",
                    "Objective",
                    "What outcome is required and why it matters.",
                    true,
                ),
                SkillInput::new(
                    "input-context",
                    "Context",
                    "Current system state, constraints, and relevant references.",
                    false,
                ),
                SkillInput::new(
                    "input-acceptance",
                    "Acceptance criteria",
                    "Observable checks that confirm the task is complete.",
                    true,
                ),
            ],
            steps: strings(&[
                "Parse the objective and constraints, then restate scope and success criteria.",
                "Identify required inputs, dependencies, and assumptions before implementation.",
                "Execute the implementation workflow in small, verifiable steps.",
                "Validate outputs against acceptance criteria and edge cases.",
                "Summarize final deliverables, residual risks, and next actions.",
            ]),
            outputs: strings(&[
                "Implementation result aligned to objective",
                "Decision log and key assumptions",
                "Validation summary with pass/fail checks",
                "Follow-up recommendations",
            ]),
            verification: strings(&[
                "All required inputs were provided or assumptions were explicitly stated",
                "Steps were executed in sequence with traceable rationale",
                "Outputs satisfy acceptance criteria",
                "Risks, limitations, and open questions are documented",
            ]),
            notes: None,
        }
    }
}

impl Validate for SkillSpec {
    fn check(&mut self, path: &str, issues: &mut Issues) {
        issues.non_empty(&field(path, "name"), &mut self.name);
        issues.non_empty(&field(path, "description"), &mut self.description);
        issues.trimmed_opt(&mut self.when_to_use);

        let inputs_path = field(path, "inputs");
        for (i, input) in self.inputs.iter_mut().enumerate() {
            let p = index(&inputs_path, i);
            issues.present(&field(&p, "id"), &input.id);
            issues.non_empty(&field(&p, "name"), &mut input.name);
            issues.trimmed_opt(&mut input.description);
        }

        let steps_path = field(path, "steps");
        if self.steps.is_empty() {
            issues.push(&steps_path, "must contain at least one step");
        }
        issues.non_empty_list(&steps_path, &mut self.steps);
        issues.non_empty_list(&field(path, "outputs"), &mut self.outputs);
        issues.non_empty_list(&field(path, "verification"), &mut self.verification);
        issues.trimmed_opt(&mut self.notes);
    }
}

impl Validate for SkillSourceFile {
    fn check(&mut self, path: &str, issues: &mut Issues) {
        issues.non_empty(&field(path, "path"), &mut self.path);
        issues.trimmed_opt(&mut self.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_skill_spec_shape() {
        let spec = SkillSpec::default();
        assert_eq!(spec.inputs.len(), 3);
        assert_eq!(spec.steps.len(), 5);
        assert_eq!(spec.outputs.len(), 4);
        assert_eq!(spec.verification.len(), 4);
        assert!(spec.validated().is_ok());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let mut spec = SkillSpec::default();
        spec.steps.clear();
        let err = spec.validated().unwrap_err();
        assert!(err.mentions("steps"));
    }

    #[test]
    fn test_missing_steps_field_is_shape_error() {
        let result: Result<SkillSpec, _> = serde_json::from_value(json!({
            "name": "x",
            "description": "y"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_lists_default_empty() {
        let spec: SkillSpec = serde_json::from_value(json!({
            "name": "x",
            "description": "y",
            "steps": ["one"]
        }))
        .unwrap();
        assert!(spec.inputs.is_empty());
        assert!(spec.outputs.is_empty());
        assert!(spec.verification.is_empty());
    }

    #[test]
    fn test_empty_input_row_fails_until_named() {
        let mut spec = SkillSpec::default();
        spec.inputs.push(SkillInput::empty());
        let err = spec.validated().unwrap_err();
        assert!(err.mentions("inputs[3].name"));
    }
}
