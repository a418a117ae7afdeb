//! Structured LLM prompt specification and the legacy preset wrapper.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::{field, index, Issues, Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptInputType {
    Code,
    Logs,
    Requirements,
    Data,
}

impl PromptInputType {
    pub fn as_str(&self) -> &str {
        match self {
            PromptInputType::Code => "code",
            PromptInputType::Logs => "logs",
            PromptInputType::Requirements => "requirements",
            PromptInputType::Data => "data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Implement,
    Debug,
    Refactor,
    Tests,
    Architecture,
    Docs,
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Implement => "implement",
            TaskType::Debug => "debug",
            TaskType::Refactor => "refactor",
            TaskType::Tests => "tests",
            TaskType::Architecture => "architecture",
            TaskType::Docs => "docs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    FullFiles,
    PatchDiff,
    Plan,
    CodePlusExplanation,
}

impl OutputMode {
    pub fn as_str(&self) -> &str {
        match self {
            OutputMode::FullFiles => "full_files",
            OutputMode::PatchDiff => "patch_diff",
            OutputMode::Plan => "plan",
            OutputMode::CodePlusExplanation => "code_plus_explanation",
        }
    }
}

pub const MIN_QUESTIONS: i64 = 1;
pub const MAX_QUESTIONS: i64 = 10;

fn default_max_questions() -> i64 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AssumptionsPolicy {
    AskQuestions {
        #[serde(rename = "maxQuestions", default = "default_max_questions")]
        max_questions: i64,
    },
    ProceedWithAssumptions,
}

impl Default for AssumptionsPolicy {
    fn default() -> Self {
        AssumptionsPolicy::AskQuestions {
            max_questions: default_max_questions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInput {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PromptInputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub content: String,
}

impl PromptInput {
    pub fn new(kind: PromptInputType, content: impl Into<String>) -> Self {
        Self {
            id: crate::util::generate_id("input"),
            kind,
            label: Some(String::new()),
            language: Some(String::new()),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputContract {
    pub mode: OutputMode,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMetadata {
    /// Pinned to 1.
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSpec {
    pub title: String,
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default)]
    pub stack_tags: Vec<String>,
    #[serde(default)]
    pub context_notes: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<PromptInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_contract: Option<OutputContract>,
    #[serde(default)]
    pub examples: Vec<String>,
    pub assumptions_policy: AssumptionsPolicy,
    pub metadata: PromptMetadata,
}

fn iso(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl PromptSpec {
    /// Empty spec stamped at `now`.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        let stamp = iso(now);
        Self {
            title: String::new(),
            goal: String::new(),
            persona: None,
            stack_tags: Vec::new(),
            context_notes: Vec::new(),
            inputs: Vec::new(),
            task_type: None,
            constraints: Vec::new(),
            output_contract: None,
            examples: Vec::new(),
            assumptions_policy: AssumptionsPolicy::default(),
            metadata: PromptMetadata {
                version: 1,
                created_at: stamp.clone(),
                updated_at: stamp,
            },
        }
    }

    /// Copy with `metadata.updatedAt` moved to `now`.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.metadata.updated_at = iso(now);
        next
    }

    pub fn parse(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value::<Self>(value)
            .map_err(ValidationError::shape)?
            .validated()
    }
}

impl Default for PromptSpec {
    fn default() -> Self {
        Self::new_at(Utc::now())
    }
}

fn check_datetime(path: &str, value: &str, issues: &mut Issues) {
    if DateTime::parse_from_rfc3339(value).is_err() {
        issues.push(path, format!("invalid datetime: {}", value));
    }
}

impl Validate for PromptSpec {
    fn check(&mut self, path: &str, issues: &mut Issues) {
        issues.trimmed(&mut self.title);
        issues.trimmed(&mut self.goal);
        issues.trimmed_opt(&mut self.persona);
        issues.non_empty_list(&field(path, "stackTags"), &mut self.stack_tags);
        issues.non_empty_list(&field(path, "contextNotes"), &mut self.context_notes);

        let inputs_path = field(path, "inputs");
        for (i, input) in self.inputs.iter_mut().enumerate() {
            let p = index(&inputs_path, i);
            issues.present(&field(&p, "id"), &input.id);
            issues.trimmed_opt(&mut input.label);
            issues.trimmed_opt(&mut input.language);
            issues.trimmed(&mut input.content);
        }

        issues.non_empty_list(&field(path, "constraints"), &mut self.constraints);
        if let Some(contract) = self.output_contract.as_mut() {
            issues.non_empty_list(
                &field(&field(path, "outputContract"), "requirements"),
                &mut contract.requirements,
            );
        }
        issues.non_empty_list(&field(path, "examples"), &mut self.examples);

        if let AssumptionsPolicy::AskQuestions { max_questions } = self.assumptions_policy {
            if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&max_questions) {
                issues.push(
                    field(&field(path, "assumptionsPolicy"), "maxQuestions"),
                    format!(
                        "must be between {} and {} (got {})",
                        MIN_QUESTIONS, MAX_QUESTIONS, max_questions
                    ),
                );
            }
        }

        let meta_path = field(path, "metadata");
        if self.metadata.version != 1 {
            issues.push(
                field(&meta_path, "version"),
                format!("unsupported version {}", self.metadata.version),
            );
        }
        check_datetime(
            &field(&meta_path, "createdAt"),
            &self.metadata.created_at,
            issues,
        );
        check_datetime(
            &field(&meta_path, "updatedAt"),
            &self.metadata.updated_at,
            issues,
        );
    }
}

/// Saved prompt-builder preset. Only the legacy custom-preset list still uses this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPreset {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub built_in: bool,
    pub spec: PromptSpec,
}

impl PromptPreset {
    pub fn parse(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value::<Self>(value)
            .map_err(ValidationError::shape)?
            .validated()
    }
}

impl Validate for PromptPreset {
    fn check(&mut self, path: &str, issues: &mut Issues) {
        issues.present(&field(path, "id"), &self.id);
        issues.present(&field(path, "name"), &self.name);
        issues.present(&field(path, "description"), &self.description);
        self.spec.check(&field(path, "spec"), issues);
    }
}

fn preset(name: &str, description: &str, spec: PromptSpec) -> PromptPreset {
    PromptPreset {
        id: name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"),
        name: name.to_string(),
        description: description.to_string(),
        built_in: true,
        spec,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Presets shipped with the prompt builder.
pub fn built_in_presets(now: DateTime<Utc>) -> Vec<PromptPreset> {
    let mut salesforce = PromptSpec::new_at(now);
    salesforce.title = "Salesforce Feature Request".to_string();
    salesforce.goal =
        "Implement a Salesforce feature with Apex, LWC, and robust test coverage.".to_string();
    salesforce.persona = Some("a Salesforce senior engineer".to_string());
    salesforce.stack_tags = strings(&["Salesforce", "Apex", "LWC", "SOQL"]);
    salesforce.task_type = Some(TaskType::Implement);
    salesforce.constraints = strings(&[
        "Use Assert class in tests.",
        "Do not use SeeAllData=true.",
        "Account for governor limits and bulk-safe logic.",
        "Include file paths for all code changes.",
    ]);
    salesforce.output_contract = Some(OutputContract {
        mode: OutputMode::PatchDiff,
        requirements: strings(&[
            "Provide file paths and diffs.",
            "Include acceptance criteria and edge cases.",
            "Include test classes and run instructions.",
        ]),
    });

    let mut nextjs = PromptSpec::new_at(now);
    nextjs.title = "Next.js + shadcn Feature Request".to_string();
    nextjs.goal =
        "Build a production-ready Next.js feature with accessible shadcn UI and tests.".to_string();
    nextjs.persona = Some("a senior full-stack TypeScript engineer".to_string());
    nextjs.stack_tags = strings(&["Next.js", "React", "TypeScript", "shadcn/ui"]);
    nextjs.task_type = Some(TaskType::Implement);
    nextjs.constraints = strings(&[
        "Include file paths in responses.",
        "Use strict TypeScript types.",
        "Include accessibility considerations (keyboard, focus, semantic markup).",
        "Add unit/component tests for changed UI behavior.",
    ]);
    nextjs.output_contract = Some(OutputContract {
        mode: OutputMode::CodePlusExplanation,
        requirements: strings(&[
            "Provide files changed and commands to run tests.",
            "Call out edge cases and validation states.",
        ]),
    });

    vec![
        preset(
            "Salesforce Feature (Apex + LWC + Tests)",
            "Feature implementation preset for Salesforce projects with testing and governor-limit guidance.",
            salesforce,
        ),
        preset(
            "Next.js + shadcn UI Feature",
            "Feature implementation preset for Next.js with shadcn UI and accessibility checks.",
            nextjs,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "title": "  Legacy Draft ",
            "goal": "Ship it",
            "assumptionsPolicy": { "mode": "ask_questions" },
            "metadata": {
                "version": 1,
                "createdAt": "2024-01-01T00:00:00.000Z",
                "updatedAt": "2024-01-01T00:00:00.000Z"
            }
        })
    }

    #[test]
    fn test_parse_applies_defaults_and_trims() {
        let spec = PromptSpec::parse(minimal()).unwrap();
        assert_eq!(spec.title, "Legacy Draft");
        assert!(spec.stack_tags.is_empty());
        assert_eq!(
            spec.assumptions_policy,
            AssumptionsPolicy::AskQuestions { max_questions: 3 }
        );
    }

    #[test]
    fn test_question_cap_bounds() {
        let mut value = minimal();
        value["assumptionsPolicy"] = json!({ "mode": "ask_questions", "maxQuestions": 11 });
        let err = PromptSpec::parse(value).unwrap_err();
        assert!(err.mentions("assumptionsPolicy.maxQuestions"));

        let mut value = minimal();
        value["assumptionsPolicy"] = json!({ "mode": "ask_questions", "maxQuestions": 0 });
        assert!(PromptSpec::parse(value).is_err());

        let mut value = minimal();
        value["assumptionsPolicy"] = json!({ "mode": "proceed_with_assumptions" });
        assert!(PromptSpec::parse(value).is_ok());
    }

    #[test]
    fn test_metadata_version_pinned() {
        let mut value = minimal();
        value["metadata"]["version"] = json!(2);
        let err = PromptSpec::parse(value).unwrap_err();
        assert!(err.mentions("metadata.version"));
    }

    #[test]
    fn test_metadata_requires_datetime() {
        let mut value = minimal();
        value["metadata"]["createdAt"] = json!("yesterday");
        let err = PromptSpec::parse(value).unwrap_err();
        assert!(err.mentions("metadata.createdAt"));
    }

    #[test]
    fn test_blank_list_entries_rejected() {
        let mut value = minimal();
        value["constraints"] = json!(["ok", "   "]);
        let err = PromptSpec::parse(value).unwrap_err();
        assert!(err.mentions("constraints[1]"));
    }

    #[test]
    fn test_unknown_task_type_rejected() {
        let mut value = minimal();
        value["taskType"] = json!("deploy");
        assert!(PromptSpec::parse(value).is_err());
    }

    #[test]
    fn test_default_spec_is_valid() {
        let spec = PromptSpec::default();
        assert!(spec.clone().validated().is_ok());
        assert_eq!(spec.metadata.version, 1);
    }

    #[test]
    fn test_touched_moves_updated_at_only() {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let spec = PromptSpec::new_at(start);
        let touched = spec.touched(later);
        assert_eq!(touched.metadata.created_at, spec.metadata.created_at);
        assert!(touched.metadata.updated_at.starts_with("2024-02-01"));
    }

    #[test]
    fn test_built_in_presets_validate() {
        let presets = built_in_presets(Utc::now());
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[1].id, "next.js-+-shadcn-ui-feature");
        for p in presets {
            assert!(p.built_in);
            assert!(p.validated().is_ok());
        }
    }

    #[test]
    fn test_preset_requires_name() {
        let value = json!({ "id": "custom-1", "name": "", "description": "d", "spec": minimal() });
        let err = PromptPreset::parse(value).unwrap_err();
        assert!(err.mentions("name"));
    }
}
