use regex::Regex;

use crate::schema::prompt::AssumptionsPolicy;
use crate::schema::PromptSpec;

enum Body<'a> {
    Text(String),
    List(&'a [String]),
}

fn section(title: &str, body: Body<'_>) -> String {
    let normalized = match body {
        Body::Text(text) => text,
        Body::List(items) => items
            .iter()
            .filter(|item| !item.is_empty())
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    if normalized.trim().is_empty() {
        return String::new();
    }
    format!("## {}\n{}\n", title, normalized)
}

fn input_lines(spec: &PromptSpec) -> String {
    spec.inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let meta = [
                Some(input.kind.as_str()),
                input.label.as_deref(),
                input.language.as_deref(),
            ]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
            format!("{}. {}\n{}", index + 1, meta, input.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render a prompt spec as chat-ready markdown.
pub fn render_prompt_text(spec: &PromptSpec) -> String {
    let title = if spec.title.is_empty() {
        "Prompt Request"
    } else {
        spec.title.as_str()
    };
    let mut blocks = vec![format!("# {}", title)];

    if let Some(persona) = spec.persona.as_deref().filter(|p| !p.is_empty()) {
        blocks.push(format!("Persona: {}", persona));
    }

    blocks.push(section("Goal", Body::Text(spec.goal.trim().to_string())));
    if let Some(task_type) = spec.task_type {
        blocks.push(section("Task Type", Body::Text(task_type.as_str().to_string())));
    }
    blocks.push(section("Stack", Body::List(&spec.stack_tags)));
    blocks.push(section("Context Notes", Body::List(&spec.context_notes)));
    if !spec.inputs.is_empty() {
        blocks.push(section("Inputs", Body::Text(input_lines(spec))));
    }
    blocks.push(section("Constraints", Body::List(&spec.constraints)));
    if let Some(contract) = &spec.output_contract {
        blocks.push(section("Output Mode", Body::Text(contract.mode.as_str().to_string())));
        blocks.push(section("Output Requirements", Body::List(&contract.requirements)));
    }
    blocks.push(section("Examples", Body::List(&spec.examples)));

    let policy = match &spec.assumptions_policy {
        AssumptionsPolicy::AskQuestions { max_questions } => format!(
            "Ask up to {} clarifying questions before implementation when needed.",
            max_questions
        ),
        AssumptionsPolicy::ProceedWithAssumptions => {
            "Proceed with reasonable assumptions and state them explicitly.".to_string()
        }
    };
    blocks.push(section("Assumptions Policy", Body::Text(policy)));

    let joined = blocks
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    match Regex::new(r"\n{3,}") {
        Ok(re) => re.replace_all(&joined, "\n\n").trim().to_string(),
        Err(_) => joined.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prompt::{OutputContract, OutputMode, PromptInput, PromptInputType, TaskType};
    use chrono::{TimeZone, Utc};

    fn spec() -> PromptSpec {
        PromptSpec::new_at(Utc.timestamp_millis_opt(0).unwrap())
    }

    #[test]
    fn test_empty_spec_renders_title_and_policy() {
        let text = render_prompt_text(&spec());
        assert_eq!(
            text,
            "# Prompt Request\n## Assumptions Policy\nAsk up to 3 clarifying questions before implementation when needed."
        );
    }

    #[test]
    fn test_full_spec() {
        let mut spec = spec();
        spec.title = "Add login".to_string();
        spec.persona = Some("Senior engineer".to_string());
        spec.goal = "  Add a login form  ".to_string();
        spec.task_type = Some(TaskType::Implement);
        spec.stack_tags = vec!["react".to_string(), String::new()];
        spec.constraints = vec!["No new dependencies".to_string()];
        spec.output_contract = Some(OutputContract {
            mode: OutputMode::PatchDiff,
            requirements: Vec::new(),
        });
        spec.assumptions_policy = AssumptionsPolicy::ProceedWithAssumptions;

        let text = render_prompt_text(&spec);
        let expected = "# Add login\nPersona: Senior engineer\n## Goal\nAdd a login form\n\n\
## Task Type\nimplement\n\n## Stack\n- react\n\n## Constraints\n- No new dependencies\n\n\
## Output Mode\npatch_diff\n\n## Assumptions Policy\nProceed with reasonable assumptions and state them explicitly.";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_inputs_are_numbered_with_meta() {
        let mut spec = spec();
        let mut input = PromptInput::new(PromptInputType::Code, "fn main() {}");
        input.label = Some("entry".to_string());
        input.language = Some("rust".to_string());
        spec.inputs = vec![input, PromptInput::new(PromptInputType::Logs, "boom")];

        let text = render_prompt_text(&spec);
        assert!(text.contains("## Inputs\n1. code | entry | rust\nfn main() {}\n\n2. logs\nboom\n"));
    }
}
