use std::path::Path;

use crate::schema::{SkillSourceFile, SkillSpec};

fn bullets(items: &[String]) -> Vec<String> {
    if items.is_empty() {
        return vec!["- None".to_string()];
    }
    items.iter().map(|item| format!("- {}", item)).collect()
}

/// Fence language for a source file, guessed from its extension.
fn fence_language(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "sh" | "bash" => "bash",
        "json" => "json",
        "toml" => "toml",
        "yml" | "yaml" => "yaml",
        "md" => "markdown",
        "cls" | "trigger" => "apex",
        "html" => "html",
        "css" => "css",
        _ => "",
    }
}

/// Longest run of backticks in `content`, so the fence can be made longer.
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in content.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}

fn source_file_lines(files: &[SkillSourceFile]) -> Vec<String> {
    let mut lines = vec![String::new(), "## Source Files".to_string()];
    for file in files {
        lines.push(String::new());
        lines.push(format!("### {}", file.path));
        if let Some(description) = file.description.as_deref().filter(|d| !d.trim().is_empty()) {
            lines.push(description.to_string());
        }
        let fence = fence_for(&file.content);
        lines.push(format!("{}{}", fence, fence_language(&file.path)));
        lines.push(file.content.trim_end_matches('\n').to_string());
        lines.push(fence);
    }
    lines
}

/// Render a skill as a Claude-style markdown document.
pub fn render_skill_markdown(spec: &SkillSpec, source_files: &[SkillSourceFile]) -> String {
    let mut lines = vec![
        format!("# {}", spec.name),
        String::new(),
        "## Purpose".to_string(),
        spec.description.clone(),
    ];

    if let Some(when) = spec.when_to_use.as_deref().filter(|w| !w.trim().is_empty()) {
        lines.push(String::new());
        lines.push("## When To Use".to_string());
        lines.push(when.to_string());
    }

    lines.push(String::new());
    lines.push("## Inputs".to_string());
    if spec.inputs.is_empty() {
        lines.push("- None".to_string());
    }
    for input in &spec.inputs {
        let required = if input.required { " (required)" } else { "" };
        let description = input
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| format!(": {}", d))
            .unwrap_or_default();
        lines.push(format!("- {}{}{}", input.name, required, description));
    }

    lines.push(String::new());
    lines.push("## Steps".to_string());
    for (index, step) in spec.steps.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, step));
    }

    lines.push(String::new());
    lines.push("## Output Expectations".to_string());
    lines.extend(bullets(&spec.outputs));

    lines.push(String::new());
    lines.push("## Verification Checklist".to_string());
    lines.extend(bullets(&spec.verification));

    if let Some(notes) = spec.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(String::new());
        lines.push("## Notes".to_string());
        lines.push(notes.to_string());
    }

    if !source_files.is_empty() {
        lines.extend(source_file_lines(source_files));
    }

    lines.join("\n").trim().to_string()
}
