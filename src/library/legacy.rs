//! Read-time upgrade for skills imported before skill specs had real content.
//!
//! Old imports stored a single placeholder step and nothing else. Those items are
//! returned with a generated spec instead; nothing is written back until the
//! item is saved again.

use crate::schema::skill::strings;
use crate::schema::{ItemPayload, LibraryItem, SkillInput, SkillSpec};

const PLACEHOLDER_STEPS: [&str; 2] = [
    "review imported skill and define implementation workflow.",
    "describe the first implementation step.",
];

pub fn is_legacy_placeholder(spec: &SkillSpec) -> bool {
    let [step] = spec.steps.as_slice() else {
        return false;
    };
    let step = step.trim().to_lowercase();

    PLACEHOLDER_STEPS.contains(&step.as_str())
        && spec.inputs.is_empty()
        && spec.outputs.is_empty()
        && spec.verification.is_empty()
}

fn is_youtube_analyzer(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("youtube") && lower.contains("analy")
}

fn youtube_analyzer_spec(name: &str, description: &str) -> SkillSpec {
    let description = if description.is_empty() {
        "Analyze one or more YouTube videos and return concise insights, structure, and actionable takeaways."
    } else {
        description
    };

    SkillSpec {
        name: name.to_string(),
        description: description.to_string(),
        when_to_use: Some("Use when you need summaries, timestamps, topic extraction, sentiment, or content strategy insights from video transcripts.".to_string()),
        inputs: vec![
            SkillInput::new(
                "input-video-url",
                "Video URL(s)",
                "One or more YouTube links to analyze.",
                true,
            ),
            SkillInput::new(
                "input-goal",
                "Analysis goal",
                "What the analysis should optimize for (learning, SEO, script extraction, competitive research).",
                true,
            ),
            SkillInput::new(
                "input-audience",
                "Target audience",
                "Who the report is for and preferred depth/tone.",
                false,
            ),
            SkillInput::new(
                "input-output-format",
                "Output format",
                "Requested output style: bullets, table, JSON, or structured report.",
                false,
            ),
        ],
        steps: strings(&[
            "Validate URLs and collect metadata (title, channel, duration, publish date).",
            "Extract transcript or captions and split into logical sections.",
            "Identify major themes, claims, and supporting examples with timestamps.",
            "Summarize each section and synthesize overall narrative and key insights.",
            "Generate actionable recommendations tailored to the requested analysis goal.",
            "Return structured output with assumptions, confidence notes, and gaps.",
        ]),
        outputs: strings(&[
            "Structured video summary with timestamped sections",
            "Key insights and recurring themes",
            "Actionable recommendations aligned to the analysis goal",
            "Open questions or uncertain areas due to missing transcript context",
        ]),
        verification: strings(&[
            "All requested video URLs were analyzed or clearly flagged as inaccessible",
            "Timestamp references are present for major claims",
            "Summary reflects both high-level narrative and specific details",
            "Recommendations are tied to evidence from transcript content",
        ]),
        notes: Some(
            "If transcript quality is poor, state limitations explicitly and avoid fabricated details."
                .to_string(),
        ),
    }
}

fn generic_spec(name: &str, description: &str) -> SkillSpec {
    let base = SkillSpec::default();
    SkillSpec {
        name: name.to_string(),
        description: if description.is_empty() {
            base.description.clone()
        } else {
            description.to_string()
        },
        ..base
    }
}

/// Returns `item` unchanged unless it is a placeholder skill. Idempotent: an
/// upgraded spec has several steps and is never a placeholder again.
pub fn upgrade_legacy_skill(mut item: LibraryItem) -> LibraryItem {
    let ItemPayload::Skill(payload) = &mut item.payload else {
        return item;
    };
    let spec = &payload.skill_spec;
    if !is_legacy_placeholder(spec) {
        return item;
    }

    let name = match spec.name.trim() {
        "" if item.title.is_empty() => "Untitled Skill".to_string(),
        "" => item.title.clone(),
        trimmed => trimmed.to_string(),
    };
    let description = match spec.description.trim() {
        "" => item.description.clone().unwrap_or_default(),
        trimmed => trimmed.to_string(),
    };

    let mut upgraded = if is_youtube_analyzer(&name) {
        youtube_analyzer_spec(&name, &description)
    } else {
        generic_spec(&name, &description)
    };
    if let Some(notes) = spec.notes.as_ref().filter(|n| !n.is_empty()) {
        upgraded.notes = Some(notes.clone());
    }

    let item_description = if description.is_empty() {
        upgraded.description.clone()
    } else {
        description
    };
    payload.skill_spec = upgraded;
    item.description = Some(item_description);
    item
}
