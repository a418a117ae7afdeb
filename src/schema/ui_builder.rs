//! UI-builder spec embedded in prompt items so the prompt can be regenerated.

use serde::{Deserialize, Serialize};

use super::error::{field, Issues, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiBuilderType {
    Layout,
    Styling,
    Components,
    Page,
}

impl UiBuilderType {
    pub fn as_str(&self) -> &str {
        match self {
            UiBuilderType::Layout => "layout",
            UiBuilderType::Styling => "styling",
            UiBuilderType::Components => "components",
            UiBuilderType::Page => "page",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Nextjs,
    React,
    Vite,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiLib {
    Shadcn,
    Mui,
    Chakra,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylingLib {
    Tailwind,
    Css,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PagePattern {
    Dashboard,
    ListDetail,
    Settings,
    Wizard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Navigation {
    Sidebar,
    TopNav,
    Tabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Responsiveness {
    MobileFirst,
    DesktopFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataPresentation {
    Table,
    Cards,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Minimal,
    Modern,
    Playful,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Compact,
    Comfortable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageOutputMode {
    FullFiles,
    PatchDiff,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<Framework>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_lib: Option<UiLib>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<StylingLib>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_pattern: Option<PagePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Navigation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsiveness: Option<Responsiveness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_presentation: Option<DataPresentation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiStyling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe: Option<Vibe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<Density>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiComponents {
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub interactions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_mode: Option<PageOutputMode>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiRequirements {
    #[serde(default = "default_true")]
    pub a11y: bool,
    #[serde(default = "default_true")]
    pub states: bool,
    #[serde(default = "default_true")]
    pub tests: bool,
}

impl Default for UiRequirements {
    fn default() -> Self {
        Self {
            a11y: true,
            states: true,
            tests: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPromptSpec {
    pub builder_type: UiBuilderType,
    pub title: String,
    pub stack: UiStack,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<UiLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<UiStyling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<UiComponents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<UiPage>,
    #[serde(default)]
    pub requirements: UiRequirements,
}

impl UiPromptSpec {
    /// Starting spec for a builder; only the section matching `builder_type` is filled in.
    pub fn new(builder_type: UiBuilderType) -> Self {
        let name = builder_type.as_str();
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };

        Self {
            builder_type,
            title: format!("UI {} Prompt", capitalized),
            stack: UiStack {
                framework: Some(Framework::Nextjs),
                ui_lib: Some(UiLib::Shadcn),
                styling: Some(StylingLib::Tailwind),
            },
            layout: (builder_type == UiBuilderType::Layout).then(|| UiLayout {
                page_pattern: Some(PagePattern::Dashboard),
                navigation: Some(Navigation::Sidebar),
                responsiveness: Some(Responsiveness::MobileFirst),
                data_presentation: Some(DataPresentation::Mixed),
            }),
            styling: (builder_type == UiBuilderType::Styling).then(|| UiStyling {
                vibe: Some(Vibe::Modern),
                theme: Some(Theme::System),
                density: Some(Density::Comfortable),
            }),
            components: (builder_type == UiBuilderType::Components).then(|| UiComponents {
                selected: vec!["table".to_string(), "form".to_string()],
                interactions: vec![
                    "create".to_string(),
                    "edit".to_string(),
                    "search".to_string(),
                ],
            }),
            page: (builder_type == UiBuilderType::Page).then(|| UiPage {
                screen_name: Some("Settings Page".to_string()),
                route: Some("/settings".to_string()),
                actions: vec!["create".to_string(), "edit".to_string()],
                output_mode: Some(PageOutputMode::PatchDiff),
            }),
            requirements: UiRequirements::default(),
        }
    }
}

impl Validate for UiPromptSpec {
    fn check(&mut self, path: &str, issues: &mut Issues) {
        issues.non_empty(&field(path, "title"), &mut self.title);
        if let Some(page) = self.page.as_mut() {
            issues.trimmed_opt(&mut page.screen_name);
            issues.trimmed_opt(&mut page.route);
        }
    }
}
