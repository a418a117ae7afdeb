use std::fmt;

/// A single structural problem found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted field path, e.g. `payload.skillSpec.steps[0]`. Empty for the root.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A document failed its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    /// Wrap a serde shape error (missing field, wrong type, unknown variant).
    pub fn shape(err: serde_json::Error) -> Self {
        Self::single("", err.to_string())
    }

    pub fn mentions(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

/// Accumulates issues while a validator walks a document.
///
/// String checks trim in place, so a validated document is also normalized.
#[derive(Debug, Default)]
pub struct Issues {
    items: Vec<ValidationIssue>,
}

impl Issues {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.items.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Trim `value`; no length requirement.
    pub fn trimmed(&mut self, value: &mut String) {
        let t = value.trim();
        if t.len() != value.len() {
            *value = t.to_string();
        }
    }

    /// Trim `value` and require at least one character.
    pub fn non_empty(&mut self, path: &str, value: &mut String) {
        self.trimmed(value);
        if value.is_empty() {
            self.push(path, "must not be empty");
        }
    }

    /// Require at least one character without trimming (ids).
    pub fn present(&mut self, path: &str, value: &str) {
        if value.is_empty() {
            self.push(path, "must not be empty");
        }
    }

    pub fn trimmed_opt(&mut self, value: &mut Option<String>) {
        if let Some(v) = value.as_mut() {
            self.trimmed(v);
        }
    }

    /// Every entry trimmed and non-empty.
    pub fn non_empty_list(&mut self, path: &str, values: &mut [String]) {
        for (i, v) in values.iter_mut().enumerate() {
            self.non_empty(&index(path, i), v);
        }
    }

    pub fn positive(&mut self, path: &str, value: i64) {
        if value <= 0 {
            self.push(path, format!("must be a positive integer (got {})", value));
        }
    }

    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.items.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { issues: self.items })
        }
    }
}

pub fn field(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

pub fn index(base: &str, i: usize) -> String {
    format!("{}[{}]", base, i)
}

/// Types that can check and normalize themselves.
pub trait Validate: Sized {
    fn check(&mut self, path: &str, issues: &mut Issues);

    fn validated(mut self) -> Result<Self, ValidationError> {
        let mut issues = Issues::default();
        self.check("", &mut issues);
        issues.finish(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_issues() {
        let mut issues = Issues::default();
        issues.push("title", "must not be empty");
        issues.push("", "bad root");
        let err = issues.finish(()).unwrap_err();
        assert_eq!(err.to_string(), "title: must not be empty; bad root");
        assert!(err.mentions("title"));
    }

    #[test]
    fn test_non_empty_trims_in_place() {
        let mut issues = Issues::default();
        let mut value = "  hello ".to_string();
        issues.non_empty("x", &mut value);
        assert_eq!(value, "hello");
        assert!(issues.is_empty());

        let mut blank = "   ".to_string();
        issues.non_empty("y", &mut blank);
        assert!(!issues.is_empty());
    }

    #[test]
    fn test_paths() {
        assert_eq!(field("", "payload"), "payload");
        assert_eq!(field("payload", "skillSpec"), "payload.skillSpec");
        assert_eq!(index("steps", 2), "steps[2]");
    }
}
