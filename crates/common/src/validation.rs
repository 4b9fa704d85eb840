//! Validation records shared by the generator and the completeness validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationErrorKind {
    /// An API was parsed but never generated.
    Missing,
    /// A type shape has no rendering rule and no manual override.
    TypeUnsupported,
    /// Generated text failed a structural check.
    SyntaxError,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Missing => "missing",
            Self::TypeUnsupported => "type-unsupported",
            Self::SyntaxError => "syntax-error",
        };
        f.write_str(label)
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Category of the finding.
    #[serde(rename = "type")]
    pub kind: ValidationErrorKind,
    /// API the finding is about, if it concerns a single API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// Human readable report.
    pub message: String,
    /// Remediation hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a finding without an API or suggestion.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            api: None,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach the API name.
    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  hint: {suggestion}")?;
        }
        Ok(())
    }
}

/// Aggregated validation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` when `errors` is empty.
    pub success: bool,
    /// All findings, in discovery order.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// Build a result from findings; passes only when there are none.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
        }
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.success = self.errors.is_empty();
    }

    /// Findings of one kind.
    pub fn errors_of(&self, kind: ValidationErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_updates_success() {
        let mut result = ValidationResult::ok();
        result.merge(ValidationResult::ok());
        assert!(result.success);

        result.merge(ValidationResult::from_errors(vec![ValidationError::new(
            ValidationErrorKind::SyntaxError,
            "unbalanced braces",
        )]));
        assert!(!result.success);
        assert_eq!(result.errors_of(ValidationErrorKind::SyntaxError).count(), 1);
        assert_eq!(result.errors_of(ValidationErrorKind::Missing).count(), 0);
    }

    #[test]
    fn test_kind_serialization() {
        let err = ValidationError::new(ValidationErrorKind::TypeUnsupported, "x")
            .with_api("getFoo")
            .with_suggestion("add a mapping");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "type-unsupported");
        assert_eq!(json["api"], "getFoo");
        assert_eq!(err.to_string(), "[type-unsupported] x\n  hint: add a mapping");
    }
}
