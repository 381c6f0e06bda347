// src/diagnostic.rs
use serde::{Deserialize, Serialize};

/// Span of source text. Lines are 1-indexed, columns 0-indexed.
///
/// Nothing here checks that the end comes after the start; engines are trusted
/// and whatever they report is carried through as-is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextSpan {
    pub start_line: i32,
    pub start_column: i32,
    pub end_line: i32,
    pub end_column: i32,
}

impl TextSpan {
    pub fn new(start_line: i32, start_column: i32, end_line: i32, end_column: i32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// A related span supporting a primary diagnostic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryDiagnostic {
    pub message: String,
    pub range: TextSpan,
}

/// One finding reported by the analysis engine for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub rule_id: String,
    pub message: String,
    pub range: TextSpan,
    #[serde(default)]
    pub secondary_locations: Vec<SecondaryDiagnostic>,
}

impl Diagnostic {
    pub fn new(rule_id: impl Into<String>, message: impl Into<String>, range: TextSpan) -> Self {
        Self {
            rule_id: rule_id.into(),
            message: message.into(),
            range,
            secondary_locations: Vec::new(),
        }
    }

    /// Appends a secondary location, keeping insertion order.
    pub fn with_secondary(mut self, message: impl Into<String>, range: TextSpan) -> Self {
        self.secondary_locations.push(SecondaryDiagnostic {
            message: message.into(),
            range,
        });
        self
    }
}
