// src/protobuf_converter.rs
use crate::diagnostic::{
    Diagnostic as RustDiagnostic, SecondaryDiagnostic as RustSecondaryDiagnostic,
    TextSpan as RustTextSpan,
};
use crate::proto::analyze_project_response::Message;
use crate::proto::*;

impl From<RustTextSpan> for TextRange {
    fn from(span: RustTextSpan) -> Self {
        TextRange {
            start_line: span.start_line,
            start_column: span.start_column,
            end_line: span.end_line,
            end_column: span.end_column,
        }
    }
}

impl From<RustSecondaryDiagnostic> for SecondaryLocation {
    fn from(secondary: RustSecondaryDiagnostic) -> Self {
        SecondaryLocation {
            message: secondary.message,
            range: Some(secondary.range.into()),
        }
    }
}

impl From<RustDiagnostic> for Issue {
    fn from(diagnostic: RustDiagnostic) -> Self {
        Issue {
            rule_name: diagnostic.rule_id,
            message: diagnostic.message,
            range: Some(diagnostic.range.into()),
            secondary_locations: diagnostic
                .secondary_locations
                .into_iter()
                .map(SecondaryLocation::from)
                .collect(),
        }
    }
}

impl AnalyzeProjectResponse {
    pub fn file_result(file_path: impl Into<String>, diagnostics: Vec<RustDiagnostic>) -> Self {
        AnalyzeProjectResponse {
            message: Some(Message::FileResult(FileResult {
                file_path: file_path.into(),
                issues: diagnostics.into_iter().map(Issue::from).collect(),
            })),
        }
    }

    pub fn complete() -> Self {
        AnalyzeProjectResponse {
            message: Some(Message::AnalysisComplete(AnalysisComplete {})),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.message, Some(Message::AnalysisComplete(_)))
    }

    pub fn as_file_result(&self) -> Option<&FileResult> {
        match &self.message {
            Some(Message::FileResult(result)) => Some(result),
            _ => None,
        }
    }
}

impl AliveResponse {
    pub fn ok() -> Self {
        AliveResponse {
            status: "ok".to_string(),
        }
    }
}
