use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::engine::{ErrorDetail, LintIssue, LintOutcome};
use crate::options::ValidationOptions;

/// Format styles supported in default reporter implementations.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Which parser produced a validation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    TonelOnly,
    Full,
    SmalltalkMethod,
}

impl ParserKind {
    /// Structure-only when method bodies are skipped, full parse otherwise.
    pub fn for_options(options: &ValidationOptions) -> Self {
        if options.without_method_body {
            Self::TonelOnly
        } else {
            Self::Full
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TonelOnly => "tonel_only",
            Self::Full => "full",
            Self::SmalltalkMethod => "smalltalk_method",
        }
    }
}

/// Length of inline text as reported to callers, in characters rather than bytes.
pub fn content_length(text: &str) -> usize {
    text.chars().count()
}

/// Identifies the input a report was produced for.
///
/// Inline text is summarised by its length; the text itself is never echoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRef {
    File(PathBuf),
    Text { content_length: usize },
}

impl InputRef {
    pub fn file(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }

    pub fn text(content: &str) -> Self {
        Self::Text {
            content_length: content_length(content),
        }
    }

    fn serialize_into<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self {
            Self::File(path) => map.serialize_entry("file_path", &path.display().to_string()),
            Self::Text { content_length } => map.serialize_entry("content_length", content_length),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Text { content_length } => format!("<inline text, {content_length} chars>"),
        }
    }
}

/// An unexpected condition raised by the engine or the adapter around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Category name of the fault, e.g. `ProtocolError` or `Panic`.
    pub kind: String,
    /// Caller-facing message, already prefixed with the failed operation.
    pub message: String,
}

/// Error value carried by a rejected validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Detail(ErrorDetail),
    Message(String),
}

/// Why an operation did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The referenced file does not exist; the engine was never called.
    MissingInput(PathBuf),
    /// The engine parsed the input and rejected it.
    Rejected(ErrorPayload),
    Fault(Fault),
}

impl Failure {
    pub fn fault(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fault(Fault {
            kind: kind.into(),
            message: message.into(),
        })
    }

    pub fn exception(&self) -> Option<&str> {
        match self {
            Self::Fault(fault) => Some(&fault.kind),
            _ => None,
        }
    }

    /// Human-readable summary of the `error` value.
    pub fn message(&self) -> String {
        match self {
            Self::MissingInput(path) => format!("File not found: {}", path.display()),
            Self::Rejected(ErrorPayload::Message(message)) => message.clone(),
            Self::Rejected(ErrorPayload::Detail(detail)) => detail.summary(),
            Self::Fault(fault) => fault.message.clone(),
        }
    }

    fn serialize_into<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self {
            Self::Rejected(payload) => map.serialize_entry("error", payload)?,
            other => map.serialize_entry("error", &other.message())?,
        }
        if let Some(kind) = self.exception() {
            map.serialize_entry("exception", kind)?;
        }
        Ok(())
    }
}

/// Result of validating one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub input: InputRef,
    pub parser: ParserKind,
    pub outcome: Result<(), Failure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.outcome.as_ref().err()
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.is_valid())?;
        self.input.serialize_into(&mut map)?;
        map.serialize_entry("parser_type", &self.parser)?;
        if let Err(failure) = &self.outcome {
            failure.serialize_into(&mut map)?;
        }
        map.end()
    }
}

/// Result of linting one input.
#[derive(Debug, Clone, PartialEq)]
pub struct LintReport {
    pub input: InputRef,
    pub outcome: Result<LintOutcome, Failure>,
}

impl LintReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Issues in the order the linter produced them; empty on failure.
    pub fn issues(&self) -> &[LintIssue] {
        match &self.outcome {
            Ok(outcome) => &outcome.issues,
            Err(_) => &[],
        }
    }

    pub fn issues_count(&self) -> usize {
        self.issues().len()
    }

    pub fn warnings_count(&self) -> u64 {
        self.outcome.as_ref().map_or(0, |outcome| outcome.warnings)
    }

    pub fn errors_count(&self) -> u64 {
        self.outcome.as_ref().map_or(0, |outcome| outcome.errors)
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.outcome.as_ref().err()
    }
}

impl Serialize for LintReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.is_success())?;
        self.input.serialize_into(&mut map)?;
        map.serialize_entry("issue_list", self.issues())?;
        map.serialize_entry("issues_count", &self.issues_count())?;
        map.serialize_entry("warnings_count", &self.warnings_count())?;
        map.serialize_entry("errors_count", &self.errors_count())?;
        if let Err(failure) = &self.outcome {
            failure.serialize_into(&mut map)?;
        }
        map.end()
    }
}

/// Any report returned by the facade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Validation(ValidationReport),
    Lint(LintReport),
}

impl From<ValidationReport> for Report {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

impl From<LintReport> for Report {
    fn from(report: LintReport) -> Self {
        Self::Lint(report)
    }
}

impl Report {
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Produce a report string using the desired format.
pub fn render_report(report: &Report, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn render_human(report: &Report) -> anyhow::Result<String> {
    let mut out = String::new();
    match report {
        Report::Validation(report) => {
            writeln!(out, "Input: {}", report.input.describe())?;
            writeln!(out, "Parser: {}", report.parser.as_str())?;
            match &report.outcome {
                Ok(()) => writeln!(out, "Valid: yes")?,
                Err(failure) => {
                    writeln!(out, "Valid: no")?;
                    render_failure(&mut out, failure)?;
                }
            }
        }
        Report::Lint(report) => {
            writeln!(out, "Input: {}", report.input.describe())?;
            match &report.outcome {
                Ok(outcome) => {
                    writeln!(
                        out,
                        "Issues: {} ({} warning(s), {} error(s))",
                        outcome.issues.len(),
                        outcome.warnings,
                        outcome.errors
                    )?;
                    for issue in &outcome.issues {
                        writeln!(
                            out,
                            "  - line {line:>4} [{severity}] {message}",
                            line = issue.line_number,
                            severity = issue.severity,
                            message = sanitize_message(&issue.message),
                        )?;
                    }
                }
                Err(failure) => {
                    writeln!(out, "Lint: failed")?;
                    render_failure(&mut out, failure)?;
                }
            }
        }
    }
    Ok(out)
}

fn render_failure(out: &mut String, failure: &Failure) -> std::fmt::Result {
    writeln!(out, "Error: {}", sanitize_message(&failure.message()))?;
    if let Some(kind) = failure.exception() {
        writeln!(out, "Exception: {kind}")?;
    }
    Ok(())
}

fn sanitize_message(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Severity;
    use serde_json::json;

    fn lint_outcome() -> LintOutcome {
        LintOutcome {
            issues: vec![
                LintIssue {
                    severity: Severity::Error,
                    message: "Invalid class name".into(),
                    line_number: 1,
                },
                LintIssue {
                    severity: Severity::Warning,
                    message: "Too many instance variables".into(),
                    line_number: 3,
                },
            ],
            warnings: 1,
            errors: 1,
        }
    }

    #[test]
    fn valid_report_has_no_error_key() {
        let report = ValidationReport {
            input: InputRef::text("^ self name"),
            parser: ParserKind::SmalltalkMethod,
            outcome: Ok(()),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({ "valid": true, "content_length": 11, "parser_type": "smalltalk_method" })
        );
    }

    #[test]
    fn rejected_report_passes_detail_through() {
        let detail = ErrorDetail::new("Syntax error")
            .at_line(1)
            .with_text("invalid syntax");
        let report = ValidationReport {
            input: InputRef::file(Path::new("/tmp/A.class.st")),
            parser: ParserKind::Full,
            outcome: Err(Failure::Rejected(ErrorPayload::Detail(detail))),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["error"],
            json!({ "reason": "Syntax error", "line": 1, "error_text": "invalid syntax" })
        );
        assert_eq!(value["file_path"], json!("/tmp/A.class.st"));
        assert!(value.get("exception").is_none());
    }

    #[test]
    fn fault_report_carries_exception_kind() {
        let report = ValidationReport {
            input: InputRef::text("abc"),
            parser: ParserKind::TonelOnly,
            outcome: Err(Failure::fault("ValueError", "Validation failed: boom")),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["valid"], json!(false));
        assert_eq!(value["error"], json!("Validation failed: boom"));
        assert_eq!(value["exception"], json!("ValueError"));
    }

    #[test]
    fn failed_lint_report_keeps_empty_issue_list() {
        let report = LintReport {
            input: InputRef::file(Path::new("/missing.st")),
            outcome: Err(Failure::MissingInput(PathBuf::from("/missing.st"))),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["issue_list"], json!([]));
        assert_eq!(value["issues_count"], json!(0));
        assert_eq!(value["error"], json!("File not found: /missing.st"));
        assert!(value.get("exception").is_none());
    }

    #[test]
    fn content_length_ignores_utf8_width() {
        let text = "Object subclass: #Café";
        assert_eq!(text.len(), 23);
        assert_eq!(content_length(text), 22);
    }

    #[test]
    fn content_length_counts_characters() {
        assert_eq!(
            InputRef::text("héllo"),
            InputRef::Text { content_length: 5 }
        );
    }

    #[test]
    fn human_lint_report_lists_issues_in_order() {
        let report = Report::from(LintReport {
            input: InputRef::text("Class { #name : #TestClass }"),
            outcome: Ok(lint_outcome()),
        });
        let output = render_report(&report, OutputFormat::Human).unwrap();
        assert!(output.contains("Issues: 2 (1 warning(s), 1 error(s))"));
        let first = output.find("Invalid class name").unwrap();
        let second = output.find("Too many instance variables").unwrap();
        assert!(first < second);
    }

    #[test]
    fn human_validation_report_shows_exception() {
        let report = Report::from(ValidationReport {
            input: InputRef::text("x"),
            parser: ParserKind::Full,
            outcome: Err(Failure::fault("Panic", "Validation failed: oops\nline two")),
        });
        let output = render_report(&report, OutputFormat::Human).unwrap();
        assert!(output.contains("Valid: no"));
        assert!(output.contains("Error: Validation failed: oops line two"));
        assert!(output.contains("Exception: Panic"));
    }

    #[test]
    fn json_report_serializes() {
        let report = Report::from(LintReport {
            input: InputRef::text("x"),
            outcome: Ok(lint_outcome()),
        });
        let output = render_report(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["issues_count"], json!(2));
        assert_eq!(value["issue_list"][0]["line_number"], json!(1));
    }
}
