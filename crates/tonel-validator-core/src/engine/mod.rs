use std::{fmt, path::Path};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use thiserror::Error;

pub mod command;
pub mod settings;

pub use command::{CommandEngine, CommandEngineFactory};
pub use settings::EngineSettings;

/// Error payload produced by the engine when a source fails to parse.
///
/// The payload is opaque: whatever JSON the engine sent (an object, a bare
/// string, explicit nulls included) is kept and serialized back unchanged.
/// The accessors only read the conventional `reason`/`line`/`error_text` keys
/// for human-readable rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorDetail(Value);

impl ErrorDetail {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(json!({ "reason": reason.into() }))
    }

    pub fn at_line(self, line: u64) -> Self {
        self.with_key("line", json!(line))
    }

    pub fn with_text(self, error_text: impl Into<String>) -> Self {
        self.with_key("error_text", json!(error_text.into()))
    }

    fn with_key(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value);
        }
        self
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// `reason` of an object payload, or the payload itself when it is a string.
    pub fn reason(&self) -> Option<&str> {
        match &self.0 {
            Value::String(text) => Some(text),
            other => other.get("reason").and_then(Value::as_str),
        }
    }

    pub fn line(&self) -> Option<u64> {
        self.0.get("line").and_then(Value::as_u64)
    }

    pub fn error_text(&self) -> Option<&str> {
        self.0.get("error_text").and_then(Value::as_str)
    }

    /// One-line summary used in logs and human output.
    pub fn summary(&self) -> String {
        let Some(reason) = self.reason() else {
            return self.0.to_string();
        };
        let mut out = reason.to_string();
        if let Some(line) = self.line() {
            out.push_str(&format!(" (line {line})"));
        }
        if let Some(text) = self.error_text() {
            out.push_str(&format!(": {text}"));
        }
        out
    }
}

impl From<Value> for ErrorDetail {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Raw answer of a parser: success flag plus optional error detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub ok: bool,
    #[serde(default, rename = "error")]
    pub detail: Option<ErrorDetail>,
}

impl ParseOutcome {
    pub fn valid() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    pub fn invalid(detail: ErrorDetail) -> Self {
        Self {
            ok: false,
            detail: Some(detail),
        }
    }
}

/// Severity reported by the linter. Unknown labels pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Info,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        match label.as_str() {
            "warning" => Self::Warning,
            "error" => Self::Error,
            "info" => Self::Info,
            _ => Self::Other(label),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// A single finding emitted by the linter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintIssue {
    pub severity: Severity,
    pub message: String,
    pub line_number: u64,
}

/// Everything the linter reports for one run.
///
/// `warnings` and `errors` are the linter's own counters and are not derived
/// from `issues`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintOutcome {
    #[serde(default)]
    pub issues: Vec<LintIssue>,
    #[serde(default)]
    pub warnings: u64,
    #[serde(default)]
    pub errors: u64,
}

/// Abnormal conditions raised while talking to the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{message}")]
    Raised { kind: String, message: String },
    #[error("failed to launch engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("engine produced malformed output: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Name of the fault category, surfaced to callers as `exception`.
    pub fn kind(&self) -> &str {
        match self {
            Self::Raised { kind, .. } => kind,
            Self::Spawn { .. } => "SpawnError",
            Self::Exit { .. } => "ExitError",
            Self::Protocol(_) => "ProtocolError",
            Self::Io(_) => "IoError",
        }
    }
}

/// Parser for the class/method declaration format (structure-only or full).
pub trait SourceParser {
    fn validate(&mut self, text: &str) -> Result<ParseOutcome, EngineError>;

    fn validate_from_file(&mut self, path: &Path) -> Result<ParseOutcome, EngineError>;
}

/// Parser for a single embedded method body.
pub trait MethodBodyParser {
    fn validate(&mut self, text: &str) -> Result<ParseOutcome, EngineError>;
}

/// Rule-based linter over declaration-format sources.
pub trait Linter {
    fn lint(&mut self, text: &str) -> Result<LintOutcome, EngineError>;

    fn lint_from_file(&mut self, path: &Path) -> Result<LintOutcome, EngineError>;
}

/// Builds fresh engine instances; nothing is reused between calls.
pub trait EngineFactory: Send + Sync {
    fn structure_parser(&self) -> Result<Box<dyn SourceParser>, EngineError>;

    fn full_parser(&self) -> Result<Box<dyn SourceParser>, EngineError>;

    fn method_parser(&self) -> Result<Box<dyn MethodBodyParser>, EngineError>;

    fn linter(&self) -> Result<Box<dyn Linter>, EngineError>;
}
