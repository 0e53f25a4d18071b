pub mod adapter;
pub mod engine;
pub mod facade;
pub mod normalize;
pub mod options;
pub mod report;
pub mod tools;

pub use engine::{
    CommandEngineFactory, EngineError, EngineFactory, EngineSettings, ErrorDetail, LintIssue,
    LintOutcome, ParseOutcome, Severity,
};
pub use facade::Validator;
pub use options::ValidationOptions;
pub use report::{
    render_report, Failure, Fault, InputRef, LintReport, OutputFormat, ParserKind, Report,
    ValidationReport,
};
pub use tools::{ToolCall, ToolError, ToolSpec};
