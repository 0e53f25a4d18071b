use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::adapter::Invocation;
use crate::engine::{EngineError, LintOutcome, ParseOutcome};
use crate::report::{ErrorPayload, Failure, Fault};

/// Kind name reported when the engine or adapter panics.
pub const PANIC_KIND: &str = "Panic";

/// Operation family, used to phrase fault messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Validation,
    MethodValidation,
    Linting,
}

impl Operation {
    fn fault_prefix(self) -> &'static str {
        match self {
            Self::Validation => "Validation failed",
            Self::MethodValidation => "Method validation failed",
            Self::Linting => "Linting failed",
        }
    }

    fn fault(self, kind: &str, message: impl std::fmt::Display) -> Fault {
        Fault {
            kind: kind.to_string(),
            message: format!("{}: {}", self.fault_prefix(), message),
        }
    }
}

/// Run `call` so that neither an error nor a panic escapes.
///
/// Every abnormal exit is turned into a [`Fault`] tagged with its kind name.
pub fn contain<T>(
    operation: Operation,
    call: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, Fault> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            warn!(kind = err.kind(), error = %err, "engine call failed");
            Err(operation.fault(err.kind(), &err))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(kind = PANIC_KIND, error = %message, "engine call panicked");
            Err(operation.fault(PANIC_KIND, message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Classify a contained parser call into a validation result.
///
/// A missing input wins over everything; a structured rejection is never
/// treated as a fault.
pub fn normalize_validation(
    operation: Operation,
    result: Result<Invocation<ParseOutcome>, Fault>,
) -> Result<(), Failure> {
    match result {
        Err(fault) => Err(Failure::Fault(fault)),
        Ok(Invocation::MissingInput(path)) => Err(Failure::MissingInput(path)),
        Ok(Invocation::Completed(ParseOutcome { ok: true, detail })) => {
            if detail.is_some() {
                debug!("discarding error detail attached to a successful parse");
            }
            Ok(())
        }
        Ok(Invocation::Completed(ParseOutcome {
            ok: false,
            detail: Some(detail),
        })) => {
            debug!(detail = %detail.summary(), "engine rejected input");
            Err(Failure::Rejected(ErrorPayload::Detail(detail)))
        }
        Ok(Invocation::Completed(ParseOutcome {
            ok: false,
            detail: None,
        })) => Err(Failure::Rejected(ErrorPayload::Message(format!(
            "{}: engine reported an error without details",
            operation.fault_prefix()
        )))),
    }
}

/// Classify a contained linter call. Issues never make linting fail.
pub fn normalize_lint(
    result: Result<Invocation<LintOutcome>, Fault>,
) -> Result<LintOutcome, Failure> {
    match result {
        Err(fault) => Err(Failure::Fault(fault)),
        Ok(Invocation::MissingInput(path)) => Err(Failure::MissingInput(path)),
        Ok(Invocation::Completed(outcome)) => {
            debug!(
                issues = outcome.issues.len(),
                warnings = outcome.warnings,
                errors = outcome.errors,
                "lint completed"
            );
            Ok(outcome)
        }
    }
}
