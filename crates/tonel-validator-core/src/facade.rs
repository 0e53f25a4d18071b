use std::path::Path;
use std::sync::Arc;

use tracing::instrument;

use crate::adapter::{self, Invocation, Source};
use crate::engine::EngineFactory;
use crate::normalize::{contain, normalize_lint, normalize_validation, Operation};
use crate::options::ValidationOptions;
use crate::report::{content_length, InputRef, LintReport, ParserKind, ValidationReport};

/// Stateless entry point for every validation and lint operation.
///
/// Each call builds its own engine through the factory and always returns a
/// report; engine errors and panics are folded into the report as faults.
pub struct Validator<F: EngineFactory> {
    engines: Arc<F>,
}

impl<F: EngineFactory> Clone for Validator<F> {
    fn clone(&self) -> Self {
        Self {
            engines: Arc::clone(&self.engines),
        }
    }
}

impl<F: EngineFactory> Validator<F> {
    pub fn new(engines: Arc<F>) -> Self {
        Self { engines }
    }

    #[instrument(name = "validate_file", skip(self), fields(path = %path.display()))]
    pub fn validate_file(&self, path: &Path, options: &ValidationOptions) -> ValidationReport {
        let engines = self.engines.as_ref();
        let result = contain(Operation::Validation, || {
            adapter::validate_source(engines, Source::File(path), options)
        });
        ValidationReport {
            input: InputRef::file(path),
            parser: ParserKind::for_options(options),
            outcome: normalize_validation(Operation::Validation, result),
        }
    }

    #[instrument(
        name = "validate_text",
        skip(self, text),
        fields(content_length = content_length(text))
    )]
    pub fn validate_text(&self, text: &str, options: &ValidationOptions) -> ValidationReport {
        let engines = self.engines.as_ref();
        let result = contain(Operation::Validation, || {
            adapter::validate_source(engines, Source::Text(text), options)
        });
        ValidationReport {
            input: InputRef::text(text),
            parser: ParserKind::for_options(options),
            outcome: normalize_validation(Operation::Validation, result),
        }
    }

    #[instrument(
        name = "validate_method_body",
        skip(self, text),
        fields(content_length = content_length(text))
    )]
    pub fn validate_method_body(&self, text: &str) -> ValidationReport {
        let engines = self.engines.as_ref();
        let result = contain(Operation::MethodValidation, || {
            adapter::validate_method(engines, text).map(Invocation::Completed)
        });
        ValidationReport {
            input: InputRef::text(text),
            parser: ParserKind::SmalltalkMethod,
            outcome: normalize_validation(Operation::MethodValidation, result),
        }
    }

    #[instrument(name = "lint_file", skip(self), fields(path = %path.display()))]
    pub fn lint_file(&self, path: &Path) -> LintReport {
        let engines = self.engines.as_ref();
        let result = contain(Operation::Linting, || {
            adapter::lint_source(engines, Source::File(path))
        });
        LintReport {
            input: InputRef::file(path),
            outcome: normalize_lint(result),
        }
    }

    #[instrument(
        name = "lint_text",
        skip(self, text),
        fields(content_length = content_length(text))
    )]
    pub fn lint_text(&self, text: &str) -> LintReport {
        let engines = self.engines.as_ref();
        let result = contain(Operation::Linting, || {
            adapter::lint_source(engines, Source::Text(text))
        });
        LintReport {
            input: InputRef::text(text),
            outcome: normalize_lint(result),
        }
    }
}
