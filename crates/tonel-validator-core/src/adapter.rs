use std::path::{Path, PathBuf};

use tracing::debug;

use crate::engine::{EngineError, EngineFactory, LintOutcome, ParseOutcome};
use crate::options::ValidationOptions;

/// Input handed to the engine: a path on disk or inline text.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    File(&'a Path),
    Text(&'a str),
}

/// What happened when the adapter tried to reach the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation<T> {
    /// The file does not exist; the engine was not called.
    MissingInput(PathBuf),
    Completed(T),
}

fn missing_file(source: Source<'_>) -> Option<PathBuf> {
    match source {
        Source::File(path) if !path.exists() => {
            debug!(path = %path.display(), "input file does not exist");
            Some(path.to_path_buf())
        }
        _ => None,
    }
}

/// Run the declaration-format parser selected by `options` against `source`.
///
/// Skipping method bodies selects the structure-only parser; anything else runs
/// the full parser. At most one existence check and one engine call happen.
pub fn validate_source(
    engines: &dyn EngineFactory,
    source: Source<'_>,
    options: &ValidationOptions,
) -> Result<Invocation<ParseOutcome>, EngineError> {
    let structure_only = options.without_method_body;
    if let Some(path) = missing_file(source) {
        return Ok(Invocation::MissingInput(path));
    }
    let mut parser = if structure_only {
        engines.structure_parser()?
    } else {
        engines.full_parser()?
    };
    let outcome = match source {
        Source::File(path) => parser.validate_from_file(path)?,
        Source::Text(text) => parser.validate(text)?,
    };
    Ok(Invocation::Completed(outcome))
}

/// Run the method-body parser; there is no mode to select.
pub fn validate_method(
    engines: &dyn EngineFactory,
    text: &str,
) -> Result<ParseOutcome, EngineError> {
    let mut parser = engines.method_parser()?;
    parser.validate(text)
}

pub fn lint_source(
    engines: &dyn EngineFactory,
    source: Source<'_>,
) -> Result<Invocation<LintOutcome>, EngineError> {
    if let Some(path) = missing_file(source) {
        return Ok(Invocation::MissingInput(path));
    }
    let mut linter = engines.linter()?;
    let outcome = match source {
        Source::File(path) => linter.lint_from_file(path)?,
        Source::Text(text) => linter.lint(text)?,
    };
    Ok(Invocation::Completed(outcome))
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, Script, ScriptedEngines};
    use super::*;

    #[test]
    fn missing_file_never_reaches_engine() {
        let engines = ScriptedEngines::parsing(Script::Reply(ParseOutcome::valid()));
        let result = validate_source(
            &engines,
            Source::File(Path::new("/non/existent/file.st")),
            &ValidationOptions::default(),
        )
        .unwrap();
        assert_eq!(
            result,
            Invocation::MissingInput(PathBuf::from("/non/existent/file.st"))
        );
        assert!(engines.calls().is_empty());
    }

    #[test]
    fn structure_only_selects_structure_parser() {
        let engines = ScriptedEngines::parsing(Script::Reply(ParseOutcome::valid()));
        validate_source(
            &engines,
            Source::Text("Class {}"),
            &ValidationOptions::structure_only(),
        )
        .unwrap();
        assert_eq!(
            engines.calls(),
            vec![
                Call::Build("structure"),
                Call::Validate("structure", "Class {}".into())
            ]
        );
    }

    #[test]
    fn file_source_uses_file_entry_point() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let engines = ScriptedEngines::parsing(Script::Reply(ParseOutcome::valid()));
        validate_source(
            &engines,
            Source::File(temp.path()),
            &ValidationOptions::default(),
        )
        .unwrap();
        assert_eq!(
            engines.calls(),
            vec![
                Call::Build("full"),
                Call::ValidateFile("full", temp.path().display().to_string())
            ]
        );
    }

    #[test]
    fn each_call_builds_a_fresh_engine() {
        let engines = ScriptedEngines::linting(Script::Reply(LintOutcome::default()));
        lint_source(&engines, Source::Text("a")).unwrap();
        lint_source(&engines, Source::Text("b")).unwrap();
        let builds = engines
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Build(_)))
            .count();
        assert_eq!(builds, 2);
    }

    #[test]
    fn engine_errors_propagate_to_caller() {
        let engines = ScriptedEngines::linting(Script::raise("RuntimeError", "boom"));
        let err = lint_source(&engines, Source::Text("x")).unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }
}
