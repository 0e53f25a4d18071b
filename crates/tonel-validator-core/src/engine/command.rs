use std::{
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
};

use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, trace};

use super::{
    EngineError, EngineFactory, EngineSettings, LintOutcome, Linter, MethodBodyParser,
    ParseOutcome, SourceParser,
};

/// Entry points understood by the external engine program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    Structure,
    Full,
    Method,
    Lint,
}

impl Capability {
    fn as_arg(self) -> &'static str {
        match self {
            Self::Structure => "tonel-validate",
            Self::Full => "tonel-full-validate",
            Self::Method => "method-validate",
            Self::Lint => "lint",
        }
    }
}

enum Input<'a> {
    Text(&'a str),
    File(&'a Path),
}

#[derive(Deserialize)]
struct FaultReply {
    kind: String,
    message: String,
}

/// Engine backed by one invocation of an external program per request.
///
/// The program receives `<args...> <capability> [--file <path>]`, reads inline
/// text from stdin and answers with a single JSON document on stdout.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    settings: EngineSettings,
    capability: Capability,
}

impl CommandEngine {
    fn new(settings: EngineSettings, capability: Capability) -> Self {
        Self {
            settings,
            capability,
        }
    }

    fn invoke<T: DeserializeOwned>(&self, input: Input<'_>) -> Result<T, EngineError> {
        let mut command = Command::new(&self.settings.program);
        command.args(&self.settings.args).arg(self.capability.as_arg());
        if let Input::File(path) = &input {
            command.arg("--file").arg(path);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            program = %self.settings.program,
            capability = self.capability.as_arg(),
            "invoking engine"
        );
        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            program: self.settings.program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let (Some(mut stdin), Input::Text(text)) = (stdin, &input) {
                    stdin.write_all(text.as_bytes())?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = output?;
        // A child that exits without draining stdin closes the pipe; its reply still counts.
        if let Err(err) = written {
            trace!(error = %err, "engine did not consume stdin");
        }

        decode_reply(output)
    }
}

fn decode_reply<T: DeserializeOwned>(output: Output) -> Result<T, EngineError> {
    let parsed = serde_json::from_slice::<serde_json::Value>(&output.stdout);
    if let Ok(value) = &parsed {
        if let Some(fault) = value.get("fault") {
            let fault: FaultReply = serde_json::from_value(fault.clone())?;
            return Err(EngineError::raised(fault.kind, fault.message));
        }
    }
    if !output.status.success() {
        return Err(EngineError::Exit {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(serde_json::from_value(parsed?)?)
}

impl SourceParser for CommandEngine {
    fn validate(&mut self, text: &str) -> Result<ParseOutcome, EngineError> {
        self.invoke(Input::Text(text))
    }

    fn validate_from_file(&mut self, path: &Path) -> Result<ParseOutcome, EngineError> {
        self.invoke(Input::File(path))
    }
}

impl MethodBodyParser for CommandEngine {
    fn validate(&mut self, text: &str) -> Result<ParseOutcome, EngineError> {
        self.invoke(Input::Text(text))
    }
}

impl Linter for CommandEngine {
    fn lint(&mut self, text: &str) -> Result<LintOutcome, EngineError> {
        self.invoke(Input::Text(text))
    }

    fn lint_from_file(&mut self, path: &Path) -> Result<LintOutcome, EngineError> {
        self.invoke(Input::File(path))
    }
}

/// Hands out a new [`CommandEngine`] for every request.
#[derive(Debug, Clone, Default)]
pub struct CommandEngineFactory {
    settings: EngineSettings,
}

impl CommandEngineFactory {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl EngineFactory for CommandEngineFactory {
    fn structure_parser(&self) -> Result<Box<dyn SourceParser>, EngineError> {
        Ok(Box::new(CommandEngine::new(
            self.settings.clone(),
            Capability::Structure,
        )))
    }

    fn full_parser(&self) -> Result<Box<dyn SourceParser>, EngineError> {
        Ok(Box::new(CommandEngine::new(
            self.settings.clone(),
            Capability::Full,
        )))
    }

    fn method_parser(&self) -> Result<Box<dyn MethodBodyParser>, EngineError> {
        Ok(Box::new(CommandEngine::new(
            self.settings.clone(),
            Capability::Method,
        )))
    }

    fn linter(&self) -> Result<Box<dyn Linter>, EngineError> {
        Ok(Box::new(CommandEngine::new(
            self.settings.clone(),
            Capability::Lint,
        )))
    }
}
