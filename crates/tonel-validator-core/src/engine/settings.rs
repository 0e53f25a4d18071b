use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where to find the external parser/linter program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "EngineSettings::default_program")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            args: Vec::new(),
        }
    }
}

impl EngineSettings {
    pub const PROGRAM_ENV: &'static str = "TONEL_VALIDATOR_ENGINE";
    pub const ARGS_ENV: &'static str = "TONEL_VALIDATOR_ENGINE_ARGS";
    const DEFAULT_PROGRAM: &'static str = "tonel-engine";

    fn default_program() -> String {
        Self::DEFAULT_PROGRAM.to_string()
    }

    /// Overlay values present in the environment on top of `self`.
    ///
    /// * `TONEL_VALIDATOR_ENGINE`: engine executable, blank values are ignored.
    /// * `TONEL_VALIDATOR_ENGINE_ARGS`: whitespace-separated leading arguments.
    pub fn with_env_overrides(self) -> Self {
        self.overlay(std::env::vars().collect())
    }

    fn overlay(mut self, vars: HashMap<String, String>) -> Self {
        if let Some(program) = vars
            .get(Self::PROGRAM_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
        {
            self.program = program.to_string();
        }
        if let Some(args) = vars.get(Self::ARGS_ENV) {
            self.args = args.split_whitespace().map(str::to_string).collect();
        }
        self
    }
}
