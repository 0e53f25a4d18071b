//! Tool catalog exposed to agent callers.
//!
//! Maps stable tool names and JSON arguments onto [`Validator`] operations.

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::engine::EngineFactory;
use crate::facade::Validator;
use crate::options::ValidationOptions;
use crate::report::Report;

pub const VALIDATE_FROM_FILE: &str = "validate_tonel_smalltalk_from_file";
pub const VALIDATE: &str = "validate_tonel_smalltalk";
pub const VALIDATE_METHOD_BODY: &str = "validate_smalltalk_method_body";
pub const LINT_FROM_FILE: &str = "lint_tonel_smalltalk_from_file";
pub const LINT: &str = "lint_tonel_smalltalk";

/// Description of one callable tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn options_schema() -> Value {
    json!({
        "type": ["object", "null"],
        "description": "Optional validation options",
        "properties": {
            "without-method-body": {
                "type": "boolean",
                "default": false,
                "description": "If true, only validates the class/method structure"
            }
        }
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// All tools in a stable order.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: VALIDATE_FROM_FILE,
            description: "Validate Tonel formatted Smalltalk source code from a file.",
            input_schema: object_schema(
                json!({
                    "file_path": { "type": "string", "description": "Path to the Tonel file to validate" },
                    "options": options_schema(),
                }),
                &["file_path"],
            ),
        },
        ToolSpec {
            name: VALIDATE,
            description: "Validate Tonel formatted Smalltalk source code from content string.",
            input_schema: object_schema(
                json!({
                    "file_content": { "type": "string", "description": "The Tonel file content as a string" },
                    "options": options_schema(),
                }),
                &["file_content"],
            ),
        },
        ToolSpec {
            name: VALIDATE_METHOD_BODY,
            description: "Validate a Smalltalk method body for syntax correctness.",
            input_schema: object_schema(
                json!({
                    "method_body_content": { "type": "string", "description": "The Smalltalk method body content as a string" },
                }),
                &["method_body_content"],
            ),
        },
        ToolSpec {
            name: LINT_FROM_FILE,
            description: "Lint Tonel formatted Smalltalk source code from a file.",
            input_schema: object_schema(
                json!({
                    "file_path": { "type": "string", "description": "Path to the Tonel file to lint" },
                }),
                &["file_path"],
            ),
        },
        ToolSpec {
            name: LINT,
            description: "Lint Tonel formatted Smalltalk source code from content string.",
            input_schema: object_schema(
                json!({
                    "file_content": { "type": "string", "description": "The Tonel file content as a string" },
                }),
                &["file_content"],
            ),
        },
    ]
}

/// A decoded tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    ValidateFile {
        file_path: PathBuf,
        options: ValidationOptions,
    },
    Validate {
        file_content: String,
        options: ValidationOptions,
    },
    ValidateMethodBody {
        method_body_content: String,
    },
    LintFile {
        file_path: PathBuf,
    },
    Lint {
        file_content: String,
    },
}

#[derive(Deserialize)]
struct FileArgs {
    file_path: PathBuf,
    #[serde(default)]
    options: Option<Value>,
}

#[derive(Deserialize)]
struct ContentArgs {
    file_content: String,
    #[serde(default)]
    options: Option<Value>,
}

#[derive(Deserialize)]
struct MethodBodyArgs {
    method_body_content: String,
}

/// Problems decoding a tool call; these never come from the engine.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other.clone(),
    };
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

impl ToolCall {
    /// Decode `arguments` for the tool called `name`.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        match name {
            VALIDATE_FROM_FILE => {
                let args: FileArgs = decode(name, arguments)?;
                Ok(Self::ValidateFile {
                    file_path: args.file_path,
                    options: ValidationOptions::from_json(args.options.as_ref()),
                })
            }
            VALIDATE => {
                let args: ContentArgs = decode(name, arguments)?;
                Ok(Self::Validate {
                    file_content: args.file_content,
                    options: ValidationOptions::from_json(args.options.as_ref()),
                })
            }
            VALIDATE_METHOD_BODY => {
                let args: MethodBodyArgs = decode(name, arguments)?;
                Ok(Self::ValidateMethodBody {
                    method_body_content: args.method_body_content,
                })
            }
            LINT_FROM_FILE => {
                let args: FileArgs = decode(name, arguments)?;
                Ok(Self::LintFile {
                    file_path: args.file_path,
                })
            }
            LINT => {
                let args: ContentArgs = decode(name, arguments)?;
                Ok(Self::Lint {
                    file_content: args.file_content,
                })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn run<F: EngineFactory>(&self, validator: &Validator<F>) -> Report {
        match self {
            Self::ValidateFile { file_path, options } => {
                validator.validate_file(file_path, options).into()
            }
            Self::Validate {
                file_content,
                options,
            } => validator.validate_text(file_content, options).into(),
            Self::ValidateMethodBody {
                method_body_content,
            } => validator.validate_method_body(method_body_content).into(),
            Self::LintFile { file_path } => validator.lint_file(file_path).into(),
            Self::Lint { file_content } => validator.lint_text(file_content).into(),
        }
    }
}

/// Decode and run a tool call in one step.
pub fn dispatch<F: EngineFactory>(
    validator: &Validator<F>,
    name: &str,
    arguments: &Value,
) -> Result<Report, ToolError> {
    Ok(ToolCall::parse(name, arguments)?.run(validator))
}
