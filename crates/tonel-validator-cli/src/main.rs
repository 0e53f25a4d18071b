use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tonel_validator_core::{
    render_report, tools, CommandEngineFactory, Failure, InputRef, OutputFormat, ParserKind,
    Report, ValidationOptions, ValidationReport, Validator,
};
use tracing_subscriber::EnvFilter;

mod server;
mod settings;

#[derive(Parser, Debug)]
#[command(
    name = "tonel-validator",
    author,
    version,
    about = "Validation and linting tools for Tonel Smalltalk sources"
)]
struct Cli {
    /// Configuration file with an `[engine]` section (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Engine executable, overriding configuration and environment
    #[arg(long, value_name = "PROGRAM", global = true)]
    engine: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the validation tools over stdio (default)
    Serve,
    /// Validate a Tonel source file, or stdin when no file is given
    Validate {
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        /// Only check class/method structure, skip method bodies
        #[arg(long)]
        without_method_body: bool,
        /// Emit the report as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Validate a single Smalltalk method body
    ValidateMethod {
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Lint a Tonel source file, or stdin when no file is given
    Lint {
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List the tools offered by `serve`
    ListTools {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let engine_settings =
        settings::load_engine_settings(cli.config.as_deref(), cli.engine.as_deref())?;
    let validator = Validator::new(Arc::new(CommandEngineFactory::new(engine_settings)));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => server::serve_stdio(validator).await?,
        Commands::Validate {
            file,
            without_method_body,
            json,
        } => {
            let options = ValidationOptions {
                without_method_body,
            };
            let report = match file {
                Some(path) => validator.validate_file(&path, &options),
                None => validator.validate_text(&read_stdin()?, &options),
            };
            print_report(&Report::from(report), json)?;
        }
        Commands::ValidateMethod { file, json } => {
            let report = match file {
                Some(path) if !path.exists() => missing_method_file(path),
                Some(path) => validator.validate_method_body(&read_file(&path)?),
                None => validator.validate_method_body(&read_stdin()?),
            };
            print_report(&Report::from(report), json)?;
        }
        Commands::Lint { file, json } => {
            let report = match file {
                Some(path) => validator.lint_file(&path),
                None => validator.lint_text(&read_stdin()?),
            };
            print_report(&Report::from(report), json)?;
        }
        Commands::ListTools { json } => list_tools(json)?,
    }
    Ok(())
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    print!("{}", render_report(report, format)?);
    if json {
        println!();
    }
    Ok(())
}

fn list_tools(json: bool) -> Result<()> {
    let catalog = tools::catalog();
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }
    println!("{} tool(s) available", catalog.len());
    for tool in catalog {
        println!("- {name:<36} {desc}", name = tool.name, desc = tool.description);
    }
    Ok(())
}

/// Method bodies are validated from text, so a missing file is reported here.
fn missing_method_file(path: PathBuf) -> ValidationReport {
    ValidationReport {
        input: InputRef::File(path.clone()),
        parser: ParserKind::SmalltalkMethod,
        outcome: Err(Failure::MissingInput(path)),
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read source from stdin")?;
    Ok(buffer)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
