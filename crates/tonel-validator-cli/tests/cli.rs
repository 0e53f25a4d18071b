use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::path::Path;

fn validator_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tonel-validator").unwrap();
    cmd.env_remove("TONEL_VALIDATOR_ENGINE")
        .env_remove("TONEL_VALIDATOR_ENGINE_ARGS");
    cmd
}

/// Write a config pointing the engine at `sh <script>`.
fn sh_engine_config(dir: &Path, script: &str) -> std::path::PathBuf {
    let script_path = dir.join("engine.sh");
    write(&script_path, script).unwrap();
    let config_path = dir.join("validator.toml");
    write(
        &config_path,
        format!(
            "[engine]\nprogram = \"sh\"\nargs = [\"{}\"]\n",
            script_path.display()
        ),
    )
    .unwrap();
    config_path
}

#[test]
fn validate_missing_file_reports_not_found() {
    validator_cmd()
        .args(["validate", "--file", "/non/existent/file.st", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("File not found: /non/existent/file.st"))
        .stdout(predicate::str::contains("exception").not());
}

#[test]
fn validate_method_missing_file_is_a_report() {
    validator_cmd()
        .args(["validate-method", "--file", "/non/existent/body.st", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": false"))
        .stdout(predicate::str::contains("\"file_path\": \"/non/existent/body.st\""))
        .stdout(predicate::str::contains("\"parser_type\": \"smalltalk_method\""))
        .stdout(predicate::str::contains("File not found: /non/existent/body.st"));
}

#[test]
fn unreachable_engine_is_reported_as_fault() {
    validator_cmd()
        .args(["--engine", "/nonexistent/tonel-engine", "validate", "--json"])
        .write_stdin("Class { #name : #TestClass }")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exception\": \"SpawnError\""))
        .stdout(predicate::str::contains("Validation failed: failed to launch engine"));
}

#[cfg(unix)]
#[test]
fn lint_from_stdin_with_configured_engine() {
    let dir = tempfile::tempdir().unwrap();
    let config = sh_engine_config(
        dir.path(),
        "cat >/dev/null\necho '{\"issues\": [{\"severity\": \"warning\", \"message\": \"Long method detected\", \"line_number\": 5}], \"warnings\": 1, \"errors\": 0}'\n",
    );
    validator_cmd()
        .args(["--config", config.to_str().unwrap(), "lint", "--json"])
        .write_stdin("Class { #name : #TestClass }")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"issues_count\": 1"))
        .stdout(predicate::str::contains("\"warnings_count\": 1"))
        .stdout(predicate::str::contains("Long method detected"));
}

#[cfg(unix)]
#[test]
fn structure_only_validation_uses_structure_capability() {
    let dir = tempfile::tempdir().unwrap();
    let config = sh_engine_config(
        dir.path(),
        "if [ \"$1\" = \"tonel-validate\" ]; then echo '{\"ok\": true}'; else echo '{\"ok\": false, \"error\": {\"reason\": \"wrong parser\"}}'; fi\n",
    );
    let source = dir.path().join("TestClass.class.st");
    write(&source, "Class { #name : #TestClass }").unwrap();
    validator_cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "validate",
            "--file",
            source.to_str().unwrap(),
            "--without-method-body",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Parser: tonel_only"))
        .stdout(predicate::str::contains("Valid: yes"));
}

#[test]
fn list_tools_names_every_tool() {
    validator_cmd()
        .args(["list-tools"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 tool(s) available"))
        .stdout(predicate::str::contains("validate_tonel_smalltalk_from_file"))
        .stdout(predicate::str::contains("lint_tonel_smalltalk"));
}
