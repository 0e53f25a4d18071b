#![cfg(unix)]

use std::{fs, path::PathBuf, sync::Arc};

use insta::assert_json_snapshot;
use serde_json::json;
use tonel_validator_core::{
    CommandEngineFactory, EngineSettings, ValidationOptions, Validator,
};

/// Validator whose engine is the shell script `script`, run via `sh -c`.
fn scripted_validator(script: &str) -> Validator<CommandEngineFactory> {
    Validator::new(Arc::new(CommandEngineFactory::new(EngineSettings {
        program: "sh".into(),
        args: vec!["-c".into(), script.into(), "tonel-engine".into()],
    })))
}

fn fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn rejected_text_keeps_engine_detail_verbatim() {
    let validator = scripted_validator(
        r#"echo '{"ok": false, "error": {"reason": "Syntax error", "line": 3, "error_text": "missing ]", "column": 9}}'"#,
    );
    let report = validator.validate_text("Class { #name : #Broken", &ValidationOptions::default());
    assert_json_snapshot!(report, @r###"
    {
      "valid": false,
      "content_length": 23,
      "parser_type": "full",
      "error": {
        "reason": "Syntax error",
        "line": 3,
        "error_text": "missing ]",
        "column": 9
      }
    }
    "###);
}

#[test]
fn rejection_without_reason_is_passed_through() {
    let validator = scripted_validator(
        r#"cat >/dev/null; echo '{"ok": false, "error": {"message": "bad token", "line": 2}}'"#,
    );
    let report = validator.validate_text("Class {", &ValidationOptions::default());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["valid"], json!(false));
    assert_eq!(value["error"], json!({ "message": "bad token", "line": 2 }));
    assert!(value.get("exception").is_none());
}

#[test]
fn string_rejection_is_passed_through() {
    let validator = scripted_validator(
        r#"cat >/dev/null; echo '{"ok": false, "error": "Unexpected end of input"}'"#,
    );
    let report = validator.validate_method_body("^ self");
    assert_json_snapshot!(report, @r###"
    {
      "valid": false,
      "content_length": 6,
      "parser_type": "smalltalk_method",
      "error": "Unexpected end of input"
    }
    "###);
}

#[test]
fn explicit_nulls_in_rejection_survive() {
    let validator = scripted_validator(
        r#"cat >/dev/null; echo '{"ok": false, "error": {"reason": "r", "line": null, "error_text": null}}'"#,
    );
    let report = validator.validate_text("x", &ValidationOptions::structure_only());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(
        value["error"],
        json!({ "reason": "r", "line": null, "error_text": null })
    );
    assert_eq!(value["parser_type"], json!("tonel_only"));
}

#[test]
fn engine_fault_reply_becomes_exception() {
    let validator = scripted_validator(
        r#"cat >/dev/null; echo '{"fault": {"kind": "RuntimeError", "message": "Content linting error"}}'; exit 1"#,
    );
    let report = validator.lint_text("Test content");
    assert_json_snapshot!(report, @r###"
    {
      "success": false,
      "content_length": 12,
      "issue_list": [],
      "issues_count": 0,
      "warnings_count": 0,
      "errors_count": 0,
      "error": "Linting failed: Content linting error",
      "exception": "RuntimeError"
    }
    "###);
}

#[test]
fn file_lint_reads_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let source = fixture(&dir, "TestClass.class.st", "Class { #name : #testClass }");
    let validator = scripted_validator(
        r#"[ "$1" = "lint" ] && [ "$2" = "--file" ] && [ -f "$3" ] || exit 2
echo '{"issues": [{"severity": "error", "message": "Invalid class name", "line_number": 1}], "warnings": 0, "errors": 1}'"#,
    );
    let report = validator.lint_file(&source);
    assert!(report.is_success());
    assert_eq!(report.issues_count(), 1);
    assert_eq!(report.errors_count(), 1);
}

#[test]
fn malformed_reply_is_a_protocol_fault() {
    let validator = scripted_validator("cat >/dev/null; echo '{\"valid\": maybe}'");
    let report = validator.validate_method_body("^ self name");
    let failure = report.failure().expect("malformed output must fail");
    assert_eq!(failure.exception(), Some("ProtocolError"));
    assert!(failure
        .message()
        .starts_with("Method validation failed: engine produced malformed output"));
}
