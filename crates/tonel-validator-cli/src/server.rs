//! Newline-delimited JSON-RPC 2.0 tool server over stdio.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tonel_validator_core::{tools, EngineFactory, ToolError, Validator};
use tracing::{debug, info, warn};

const SERVER_NAME: &str = "tonel-validator";
const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

/// Serve requests from stdin until it closes or the process is interrupted.
pub async fn serve_stdio<F>(validator: Validator<F>) -> Result<()>
where
    F: EngineFactory + 'static,
{
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    info!("serving tools on stdio");
    tokio::select! {
        result = serve(validator, reader, writer) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    }
}

/// Process one request per line from `reader`, answering on `writer`.
pub async fn serve<F, R, W>(validator: Validator<F>, reader: R, mut writer: W) -> Result<()>
where
    F: EngineFactory + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = handle_line(&validator, &line).await else {
            continue;
        };
        let mut bytes = serde_json::to_vec(&response)?;
        bytes.push(b'\n');
        writer
            .write_all(&bytes)
            .await
            .context("failed to write response")?;
        writer.flush().await?;
    }
    debug!("input closed");
    Ok(())
}

async fn handle_line<F>(validator: &Validator<F>, line: &str) -> Option<Value>
where
    F: EngineFactory + 'static,
{
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "discarding malformed request");
            return Some(failure(Value::Null, PARSE_ERROR, err.to_string()));
        }
    };
    if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        return request
            .id
            .map(|id| failure(id, INVALID_REQUEST, "unsupported jsonrpc version"));
    }

    debug!(method = %request.method, "request received");
    let outcome = dispatch(validator, &request.method, request.params).await;
    // Notifications carry no id and never get an answer.
    let id = request.id?;
    Some(match outcome {
        Ok(result) => success(id, result),
        Err((code, message)) => failure(id, code, message),
    })
}

async fn dispatch<F>(
    validator: &Validator<F>,
    method: &str,
    params: Value,
) -> Result<Value, (i64, String)>
where
    F: EngineFactory + 'static,
{
    match method {
        "initialize" => {
            let protocol = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            Ok(json!({
                "protocolVersion": protocol,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
            }))
        }
        "notifications/initialized" | "initialized" | "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tools::catalog() })),
        "tools/call" => call_tool(validator, params).await,
        other => Err((METHOD_NOT_FOUND, format!("method `{other}` not found"))),
    }
}

async fn call_tool<F>(validator: &Validator<F>, params: Value) -> Result<Value, (i64, String)>
where
    F: EngineFactory + 'static,
{
    let params: CallParams =
        serde_json::from_value(params).map_err(|err| (INVALID_PARAMS, err.to_string()))?;
    let call = tools::ToolCall::parse(&params.name, &params.arguments).map_err(|err| {
        let code = match err {
            ToolError::UnknownTool(_) => METHOD_NOT_FOUND,
            _ => INVALID_PARAMS,
        };
        (code, err.to_string())
    })?;

    let validator = validator.clone();
    let report = tokio::task::spawn_blocking(move || call.run(&validator))
        .await
        .map_err(|err| (INTERNAL_ERROR, format!("tool task failed: {err}")))?;
    let structured = report
        .to_value()
        .map_err(|err| (INTERNAL_ERROR, err.to_string()))?;
    // Serialized from the report itself so the text keeps report key order.
    let text =
        serde_json::to_string_pretty(&report).map_err(|err| (INTERNAL_ERROR, err.to_string()))?;

    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
        "isError": false,
    }))
}
