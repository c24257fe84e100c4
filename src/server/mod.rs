pub mod rpc;
pub mod tools;

use crate::client::{EventTransport, MonitorClient};
use rpc::{RpcRequest, RpcResponse};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2025-06-18";

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// MCP server speaking newline-delimited JSON-RPC 2.0 on stdin/stdout.
///
/// `client` is `None` until a base URL is configured; in that state every
/// tool call fails with a fixed "client not initialized" message while the
/// protocol itself keeps working.
pub struct McpServer<T: EventTransport + 'static> {
    client: Option<MonitorClient<T>>,
}

impl<T: EventTransport + 'static> McpServer<T> {
    pub fn new(client: Option<MonitorClient<T>>) -> Self {
        Self { client }
    }

    /// Reads requests line by line until stdin closes. Logging goes to
    /// stderr; stdout carries protocol frames only.
    pub async fn run(&self) -> Result<(), ServeError> {
        let stdin = BufReader::new(io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = io::stdout();

        info!("MCP stdio server ready");
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(trimmed).await {
                let encoded = serde_json::to_string(&response)
                    .unwrap_or_else(|err| format!(r#"{{"jsonrpc":"2.0","error":{{"code":-32603,"message":"{err}"}},"id":null}}"#));
                stdout.write_all(encoded.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        info!("stdin closed, shutting down");

        if let Some(client) = &self.client {
            client.disconnect().await;
        }
        Ok(())
    }

    /// `None` means the message was a notification and gets no response.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let request: RpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "received invalid JSON-RPC frame");
                return Some(RpcResponse::error(
                    None,
                    -32700,
                    format!("Parse error: {err}"),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(RpcResponse::invalid_request(
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        debug!(method = %request.method, "received JSON-RPC request");
        let method = request.method.clone();
        match method.as_str() {
            "initialize" => Some(self.handle_initialize(&request)),
            "notifications/initialized" | "notifications/cancelled" => None,
            "ping" => Some(RpcResponse::success(request.id, json!({}))),
            "tools/list" => Some(RpcResponse::success(
                request.id,
                json!({ "tools": tools::catalog() }),
            )),
            "tools/call" => Some(self.handle_tool_call(request).await),
            other => {
                if request.id.is_some() {
                    warn!(method = other, "unknown JSON-RPC method");
                    Some(RpcResponse::method_not_found(request.id, other))
                } else {
                    debug!(method = other, "ignoring unknown notification");
                    None
                }
            }
        }
    }

    fn handle_initialize(&self, request: &RpcRequest) -> RpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);

        RpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": requested,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        )
    }

    async fn handle_tool_call(&self, request: RpcRequest) -> RpcResponse {
        let Some(Value::Object(params)) = &request.params else {
            return RpcResponse::invalid_params(request.id, "params must be an object");
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::invalid_params(request.id, "params.name must be a string");
        };

        let arguments = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            None | Some(Value::Null) => Default::default(),
            Some(_) => {
                return RpcResponse::invalid_params(
                    request.id,
                    "params.arguments must be an object",
                );
            }
        };

        let result = tools::dispatch(self.client.as_ref(), name, &arguments).await;
        match serde_json::to_value(&result) {
            Ok(value) => RpcResponse::success(request.id, value),
            Err(err) => RpcResponse::error(request.id, -32603, err.to_string()),
        }
    }
}
