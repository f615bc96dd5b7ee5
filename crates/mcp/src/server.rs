// MCP server: JSON-RPC 2.0 dispatch over newline-delimited stdio

use crate::framing::{Frame, JsonLinesCodec, MAX_LINE_LENGTH};
use crate::protocol::*;
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::FramedRead;

/// Name reported in the `initialize` handshake
pub const SERVER_NAME: &str = "supabase-app-server";

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    initialized: AtomicBool,
    max_line_length: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            initialized: AtomicBool::new(false),
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    /// Limit the size of one incoming message line
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Whether a client has completed the `initialize` handshake
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn start(self: Arc<Self>) -> Result<()> {
        tracing::info!("MCP server listening on stdio");
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one line-delimited JSON-RPC stream.
    ///
    /// Lifecycle requests are answered in arrival order; `tools/call`
    /// requests run as separate tasks and may complete out of order. A
    /// single writer task owns `writer`. Lines that are not valid UTF-8 or
    /// exceed the length limit get a parse error and are skipped. Returns
    /// once `reader` hits EOF (or fails) and every in-flight call has been
    /// answered.
    pub async fn run<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut lines = FramedRead::new(
            reader,
            JsonLinesCodec::with_max_length(self.max_line_length),
        );
        let mut calls = JoinSet::new();
        let mut read_error = None;

        while let Some(frame) = lines.next().await {
            let line = match frame {
                Ok(Frame::Line(line)) => line,
                Ok(unreadable) => {
                    tracing::warn!(frame = ?unreadable, "Unreadable message line");
                    let _ = tx.send(JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::parse_error(),
                    ));
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Transport read failed");
                    read_error = Some(e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            tracing::debug!(bytes = line.len(), "Received message");

            let request = match parse_request(line) {
                Ok(request) => request,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };

            if request.method == "tools/call" && !request.is_notification() && self.is_initialized()
            {
                let server = self.clone();
                let tx = tx.clone();
                calls.spawn(async move {
                    if let Some(response) = server.handle_request(request).await {
                        let _ = tx.send(response);
                    }
                });
            } else if let Some(response) = self.handle_request(request).await {
                let _ = tx.send(response);
            }

            while let Some(finished) = calls.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "Tool call task failed");
                }
            }
        }

        tracing::info!(in_flight = calls.len(), "Input closed, draining tool calls");
        while let Some(finished) = calls.join_next().await {
            if let Err(e) = finished {
                tracing::error!(error = %e, "Tool call task failed");
            }
        }

        drop(tx);
        writer_task.await.context("Response writer task failed")??;
        tracing::info!("MCP server stopped");

        match read_error {
            Some(e) => Err(anyhow::Error::new(e).context("Failed to read from transport")),
            None => Ok(()),
        }
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match parse_request(line) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => Some(response),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };
        tracing::debug!(method = %request.method, %id, "Handling request");

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" | "tools/call" if !self.is_initialized() => {
                tracing::warn!(method = %request.method, "Request before initialize");
                JsonRpcResponse::error(id, JsonRpcError::not_initialized())
            }
            "tools/list" => JsonRpcResponse::from_serializable(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, request.params).await,
            other => {
                tracing::warn!(method = other, "Unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
            }
        };

        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => tracing::debug!("Client finished initialization"),
            method => tracing::debug!(method, "Ignoring notification"),
        }
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match serde_json::from_value(params.unwrap_or(Value::Null))
        {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid initialize params");
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                );
            }
        };

        let version = negotiate_protocol_version(&params.protocol_version);
        tracing::info!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            requested = %params.protocol_version,
            protocol = version,
            "Client connected"
        );
        self.initialized.store(true, Ordering::SeqCst);

        let result = InitializeResult {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        JsonRpcResponse::from_serializable(id, &result)
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                )
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            tracing::warn!(tool = %params.name, "Unknown tool");
            return JsonRpcResponse::error(id, JsonRpcError::tool_not_found(&params.name));
        };

        let args = match tool.input_schema().validate(params.arguments.as_ref()) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "Rejected tool arguments");
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(e.to_string())
                        .with_data(json!({ "violations": e.violations })),
                );
            }
        };

        tracing::debug!(tool = %params.name, "Calling tool");
        let result = tool.execute(args).await;
        JsonRpcResponse::from_serializable(id, &result)
    }
}

/// Decode one line into a request, or the error response owed for it
fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        tracing::warn!(error = %e, "Malformed JSON-RPC message");
        JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error())
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if value.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        tracing::warn!("Message is not a JSON-RPC 2.0 request");
        return Err(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request("Expected a JSON-RPC 2.0 request object"),
        ));
    }

    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(error = %e, "Invalid JSON-RPC request");
        JsonRpcResponse::error(id, JsonRpcError::invalid_request(e.to_string()))
    })
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut frame = serde_json::to_string(&response).context("Failed to encode response")?;
        frame.push('\n');
        writer
            .write_all(frame.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, InputSchema, ToolArgs};
    use crate::tools::{guarded, Tool};

    struct ShoutTool;

    #[async_trait::async_trait]
    impl Tool for ShoutTool {
        fn name(&self) -> &'static str {
            "shout"
        }

        fn description(&self) -> &'static str {
            "Upper-case a word"
        }

        fn input_schema(&self) -> InputSchema {
            InputSchema::new()
                .field(FieldSpec::string("word", "Word to shout").required())
                .field(FieldSpec::integer("times", "Repetitions").default_value(1))
        }

        async fn execute(&self, args: ToolArgs) -> CallToolResult {
            let word = args.str("word").unwrap_or_default().to_uppercase();
            let times = args.u64("times").unwrap_or(1) as usize;
            guarded("shouting", async move { Ok::<_, anyhow::Error>(word.repeat(times)) }).await
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ShoutTool)).unwrap();
        McpServer::new(registry)
    }

    async fn initialized() -> McpServer {
        let server = server();
        let init = json!({
            "jsonrpc": "2.0", "id": 0, "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "1.0"}
            }
        });
        server.handle_line(&init.to_string()).await.unwrap();
        server
    }

    async fn reply(server: &McpServer, message: Value) -> JsonRpcResponse {
        server.handle_line(&message.to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_echoes_supported_version() {
        let server = server();
        assert!(!server.is_initialized());

        let response = reply(
            &server,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "1.0"}
                }
            }),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_offers_latest_for_unknown_version() {
        let server = server();
        let response = reply(
            &server,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {
                    "protocolVersion": "1999-01-01",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "1.0"}
                }
            }),
        )
        .await;
        assert_eq!(
            response.result.unwrap()["protocolVersion"],
            SUPPORTED_PROTOCOL_VERSIONS[0]
        );
    }

    #[tokio::test]
    async fn test_tools_gated_until_initialized() {
        let server = server();
        for method in ["tools/list", "tools/call"] {
            let response = reply(&server, json!({"jsonrpc": "2.0", "id": 2, "method": method})).await;
            assert_eq!(response.error.unwrap().code, JsonRpcError::NOT_INITIALIZED);
        }
        let ping = reply(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "ping"})).await;
        assert_eq!(ping.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();

        let parse = server.handle_line("{not json").await.unwrap();
        assert_eq!(parse.id, Value::Null);
        assert_eq!(parse.error.unwrap().code, JsonRpcError::PARSE_ERROR);

        let wrong_version = reply(&server, json!({"jsonrpc": "1.0", "id": 4, "method": "ping"})).await;
        assert_eq!(wrong_version.id, json!(4));
        assert_eq!(wrong_version.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let not_object = server.handle_line("[1, 2]").await.unwrap();
        assert_eq!(not_object.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let unknown = reply(&server, json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"})).await;
        assert_eq!(unknown.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let server = server();
        let note = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.handle_line(&note.to_string()).await.is_none());
        let other = json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {}});
        assert!(server.handle_line(&other.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_call_tool_paths() {
        let server = initialized().await;

        let ok = reply(
            &server,
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call",
                   "params": {"name": "shout", "arguments": {"word": "hey", "times": 2, "extra": true}}}),
        )
        .await;
        let result: CallToolResult = serde_json::from_value(ok.result.unwrap()).unwrap();
        assert_eq!(result.first_text(), Some("HEYHEY"));

        let missing = reply(
            &server,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {"name": "whisper"}}),
        )
        .await;
        let error = missing.error.unwrap();
        assert_eq!(error.code, JsonRpcError::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Tool whisper not found");

        let invalid = reply(
            &server,
            json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call",
                   "params": {"name": "shout", "arguments": {"times": -1}}}),
        )
        .await;
        let error = invalid.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
        assert_eq!(error.data.unwrap()["violations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_answers_every_request() {
        let server = Arc::new(initialized().await);
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
            String::new(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "shout", "arguments": {"word": "a"}}})
            .to_string(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}).to_string(),
        ]
        .join("\n");

        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();
        drop(client_write);

        server.run(server_read, server_write).await.unwrap();

        let mut output = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut client_read, &mut output)
            .await
            .unwrap();
        let mut ids: Vec<i64> = output
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].as_i64().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// Pipe raw bytes through `run` and collect the replies in order
    async fn serve_bytes(server: McpServer, input: &[u8]) -> Vec<JsonRpcResponse> {
        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(input).await.unwrap();
        client_write.shutdown().await.unwrap();

        Arc::new(server).run(server_read, server_write).await.unwrap();

        let mut output = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut client_read, &mut output)
            .await
            .unwrap();
        output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn ping(id: i64) -> Vec<u8> {
        let mut line = json!({"jsonrpc": "2.0", "id": id, "method": "ping"})
            .to_string()
            .into_bytes();
        line.push(b'\n');
        line
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_serving() {
        let mut input = ping(1);
        input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 2, \"method\": \"\xff\"}\n");
        input.extend(ping(3));

        let responses = serve_bytes(server(), &input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, json!(1));
        assert_eq!(responses[1].id, Value::Null);
        assert_eq!(
            responses[1].error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
        assert_eq!(responses[2].id, json!(3));
        assert_eq!(responses[2].result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_oversized_line_is_rejected_and_skipped() {
        let mut input = ping(1);
        input.extend(std::iter::repeat(b'x').take(4096));
        input.push(b'\n');
        input.extend(ping(3));

        let responses = serve_bytes(server().with_max_line_length(256), &input).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(
            responses[1].error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
        assert_eq!(responses[2].id, json!(3));
    }

    #[tokio::test]
    async fn test_null_id_gets_a_reply() {
        let server = server();
        let response = reply(&server, json!({"jsonrpc": "2.0", "id": null, "method": "ping"})).await;
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result, Some(json!({})));
    }
}
