//! Async client for a language server over stdio
//!
//! A background task owns the read half of the connection. It routes each
//! response to the request waiting on its id, answers server-initiated
//! requests with a `null` result and skips notifications. Writers share the
//! write half behind a lock that is held for one message at a time.

use crate::jsonrpc::{read_message, write_message, Message, Notification, Reply, Request, ResponseError};
use codepath_core::error::{Error, Result};
use codepath_core::{path_to_uri, Document, ProviderConfig};
use lsp_types::{
    ClientCapabilities, DidOpenTextDocumentParams, DocumentSymbol, DocumentSymbolClientCapabilities,
    DocumentSymbolParams, DocumentSymbolResponse, GotoCapability, GotoDefinitionParams,
    GotoDefinitionResponse, InitializeParams, InitializeResult, Location, Position,
    SemanticTokenType, SemanticTokens, SemanticTokensClientCapabilities,
    SemanticTokensClientCapabilitiesRequests, SemanticTokensFullOptions, SemanticTokensParams,
    SemanticTokensResult, SemanticTokensServerCapabilities, SymbolInformation,
    TextDocumentClientCapabilities, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, TokenFormat, WorkspaceFolder,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Arc<tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// `result` and `error` members of a response
type Outcome = (Option<Value>, Option<ResponseError>);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Requests awaiting a response, keyed by id
#[derive(Default)]
struct Pending {
    waiting: Mutex<HashMap<i64, oneshot::Sender<Outcome>>>,
    closed: AtomicBool,
}

impl Pending {
    /// Registers `id`; fails once the connection has closed
    fn register(&self, id: i64) -> Result<oneshot::Receiver<Outcome>> {
        let (tx, rx) = oneshot::channel();
        lock(&self.waiting).insert(id, tx);
        if self.closed.load(Ordering::SeqCst) {
            self.forget(id);
            return Err(Error::provider("Language server closed the connection"));
        }
        Ok(rx)
    }

    fn forget(&self, id: i64) {
        lock(&self.waiting).remove(&id);
    }

    fn complete(&self, id: i64, outcome: Outcome) {
        match lock(&self.waiting).remove(&id) {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => debug!("Discarding response for request {id} with no waiter"),
        }
    }

    /// Fails every waiter and all later registrations
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.waiting).clear();
    }
}

async fn send(writer: &Writer, body: &[u8]) -> Result<()> {
    let mut writer = writer.lock().await;
    write_message(&mut *writer, body).await
}

/// Reads messages until the connection closes
async fn read_loop(mut reader: Reader, writer: Writer, pending: Arc<Pending>) {
    loop {
        let body = match read_message(&mut reader).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("Language server closed its output");
                break;
            }
            Err(e) => {
                warn!("Language server connection failed: {e}");
                break;
            }
        };
        let message = match Message::parse(&body) {
            Ok(message) => message,
            Err(e) => {
                debug!("Skipping unparseable message: {e}");
                continue;
            }
        };

        match message {
            Message::Response {
                id: Some(id),
                result,
                error,
            } => pending.complete(id, (result, error)),
            Message::Response { id: None, .. } => {
                debug!("Discarding response without an id");
            }
            Message::Request { id, method } => {
                trace!("Answering server request {method} with null");
                let reply = match serde_json::to_vec(&Reply::null(id)) {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("Failed to encode reply to {method}: {e}");
                        continue;
                    }
                };
                if let Err(e) = send(&writer, &reply).await {
                    warn!("Failed to answer server request {method}: {e}");
                }
            }
            Message::Notification { method } => {
                trace!("Skipping notification {method}");
            }
        }
    }
    pending.close();
}

/// Client for communicating with a Language Server Protocol server
pub struct LspClient {
    writer: Writer,
    pending: Arc<Pending>,
    reader_task: JoinHandle<()>,
    child: tokio::sync::Mutex<Option<Child>>,
    request_id: AtomicI64,
    request_timeout: Duration,
    opened_files: Mutex<HashSet<String>>,
    legend: OnceLock<Vec<String>>,
}

impl LspClient {
    /// Client over an arbitrary byte stream pair.
    ///
    /// Must be called from within a Tokio runtime; the read half is driven by
    /// a spawned task that stops when the client is dropped.
    pub fn new<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: Writer = Arc::new(tokio::sync::Mutex::new(Box::new(writer)));
        let pending = Arc::new(Pending::default());
        let reader_task = tokio::spawn(read_loop(
            Box::new(reader),
            Arc::clone(&writer),
            Arc::clone(&pending),
        ));

        Self {
            writer,
            pending,
            reader_task,
            child: tokio::sync::Mutex::new(None),
            request_id: AtomicI64::new(0),
            request_timeout,
            opened_files: Mutex::new(HashSet::new()),
            legend: OnceLock::new(),
        }
    }

    /// Spawns the configured server in `workspace_root` and initializes it
    pub async fn spawn(config: &ProviderConfig, workspace_root: &Path) -> Result<Self> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| Error::config("provider.command must not be empty"))?;

        debug!("Spawning language server: {:?}", config.command);
        let mut child = Command::new(program)
            .args(args)
            .current_dir(workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::provider(format!("Failed to spawn language server {program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::provider("Failed to get stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::provider("Failed to get stdout"))?;

        let client = Self::new(
            BufReader::new(stdout),
            stdin,
            Duration::from_secs(config.request_timeout_secs),
        );
        *client.child.lock().await = Some(child);

        client
            .initialize(workspace_root, config.initialization_options.clone())
            .await?;
        Ok(client)
    }

    /// Runs the `initialize` handshake and records the semantic token legend
    pub async fn initialize(
        &self,
        workspace_root: &Path,
        init_options: Option<Value>,
    ) -> Result<InitializeResult> {
        let root_uri = path_to_uri(workspace_root)?;
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: root_uri,
                name: workspace_root
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("workspace")
                    .to_string(),
            }]),
            capabilities: Self::client_capabilities(),
            initialization_options: init_options,
            ..Default::default()
        };

        let result: InitializeResult = self.request("initialize", params).await?;
        let legend = semantic_token_legend(&result);
        debug!("Semantic token legend has {} types", legend.len());
        let _ = self.legend.set(legend);

        self.notify("initialized", serde_json::json!({})).await?;
        info!(
            "Language server initialized: {}",
            result
                .server_info
                .as_ref()
                .map(|info| info.name.as_str())
                .unwrap_or("unknown")
        );
        Ok(result)
    }

    fn client_capabilities() -> ClientCapabilities {
        ClientCapabilities {
            text_document: Some(TextDocumentClientCapabilities {
                definition: Some(GotoCapability {
                    dynamic_registration: Some(false),
                    link_support: Some(true),
                }),
                document_symbol: Some(DocumentSymbolClientCapabilities {
                    dynamic_registration: Some(false),
                    hierarchical_document_symbol_support: Some(true),
                    ..Default::default()
                }),
                semantic_tokens: Some(SemanticTokensClientCapabilities {
                    dynamic_registration: Some(false),
                    requests: SemanticTokensClientCapabilitiesRequests {
                        range: Some(false),
                        full: Some(SemanticTokensFullOptions::Bool(true)),
                    },
                    token_types: vec![
                        SemanticTokenType::NAMESPACE,
                        SemanticTokenType::CLASS,
                        SemanticTokenType::METHOD,
                        SemanticTokenType::FUNCTION,
                        SemanticTokenType::VARIABLE,
                    ],
                    formats: vec![TokenFormat::RELATIVE],
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Sends a request and waits for its response.
    ///
    /// The timeout covers only the wait for the response, not queueing for
    /// the write half. A response arriving after the timeout is discarded.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let body = serde_json::to_vec(&Request::new(id, method, params))?;

        let response = self.pending.register(id)?;
        if let Err(e) = send(&self.writer, &body).await {
            self.pending.forget(id);
            return Err(e);
        }

        let (result, error) = match tokio::time::timeout(self.request_timeout, response).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => return Err(Error::provider("Language server closed the connection")),
            Err(_) => {
                self.pending.forget(id);
                return Err(Error::provider(format!(
                    "LSP request {method} timed out after {}ms",
                    self.request_timeout.as_millis()
                )));
            }
        };

        if let Some(error) = error {
            return Err(Error::provider(format!(
                "LSP error {} in {method}: {}",
                error.code, error.message
            )));
        }

        Ok(serde_json::from_value(result.unwrap_or(Value::Null))?)
    }

    /// Sends a notification (no response expected)
    pub async fn notify<P: Serialize + Send>(&self, method: &str, params: P) -> Result<()> {
        let body = serde_json::to_vec(&Notification::new(method, params))?;
        send(&self.writer, &body).await
    }

    /// Legend recorded during `initialize`; empty when the server has none
    pub fn legend(&self) -> Vec<String> {
        self.legend.get().cloned().unwrap_or_default()
    }

    /// Opens `document` on the server once; later calls are no-ops
    pub async fn open_document(&self, document: &Document, language_id: &str) -> Result<()> {
        let uri = document.uri().as_str().to_string();
        let newly_opened = lock(&self.opened_files).insert(uri.clone());
        if !newly_opened {
            return Ok(());
        }

        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: document.uri().clone(),
                language_id: language_id.to_string(),
                version: 1,
                text: document.text().to_string(),
            },
        };
        if let Err(e) = self.notify("textDocument/didOpen", params).await {
            lock(&self.opened_files).remove(&uri);
            return Err(e);
        }
        Ok(())
    }

    /// Hierarchical symbols of an open document; flat answers become childless symbols
    pub async fn document_symbols(&self, document: &Document) -> Result<Option<Vec<DocumentSymbol>>> {
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier {
                uri: document.uri().clone(),
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };

        let response: Option<DocumentSymbolResponse> =
            self.request("textDocument/documentSymbol", params).await?;

        Ok(response.map(|response| match response {
            DocumentSymbolResponse::Nested(symbols) => symbols,
            DocumentSymbolResponse::Flat(symbols) => {
                symbols.into_iter().map(flat_to_document_symbol).collect()
            }
        }))
    }

    /// Full-document semantic tokens; partial results are accepted
    pub async fn semantic_tokens_full(&self, document: &Document) -> Result<Option<SemanticTokens>> {
        let params = SemanticTokensParams {
            text_document: TextDocumentIdentifier {
                uri: document.uri().clone(),
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };

        let response: Option<SemanticTokensResult> =
            self.request("textDocument/semanticTokens/full", params).await?;

        Ok(response.map(|response| match response {
            SemanticTokensResult::Tokens(tokens) => tokens,
            SemanticTokensResult::Partial(partial) => SemanticTokens {
                result_id: None,
                data: partial.data,
            },
        }))
    }

    /// Go to definition at the given position, normalized to locations
    pub async fn goto_definition(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Option<Vec<Location>>> {
        let params = GotoDefinitionParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier {
                    uri: document.uri().clone(),
                },
                position,
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };

        let response: Option<GotoDefinitionResponse> =
            self.request("textDocument/definition", params).await?;

        Ok(response.map(|response| match response {
            GotoDefinitionResponse::Scalar(location) => vec![location],
            GotoDefinitionResponse::Array(locations) => locations,
            GotoDefinitionResponse::Link(links) => links
                .into_iter()
                .map(|link| Location {
                    uri: link.target_uri,
                    range: link.target_selection_range,
                })
                .collect(),
        }))
    }

    /// Shuts the server down gracefully
    pub async fn shutdown(&self) -> Result<()> {
        let _: Value = self.request("shutdown", Value::Null).await?;
        self.notify("exit", Value::Null).await?;

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(self.request_timeout, child.wait()).await {
                Ok(status) => debug!("Language server exited: {:?}", status?),
                Err(_) => {
                    warn!("Language server did not exit after shutdown; killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

fn semantic_token_legend(result: &InitializeResult) -> Vec<String> {
    let legend = match &result.capabilities.semantic_tokens_provider {
        Some(SemanticTokensServerCapabilities::SemanticTokensOptions(options)) => &options.legend,
        Some(SemanticTokensServerCapabilities::SemanticTokensRegistrationOptions(options)) => {
            &options.semantic_tokens_options.legend
        }
        None => return Vec::new(),
    };
    legend
        .token_types
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

#[allow(deprecated)]
fn flat_to_document_symbol(symbol: SymbolInformation) -> DocumentSymbol {
    DocumentSymbol {
        name: symbol.name,
        detail: None,
        kind: symbol.kind,
        tags: symbol.tags,
        deprecated: None,
        range: symbol.location.range,
        selection_range: symbol.location.range,
        children: None,
    }
}

/// In-process scripted server for tests
#[cfg(test)]
pub(crate) mod test_server {
    #![allow(clippy::expect_used)]

    use super::LspClient;
    use crate::jsonrpc::{read_message, write_message};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{split, BufReader};

    pub(crate) type Received = Arc<Mutex<Vec<Value>>>;

    /// Success response to `request`
    pub(crate) fn respond(request: &Value, result: Value) -> Value {
        json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
    }

    /// Connects a client to a server that answers each incoming request with
    /// the messages `handler` returns; notifications and replies are only
    /// recorded.
    pub(crate) fn connect<F>(handler: F, timeout: Duration) -> (LspClient, Received)
    where
        F: Fn(&Value) -> Vec<Value> + Send + 'static,
    {
        let (client_end, server_end) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = split(client_end);
        let (server_read, mut server_write) = split(server_end);
        let received: Received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        tokio::spawn(async move {
            let mut reader = BufReader::new(server_read);
            while let Ok(Some(body)) = read_message(&mut reader).await {
                let message: Value = serde_json::from_slice(&body).expect("valid json");
                log.lock().expect("lock").push(message.clone());
                if message.get("method").is_none() || message.get("id").is_none() {
                    continue;
                }
                for reply in handler(&message) {
                    let bytes = serde_json::to_vec(&reply).expect("serializable");
                    if write_message(&mut server_write, &bytes).await.is_err() {
                        return;
                    }
                }
            }
        });

        (
            LspClient::new(BufReader::new(client_read), client_write, timeout),
            received,
        )
    }
}
