//! JSON-RPC message framing for the language server transport
//!
//! Every message is a JSON body preceded by a `Content-Length` header and a
//! blank line.

use codepath_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
pub struct Request<'a, P> {
    jsonrpc: &'static str,
    id: i64,
    method: &'a str,
    params: P,
}

impl<'a, P: Serialize> Request<'a, P> {
    pub fn new(id: i64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC notification structure (no id)
#[derive(Debug, Serialize)]
pub struct Notification<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
}

impl<'a, P: Serialize> Notification<'a, P> {
    pub fn new(method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Reply to a server-initiated request
#[derive(Debug, Serialize)]
pub struct Reply {
    jsonrpc: &'static str,
    id: Value,
    result: Value,
}

impl Reply {
    /// A `null` result for request `id`
    pub fn null(id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ResponseError>,
}

/// An incoming message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Reply to one of our requests; a `null` result arrives as `None`
    Response {
        id: Option<i64>,
        result: Option<Value>,
        error: Option<ResponseError>,
    },
    /// Request initiated by the server
    Request { id: Value, method: String },
    Notification { method: String },
}

impl Message {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: RawMessage = serde_json::from_slice(body)?;
        Ok(match (raw.id, raw.method) {
            (Some(id), Some(method)) => Message::Request { id, method },
            (None, Some(method)) => Message::Notification { method },
            (id, None) => Message::Response {
                id: id.and_then(|id| id.as_i64()),
                result: raw.result,
                error: raw.error,
            },
        })
    }
}

/// Reads one framed message body.
///
/// Returns `Ok(None)` when the stream ends before a header starts.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).await? == 0 {
            if saw_header {
                return Err(Error::provider("Connection closed inside message headers"));
            }
            return Ok(None);
        }
        let header = header.trim();
        if header.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let length = value.trim().parse().map_err(|e| {
                    Error::provider(format!("Invalid Content-Length '{}': {e}", value.trim()))
                })?;
                content_length = Some(length);
            }
        }
    }

    let length =
        content_length.ok_or_else(|| Error::provider("No Content-Length in message headers"))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    trace!("Received: {}", String::from_utf8_lossy(&body));
    Ok(Some(body))
}

/// Writes one framed message and flushes
pub async fn write_message<W>(writer: &mut W, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    trace!("Sending: {}", String::from_utf8_lossy(body));
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_reads_consecutive_messages() {
        let mut wire = Vec::new();
        write_message(&mut wire, br#"{"id":1}"#).await.unwrap();
        write_message(&mut wire, br#"{"id":2}"#).await.unwrap();

        let mut reader = BufReader::new(wire.as_slice());
        assert_eq!(read_message(&mut reader).await.unwrap().unwrap(), br#"{"id":1}"#);
        assert_eq!(read_message(&mut reader).await.unwrap().unwrap(), br#"{"id":2}"#);
        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_headers_are_case_insensitive_and_extra_headers_ignored() {
        let wire = b"content-length: 2\r\nContent-Type: application/vscode-jsonrpc\r\n\r\n{}";
        let mut reader = BufReader::new(&wire[..]);
        assert_eq!(read_message(&mut reader).await.unwrap().unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_missing_content_length_is_an_error() {
        let wire = b"Content-Type: x\r\n\r\n{}";
        let mut reader = BufReader::new(&wire[..]);
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("Content-Length"));
    }

    #[test]
    fn test_message_classification() {
        let response = Message::parse(br#"{"jsonrpc":"2.0","id":3,"result":null}"#).unwrap();
        assert_eq!(
            response,
            Message::Response {
                id: Some(3),
                result: None,
                error: None
            }
        );

        let request =
            Message::parse(br#"{"jsonrpc":"2.0","id":"a","method":"workspace/configuration"}"#)
                .unwrap();
        assert_eq!(
            request,
            Message::Request {
                id: json!("a"),
                method: "workspace/configuration".to_string()
            }
        );

        let notification =
            Message::parse(br#"{"jsonrpc":"2.0","method":"window/logMessage","params":{}}"#)
                .unwrap();
        assert_eq!(
            notification,
            Message::Notification {
                method: "window/logMessage".to_string()
            }
        );

        let error = Message::parse(
            br#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"nope"}}"#,
        )
        .unwrap();
        assert!(matches!(error, Message::Response { error: Some(e), .. } if e.code == -32601));
    }

    #[test]
    fn test_reply_serialization() {
        let reply = serde_json::to_value(Reply::null(json!(7))).unwrap();
        assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 7, "result": null}));
    }
}
