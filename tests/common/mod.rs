// file: tests/common/mod.rs
// description: local stand-in for an OpenAI-compatible embeddings endpoint

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Scripted reply for one request. Once the script runs out every request
/// gets `Embeddings`.
#[derive(Clone, Debug)]
pub enum Reply {
    /// 200 with one vector per input: `[chars, 1.0, position]`, listed in
    /// reverse index order. Like the real endpoint, a request containing an
    /// empty string gets 400 instead.
    Embeddings,
    /// Fixed status and body.
    Status(u16, String),
    /// Close the connection without answering.
    Hangup,
}

#[derive(Clone, Debug)]
pub struct Captured {
    pub headers: String,
    pub body: Value,
}

pub struct FakeApi {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<Captured>>>,
    handle: JoinHandle<()>,
}

impl FakeApi {
    pub async fn start(script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let captured = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let reply = script.get(served).cloned().unwrap_or(Reply::Embeddings);
                served += 1;
                let _ = serve(stream, reply, &captured).await;
            }
        });

        Self {
            base_url: format!("http://{}/v1", addr),
            requests,
            handle,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    reply: Reply,
    captured: &Arc<Mutex<Vec<Captured>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (header_end + content_length).min(buf.len());
    let body: Value = serde_json::from_slice(&buf[header_end..end]).unwrap_or(Value::Null);
    captured.lock().unwrap().push(Captured {
        headers,
        body: body.clone(),
    });

    let (status, payload) = match reply {
        Reply::Hangup => return stream.shutdown().await,
        Reply::Status(status, payload) => (status, payload),
        Reply::Embeddings if has_empty_input(&body) => (
            400,
            json!({"error": {"message": "'$.input' is invalid", "type": "invalid_request_error"}})
                .to_string(),
        ),
        Reply::Embeddings => (200, embeddings_payload(&body)),
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        reason(status),
        payload.len(),
        payload
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn has_empty_input(request: &Value) -> bool {
    request["input"]
        .as_array()
        .is_some_and(|items| items.iter().any(|v| v.as_str() == Some("")))
}

fn embeddings_payload(request: &Value) -> String {
    let inputs: Vec<String> = request["input"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .map(|(index, text)| {
            json!({
                "object": "embedding",
                "index": index,
                "embedding": [text.chars().count() as f64, 1.0, index as f64],
            })
        })
        .collect();
    data.reverse();

    json!({
        "object": "list",
        "data": data,
        "model": request["model"],
        "usage": {"prompt_tokens": 0, "total_tokens": 0},
    })
    .to_string()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
