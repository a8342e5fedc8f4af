use std::time::Duration;

use clap::ValueEnum;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::error::{EngineError, EngineResult};

/// Anything that can turn a prompt into generated text.
pub trait StoryModel {
    fn complete(&self, prompt: &str) -> EngineResult<String>;
}

/// Which HTTP API the local model server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Ollama native API (`/api/generate`)
    Ollama,
    /// OpenAI-compatible chat completions (LM Studio, llama.cpp server, ...)
    Openai,
}

impl Backend {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::Ollama => "http://localhost:11434",
            Backend::Openai => "http://localhost:1234",
        }
    }

    fn generate_path(&self) -> &'static str {
        match self {
            Backend::Ollama => "/api/generate",
            Backend::Openai => "/v1/chat/completions",
        }
    }

    fn models_path(&self) -> &'static str {
        match self {
            Backend::Ollama => "/api/tags",
            Backend::Openai => "/v1/models",
        }
    }
}

/* =========================
   Ollama wire types
   ========================= */

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/* =========================
   OpenAI-compatible wire types
   ========================= */

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for a locally hosted model server.
pub struct LlmClient {
    http: Client,
    backend: Backend,
    base_url: String,
    model: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(
        backend: Backend,
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> EngineResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            backend,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the server for its model list and summarize it.
    pub fn test_connection(&self) -> EngineResult<String> {
        let url = self.url(self.backend.models_path());
        let resp = self.http.get(&url).send()?;
        let body = read_success_body(resp)?;
        let value: serde_json::Value = serde_json::from_str(&body)?;

        let key = match self.backend {
            Backend::Ollama => "models",
            Backend::Openai => "data",
        };
        let count = value[key].as_array().map(|a| a.len()).unwrap_or(0);

        info!(%url, count, "model server reachable");
        Ok(format!(
            "Connected to {} ({} models available)",
            self.base_url, count
        ))
    }

    fn call_ollama(&self, prompt: &str) -> EngineResult<String> {
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let resp = self
            .http
            .post(self.url(self.backend.generate_path()))
            .json(&req)
            .send()?;
        let body = read_success_body(resp)?;
        let parsed: GenerateResponse = serde_json::from_str(&body)?;

        Ok(parsed.response)
    }

    fn call_openai(&self, prompt: &str) -> EngineResult<String> {
        let req = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(self.url(self.backend.generate_path()))
            .json(&req)
            .send()?;
        let body = read_success_body(resp)?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(EngineError::EmptyResponse)
    }
}

impl StoryModel for LlmClient {
    fn complete(&self, prompt: &str) -> EngineResult<String> {
        debug!(
            backend = ?self.backend,
            model = %self.model,
            prompt_chars = prompt.len(),
            "sending prompt"
        );

        let text = match self.backend {
            Backend::Ollama => self.call_ollama(prompt)?,
            Backend::Openai => self.call_openai(prompt)?,
        };

        if text.trim().is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        debug!(reply_chars = text.len(), "model replied");
        Ok(text)
    }
}

fn read_success_body(resp: reqwest::blocking::Response) -> EngineResult<String> {
    let status = resp.status();
    let body = resp.text()?;

    if !status.is_success() {
        return Err(EngineError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve exactly one HTTP response and hand back the raw request line and body.
    fn one_shot_server(status: &str, body: &str) -> (String, mpsc::Receiver<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        let status = status.to_string();
        let body = body.to_string();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }

            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            tx.send((
                request_line.trim_end().to_string(),
                String::from_utf8(request_body).unwrap(),
            ))
            .unwrap();
        });

        (format!("http://{}", addr), rx)
    }

    fn client(backend: Backend, base_url: &str) -> LlmClient {
        LlmClient::new(backend, base_url, "llama3.2", 0.7, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn ollama_generate_round_trip() {
        let (base, rx) = one_shot_server("200 OK", r#"{"model":"llama3.2","response":"Once upon a time","done":true}"#);

        let text = client(Backend::Ollama, &base).complete("Tell a story").unwrap();
        assert_eq!(text, "Once upon a time");

        let (request_line, body) = rx.recv().unwrap();
        assert!(request_line.starts_with("POST /api/generate"));
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["model"], "llama3.2");
        assert_eq!(sent["prompt"], "Tell a story");
        assert_eq!(sent["stream"], false);
    }

    #[test]
    fn openai_chat_round_trip() {
        let (base, rx) = one_shot_server(
            "200 OK",
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"The gate creaks."}}]}"#,
        );

        let text = client(Backend::Openai, &format!("{}/", base))
            .complete("Continue")
            .unwrap();
        assert_eq!(text, "The gate creaks.");

        let (request_line, body) = rx.recv().unwrap();
        assert!(request_line.starts_with("POST /v1/chat/completions"));
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][0]["content"], "Continue");
    }

    #[test]
    fn error_status_is_reported_with_body() {
        let (base, _rx) = one_shot_server("404 Not Found", r#"{"error":"model 'llama3.2' not found"}"#);

        let err = client(Backend::Ollama, &base).complete("x").unwrap_err();
        match err {
            EngineError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_reply_is_an_error() {
        let (base, _rx) = one_shot_server("200 OK", r#"{"choices":[]}"#);

        let err = client(Backend::Openai, &base).complete("x").unwrap_err();
        assert!(matches!(err, EngineError::EmptyResponse));
    }

    #[test]
    fn connection_test_counts_models() {
        let (base, rx) = one_shot_server("200 OK", r#"{"models":[{"name":"llama3.2"},{"name":"mistral"}]}"#);

        let summary = client(Backend::Ollama, &base).test_connection().unwrap();
        assert!(summary.contains("2 models available"));

        let (request_line, _) = rx.recv().unwrap();
        assert!(request_line.starts_with("GET /api/tags"));
    }

    #[test]
    fn unreachable_server_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(Backend::Ollama, &format!("http://{}", addr))
            .complete("x")
            .unwrap_err();
        assert!(matches!(err, EngineError::Request(_)));
    }
}
