//! Bridge to the external code execution service.
//!
//! Submits the current buffer and language/runtime selection as a single
//! HTTP request and flattens the service's heterogeneous response shapes
//! into one display string. The bridge never fails: transport and decoding
//! errors are rendered as `Error: <message>` strings and persisted exactly
//! like successful output.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::languages;

const DEFAULT_ENDPOINT: &str = "https://emkc.org/api/v2/piston/execute";

#[derive(Debug, Serialize)]
struct ExecutionPayload<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<SourceFile<'a>>,
}

#[derive(Debug, Serialize)]
struct SourceFile<'a> {
    name: String,
    content: &'a str,
}

#[derive(Clone)]
pub struct ExecutionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ExecutionClient {
    pub fn new(endpoint: Option<String>) -> Self {
        let client = reqwest::Client::new();
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        info!("Initialized execution client with endpoint: {}", endpoint);

        Self { client, endpoint }
    }

    /// Run a buffer against the execution service. Infallible by contract:
    /// failures come back as `Error: <message>` display strings.
    pub async fn execute(&self, language: &str, version: &str, code: &str) -> String {
        match self.try_execute(language, version, code).await {
            Ok(output) => output,
            Err(err) => format!("Error: {}", err),
        }
    }

    async fn try_execute(&self, language: &str, version: &str, code: &str) -> Result<String> {
        let payload = ExecutionPayload {
            language,
            version,
            files: vec![SourceFile {
                name: languages::file_name(language),
                content: code,
            }],
        };

        debug!("Submitting {} buffer to {}", language, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("failed to reach execution service")?;

        let data: Value = response
            .json()
            .await
            .context("failed to decode execution response")?;

        Ok(normalize_response(&data))
    }
}

/// Flatten an execution response into a display string.
///
/// Priority: a `run` sub-object (stdout, labeled stderr, exit code trailer),
/// then an `output`/`message` string, then the raw JSON. A `files` array, if
/// present, is appended as a listing section.
pub fn normalize_response(data: &Value) -> String {
    let mut result = String::new();

    if let Some(run) = data.get("run") {
        if let Some(stdout) = run.get("stdout").and_then(Value::as_str) {
            result.push_str(stdout);
        }
        if let Some(stderr) = run.get("stderr").and_then(Value::as_str) {
            if !stderr.is_empty() {
                result.push_str("\n[stderr]:\n");
                result.push_str(stderr);
            }
        }
        result.push_str("\n[exit code]: ");
        result.push_str(&render_exit_code(run.get("code")));
    } else if let Some(message) = data
        .get("output")
        .or_else(|| data.get("message"))
        .and_then(Value::as_str)
    {
        result.push_str(message);
    } else {
        result.push_str(&data.to_string());
    }

    if let Some(files) = data.get("files").and_then(Value::as_array) {
        result.push_str("\n\nFiles:\n");
        let listing: Vec<String> = files
            .iter()
            .map(|file| {
                let name = file.get("name").and_then(Value::as_str).unwrap_or("");
                let content = file.get("content").and_then(Value::as_str).unwrap_or("");
                format!("{}:\n{}", name, content)
            })
            .collect();
        result.push_str(&listing.join("\n\n"));
    }

    if result.is_empty() {
        return data.to_string();
    }
    result
}

fn render_exit_code(code: Option<&Value>) -> String {
    match code {
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_run_output() {
        let data = json!({"run": {"stdout": "5\n", "stderr": "", "code": 0}});
        assert_eq!(normalize_response(&data), "5\n\n[exit code]: 0");
    }

    #[test]
    fn test_normalize_run_with_stderr() {
        let data = json!({"run": {"stdout": "", "stderr": "boom", "code": 1}});
        assert_eq!(
            normalize_response(&data),
            "\n[stderr]:\nboom\n[exit code]: 1"
        );
    }

    #[test]
    fn test_normalize_message() {
        let data = json!({"message": "rate limited"});
        assert_eq!(normalize_response(&data), "rate limited");
    }

    #[test]
    fn test_normalize_output_takes_priority_over_message() {
        let data = json!({"output": "hello", "message": "ignored"});
        assert_eq!(normalize_response(&data), "hello");
    }

    #[test]
    fn test_normalize_unknown_shape_falls_back_to_json() {
        let data = json!({"status": "queued"});
        assert_eq!(normalize_response(&data), r#"{"status":"queued"}"#);
    }

    #[test]
    fn test_normalize_appends_files_section() {
        let data = json!({
            "run": {"stdout": "ok\n", "stderr": "", "code": 0},
            "files": [
                {"name": "out.txt", "content": "a"},
                {"name": "log.txt", "content": "b"}
            ]
        });
        assert_eq!(
            normalize_response(&data),
            "ok\n\n[exit code]: 0\n\nFiles:\nout.txt:\na\n\nlog.txt:\nb"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_renders_error_string() {
        let client = ExecutionClient::new(Some("http://127.0.0.1:1/execute".to_string()));
        let output = client.execute("python", "3.10.0", "print(1)").await;
        assert!(output.starts_with("Error: "), "got: {}", output);
    }
}
