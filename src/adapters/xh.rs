use std::collections::BTreeMap;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_XH_BIN: &str = "xh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl XhRequest {
    /// JSON request with an optional bearer token.
    pub fn json(method: HttpMethod, url: impl Into<String>, bearer: Option<&str>) -> Self {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        Self {
            url: url.into(),
            method,
            headers,
            body: None,
        }
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum XhError {
    #[error("`{0}` is not available in PATH")]
    Unavailable(String),
    #[error("failed to spawn xh: {0}")]
    Spawn(std::io::Error),
    #[error("xh execution failed: {0}")]
    Execution(String),
    #[error("xh output is not valid UTF-8: {0}")]
    OutputDecode(std::str::Utf8Error),
    #[error("failed to parse xh response: {0}")]
    Parse(String),
}

/// Sends HTTP requests. Implemented by [`XhClient`]; tests substitute
/// in-memory responders.
pub trait Transport {
    fn send(&self, request: &XhRequest) -> Result<XhResponse, XhError>;
}

/// Runs requests through the `xh` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhClient {
    pub bin: String,
    pub timeout_secs: u64,
}

impl XhClient {
    pub fn new(bin: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            bin: bin.into(),
            timeout_secs,
        }
    }
}

impl Default for XhClient {
    fn default() -> Self {
        Self::new(DEFAULT_XH_BIN, 30)
    }
}

impl Transport for XhClient {
    fn send(&self, request: &XhRequest) -> Result<XhResponse, XhError> {
        debug!(
            method = request.method.as_str(),
            url = %request.url,
            has_body = request.body.is_some(),
            "sending request via xh"
        );

        let mut command = Command::new(&self.bin);
        command
            .arg("--ignore-stdin")
            .arg("--pretty=none")
            .arg("--print=hb")
            .arg(format!("--timeout={}", self.timeout_secs))
            .arg(request.method.as_str())
            .arg(request.url.as_str());

        for (name, value) in &request.headers {
            command.arg(format!("{name}:{value}"));
        }
        if let Some(body) = request.body.as_ref() {
            command.arg("--raw").arg(body);
        }

        let output = match command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child.wait_with_output().map_err(XhError::Spawn)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(XhError::Unavailable(self.bin.clone()));
            }
            Err(error) => return Err(XhError::Spawn(error)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8(output.stderr)
                .unwrap_or_else(|_| "failed to decode xh stderr".to_string());
            return Err(XhError::Execution(stderr.trim().to_string()));
        }

        let response = parse_response(&output.stdout)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}

fn parse_response(raw: &[u8]) -> Result<XhResponse, XhError> {
    let text = std::str::from_utf8(raw).map_err(XhError::OutputDecode)?;
    let normalized = text.replace("\r\n", "\n");
    let (head, body) = split_head_and_body(normalized.as_str());

    let mut lines = head.lines();
    let status_line = lines
        .next()
        .ok_or_else(|| XhError::Parse("missing HTTP status line".to_string()))?;
    let status = parse_status_line(status_line)?;

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (name, value) = trimmed
            .split_once(':')
            .ok_or_else(|| XhError::Parse(format!("invalid header line `{trimmed}`")))?;
        let key = name.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(XhError::Parse("header name cannot be empty".to_string()));
        }
        let value = value.trim().to_string();
        headers
            .entry(key)
            .and_modify(|existing| {
                if !existing.is_empty() {
                    existing.push_str(", ");
                }
                existing.push_str(value.as_str());
            })
            .or_insert(value);
    }

    Ok(XhResponse {
        status,
        headers,
        body: body.trim_end_matches('\n').to_string(),
    })
}

fn split_head_and_body(input: &str) -> (&str, &str) {
    if let Some((head, body)) = input.split_once("\n\n") {
        (head, body)
    } else {
        (input, "")
    }
}

fn parse_status_line(status_line: &str) -> Result<u16, XhError> {
    let mut tokens = status_line.split_ascii_whitespace();
    let http_version = tokens
        .next()
        .ok_or_else(|| XhError::Parse("missing HTTP version in status line".to_string()))?;
    if !http_version.starts_with("HTTP/") {
        return Err(XhError::Parse(format!(
            "status line must start with HTTP version, got `{status_line}`"
        )));
    }
    let status_raw = tokens
        .next()
        .ok_or_else(|| XhError::Parse("missing status code in status line".to_string()))?;
    status_raw
        .parse::<u16>()
        .map_err(|_| XhError::Parse(format!("invalid status code `{status_raw}`")))
}
