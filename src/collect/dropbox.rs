//! Minimal Dropbox HTTP API client for revision history.
//!
//! Only the two RPC endpoints the revision backend needs are wrapped:
//! `files/list_revisions` and `files/download`.

use std::io::Read as _;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::collect::revisions::{Revision, RevisionSource};
use crate::foundation::error::{RevlapseError, RevlapseResult};

const API_BASE: &str = "https://api.dropboxapi.com";
const CONTENT_BASE: &str = "https://content.dropboxapi.com";

/// [`RevisionSource`] backed by the Dropbox v2 API.
pub struct DropboxClient {
    agent: ureq::Agent,
    token: String,
    api_base: String,
    content_base: String,
}

#[derive(serde::Deserialize)]
struct ListRevisionsResponse {
    entries: Vec<Revision>,
}

impl DropboxClient {
    /// Client authenticating with a bearer `token`.
    pub fn new(token: impl Into<String>, timeout: Option<Duration>) -> RevlapseResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(RevlapseError::validation("dropbox access token is empty"));
        }
        let mut builder = ureq::AgentBuilder::new();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            agent: builder.build(),
            token,
            api_base: API_BASE.to_string(),
            content_base: CONTENT_BASE.to_string(),
        })
    }

    /// Read the access token from `path`; surrounding whitespace is ignored.
    pub fn from_token_file(path: &Path, timeout: Option<Duration>) -> RevlapseResult<Self> {
        let token = std::fs::read_to_string(path)
            .with_context(|| format!("read access token '{}'", path.display()))?;
        Self::new(token, timeout)
    }

    /// Point the client at other hosts (local mocks, proxies).
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        content_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.content_base = content_base.into().trim_end_matches('/').to_string();
        self
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl RevisionSource for DropboxClient {
    fn list_revisions(&mut self, path: &str, limit: u32) -> RevlapseResult<Vec<Revision>> {
        let url = format!("{}/2/files/list_revisions", self.api_base);
        let body = serde_json::json!({ "path": path, "mode": "path", "limit": limit });
        let resp = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .map_err(|e| api_error("list_revisions", e))?;

        let mut text = String::new();
        resp.into_reader()
            .read_to_string(&mut text)
            .map_err(|e| RevlapseError::fetch(format!("read list_revisions body: {e}")))?;
        let parsed: ListRevisionsResponse = serde_json::from_str(&text)
            .map_err(|e| RevlapseError::serde(format!("decode list_revisions response: {e}")))?;
        tracing::debug!(path, count = parsed.entries.len(), "listed revisions");
        Ok(parsed.entries)
    }

    fn download(&mut self, _path: &str, rev: &str) -> RevlapseResult<Vec<u8>> {
        let url = format!("{}/2/files/download", self.content_base);
        let arg = serde_json::json!({ "path": format!("rev:{rev}") });
        let resp = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .set("Dropbox-API-Arg", &header_safe_json(&arg.to_string()))
            .call()
            .map_err(|e| api_error("download", e))?;

        let mut bytes = Vec::new();
        resp.into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| RevlapseError::fetch(format!("read body of rev {rev}: {e}")))?;
        Ok(bytes)
    }
}

fn api_error(endpoint: &str, err: ureq::Error) -> RevlapseError {
    match err {
        ureq::Error::Status(code, resp) => {
            let detail = resp.into_string().unwrap_or_default();
            RevlapseError::fetch(format!("{endpoint} returned {code}: {}", detail.trim()))
        }
        other => RevlapseError::fetch(format!("{endpoint}: {other}")),
    }
}

/// HTTP header values must be ASCII; escape everything else as JSON `\uXXXX` sequences.
fn header_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}
