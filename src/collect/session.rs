//! Session replay: pull request headers and cookies out of a pasted `curl` command.
//!
//! Browsers offer "Copy as cURL" on any request in the network panel. The resulting command
//! carries the authenticated session as `-H` headers and usually a `cookie:` header (or `-b`).

use std::collections::BTreeMap;

use crate::foundation::error::{RevlapseError, RevlapseResult};

/// Headers that describe the captured connection rather than the session.
const CONNECTION_HEADERS: [&str; 5] = [
    "accept-encoding",
    "connection",
    "content-length",
    "host",
    "cookie",
];

/// Headers and cookies replayed on every preview fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Lower-cased header name to value.
    pub headers: BTreeMap<String, String>,
    /// Cookie name to value.
    pub cookies: BTreeMap<String, String>,
}

impl SessionCredentials {
    /// The cookies folded back into one `Cookie` header value, if any.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>();
        Some(pairs.join("; "))
    }

    /// Headers worth replaying: everything except connection-level ones.
    pub fn replay_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter(|(k, _)| !CONNECTION_HEADERS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse a pasted `curl` command into [`SessionCredentials`].
///
/// Headers split on the first `:` and cookie pairs on the first `=`, so values may contain either
/// character. Fragments without a delimiter are skipped.
pub fn parse_curl(command: &str) -> RevlapseResult<SessionCredentials> {
    let words = shell_words(command)?;
    let mut creds = SessionCredentials::default();

    let mut it = words.iter();
    while let Some(word) = it.next() {
        match word.as_str() {
            "-H" | "--header" => {
                let Some(header) = it.next() else {
                    return Err(RevlapseError::validation(format!(
                        "curl option '{word}' is missing its value"
                    )));
                };
                add_header(&mut creds, header);
            }
            "-b" | "--cookie" => {
                let Some(cookie) = it.next() else {
                    return Err(RevlapseError::validation(format!(
                        "curl option '{word}' is missing its value"
                    )));
                };
                add_cookies(&mut creds, cookie);
            }
            _ => {}
        }
    }

    Ok(creds)
}

fn add_header(creds: &mut SessionCredentials, header: &str) {
    let Some((name, value)) = header.split_once(':') else {
        tracing::debug!(header, "skipping header without ':'");
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    let value = value.trim();
    if name == "cookie" {
        add_cookies(creds, value);
    } else if !name.is_empty() {
        creds.headers.insert(name, value.to_string());
    }
}

fn add_cookies(creds: &mut SessionCredentials, cookie: &str) {
    for pair in cookie.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((k, v)) => {
                creds.cookies.insert(k.trim().to_string(), v.to_string());
            }
            None => tracing::debug!(pair, "skipping cookie fragment without '='"),
        }
    }
}

/// Split a shell command line into words with POSIX quoting rules.
///
/// Backslash-newline continuations are dropped, including the `\r\n` form pasted from Windows.
/// Empty words are dropped too; no curl option this module reads takes an empty value.
pub(crate) fn shell_words(input: &str) -> RevlapseResult<Vec<String>> {
    let normalized = input.replace("\r\n", "\n");
    let words = shlex::split(&normalized).ok_or_else(|| {
        RevlapseError::validation("curl command has an unterminated quote or trailing backslash")
    })?;
    Ok(words.into_iter().filter(|w| !w.is_empty()).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/collect/session.rs"]
mod tests;
