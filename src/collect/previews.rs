use std::collections::BTreeMap;
use std::io::Read as _;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::collect::session::SessionCredentials;
use crate::collect::{CollectFailure, CollectOutcome, CollectReport, numbered_path};
use crate::foundation::error::{RevlapseError, RevlapseResult};
use crate::foundation::timestamp::Timestamp;
use crate::ledger::LedgerEntry;
use crate::storage::Storage;

/// One preview image captured from the web UI.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct PreviewRecord {
    /// Version identifier, when the capture recorded one.
    #[serde(default)]
    pub id: Option<String>,
    /// When the version was saved.
    pub timestamp: Timestamp,
    /// Where the rendered preview can be fetched.
    pub url: String,
}

#[derive(serde::Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<String>,
    timestamp: String,
    url: String,
}

#[derive(serde::Deserialize)]
struct RawBody {
    timestamp: String,
    url: String,
}

impl RawRecord {
    fn into_record(self) -> RevlapseResult<PreviewRecord> {
        Ok(PreviewRecord {
            timestamp: Timestamp::parse(&self.timestamp)?,
            id: self.id,
            url: self.url,
        })
    }
}

/// Parse captured preview records.
///
/// Accepts a JSON array of `{id?, timestamp, url}` objects or an object mapping version id to
/// `{timestamp, url}`. Every timestamp must parse; one malformed entry rejects the whole input
/// with a [`RevlapseError::Timestamp`] naming it.
pub fn parse_preview_records(bytes: &[u8]) -> RevlapseResult<Vec<PreviewRecord>> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| RevlapseError::serde(format!("decode preview records: {e}")))?;
    let raw: Vec<RawRecord> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| RevlapseError::serde(format!("decode preview list: {e}")))?,
        serde_json::Value::Object(_) => {
            let map: BTreeMap<String, RawBody> = serde_json::from_value(value)
                .map_err(|e| RevlapseError::serde(format!("decode preview map: {e}")))?;
            map.into_iter()
                .map(|(id, body)| RawRecord {
                    id: Some(id),
                    timestamp: body.timestamp,
                    url: body.url,
                })
                .collect()
        }
        _ => {
            return Err(RevlapseError::serde(
                "preview records must be a JSON array or object",
            ));
        }
    };
    raw.into_iter().map(RawRecord::into_record).collect()
}

/// Raw HTTP answer for one preview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; empty for error statuses.
    pub body: Vec<u8>,
}

/// Fetches one preview URL. Transport failures are errors; HTTP error statuses are responses.
pub trait PreviewFetcher {
    /// Issue one authenticated GET.
    fn fetch(&mut self, url: &str) -> RevlapseResult<FetchResponse>;
}

/// [`PreviewFetcher`] replaying captured session credentials over `ureq`.
pub struct HttpFetcher {
    agent: ureq::Agent,
    credentials: SessionCredentials,
}

impl HttpFetcher {
    /// Build a fetcher; `timeout` bounds each whole request.
    pub fn new(credentials: SessionCredentials, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Self {
            agent: builder.build(),
            credentials,
        }
    }
}

impl PreviewFetcher for HttpFetcher {
    fn fetch(&mut self, url: &str) -> RevlapseResult<FetchResponse> {
        let mut req = self.agent.get(url);
        for (name, value) in self.credentials.replay_headers() {
            req = req.set(name, value);
        }
        if let Some(cookie) = self.credentials.cookie_header() {
            req = req.set("cookie", &cookie);
        }

        match req.call() {
            Ok(resp) => {
                let status = resp.status();
                let mut body = Vec::new();
                resp.into_reader()
                    .read_to_end(&mut body)
                    .map_err(|e| RevlapseError::fetch(format!("read body of {url}: {e}")))?;
                Ok(FetchResponse { status, body })
            }
            Err(ureq::Error::Status(status, _)) => Ok(FetchResponse {
                status,
                body: Vec::new(),
            }),
            Err(e) => Err(RevlapseError::fetch(format!("GET {url}: {e}"))),
        }
    }
}

/// Download every preview in chronological order into `outdir`.
///
/// Files are named `preview_{index:03}.png` by chronological position. A preview whose file
/// already exists is reused without a request. Anything but HTTP 200 is recorded as a failure and
/// the run moves on.
pub fn collect_previews(
    records: &[PreviewRecord],
    fetcher: &mut dyn PreviewFetcher,
    storage: &mut dyn Storage,
    outdir: &Path,
) -> RevlapseResult<CollectReport> {
    let started = Instant::now();
    storage.create_dir_all(outdir)?;

    let mut ordered = records.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| a.timestamp.instant().cmp(&b.timestamp.instant()));

    let n = ordered.len();
    let mut outcomes = Vec::with_capacity(n);
    for (i, record) in ordered.into_iter().enumerate() {
        let index = i + 1;
        let path = numbered_path(outdir, "preview", index, ".png");

        if storage.exists(&path) {
            tracing::debug!(index, path = %path.display(), "preview already downloaded");
            outcomes.push(CollectOutcome::Success {
                entry: LedgerEntry::new(path, record.timestamp.clone()),
                reused: true,
            });
            continue;
        }

        tracing::info!(
            "{index:03} / {n}. Downloading {} as {} ...",
            record.url,
            path.display()
        );
        let failure = |reason: String| {
            CollectOutcome::Failure(CollectFailure {
                index,
                source_ref: record.url.clone(),
                reason,
            })
        };
        let outcome = match fetcher.fetch(&record.url) {
            Ok(resp) if resp.status == 200 => match storage.write(&path, &resp.body) {
                Ok(()) => CollectOutcome::Success {
                    entry: LedgerEntry::new(path, record.timestamp.clone()),
                    reused: false,
                },
                Err(e) => failure(e.to_string()),
            },
            Ok(resp) => {
                tracing::warn!(url = %record.url, status = resp.status, "download failed");
                failure(format!("status code {}", resp.status))
            }
            Err(e) => {
                tracing::warn!(url = %record.url, error = %e, "download failed");
                failure(e.to_string())
            }
        };
        outcomes.push(outcome);
    }

    Ok(CollectReport::from_outcomes(outcomes, started))
}

#[cfg(test)]
#[path = "../../tests/unit/collect/previews.rs"]
mod tests;
