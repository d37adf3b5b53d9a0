//! Outbound HTTP.
//!
//! Every request carries [`USER_AGENT`] and follows redirects. Failures are
//! meant to be survivable: [`Fetcher::get_json`] never errors, it logs and
//! returns an empty JSON object so callers treat "down" and "empty" alike.
//!
//! ## Failure reporting
//!
//! Non-transient failures are also pushed to an optional observer channel as
//! [`IntegrationEvent`]s so a long-running process can surface them (mail
//! the admins, bump a counter). `503 Service Unavailable` is considered
//! transient and only logged at debug level.

use reqwest::StatusCode;
use reqwest::blocking::{Client, ClientBuilder, Response};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::IntegrationsConfig;

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!(
    "pythonz.net/",
    env!("CARGO_PKG_VERSION"),
    " (press@pythonz.net)"
);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether the failure is a transient status such as 503.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.status().is_some_and(is_transient),
        }
    }
}

/// A failed call to a third-party service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationEvent {
    pub description: String,
}

impl IntegrationEvent {
    pub fn new(url: &str, error: impl std::fmt::Display) -> Self {
        Self {
            description: format!("URL {url}. Error: {error}"),
        }
    }
}

/// A file downloaded from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Last `/`-separated segment of the URL.
    pub name: String,
    pub content: Vec<u8>,
}

impl RemoteFile {
    /// Write the content into `dir` without replacing anything there.
    ///
    /// A taken `logo.png` is stored as `logo_1.png`, then `logo_2.png`, and
    /// so on. Returns the path actually written.
    pub fn save_into(&self, dir: &Path) -> io::Result<PathBuf> {
        let name = Path::new(&self.name);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

        let mut attempt = 0u32;
        loop {
            let candidate = match (attempt, &extension) {
                (0, _) => self.name.clone(),
                (n, Some(ext)) => format!("{stem}_{n}.{ext}"),
                (n, None) => format!("{stem}_{n}"),
            };
            let path = dir.join(candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(&self.content) {
                        let _ = std::fs::remove_file(&path);
                        return Err(e);
                    }
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Statuses worth retrying on a later run without raising an alarm.
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Blocking HTTP client with failure reporting.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    events: Option<Sender<IntegrationEvent>>,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::from_client(Self::client_builder(timeout).build()?))
    }

    fn client_builder(timeout: Duration) -> ClientBuilder {
        Client::builder().user_agent(USER_AGENT).timeout(timeout)
    }

    fn from_client(client: Client) -> Self {
        Self {
            client,
            events: None,
        }
    }

    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, FetchError> {
        Self::new(config.timeout())
    }

    /// Deliver failure events to `events` from now on.
    pub fn with_events(mut self, events: Sender<IntegrationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Log a failed call and pass it on to the observer.
    pub fn report_failure(&self, url: &str, error: impl std::fmt::Display) {
        warn!(url, error = %error, "request failed");
        self.emit(IntegrationEvent::new(url, error));
    }

    fn emit(&self, event: IntegrationEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening any more.
            let _ = tx.send(event);
        }
    }

    /// GET `url`, following redirects. Any status counts as success here.
    pub fn get_from_url(&self, url: &str) -> Result<Response, FetchError> {
        debug!(url, "GET");
        Ok(self.client.get(url).send()?)
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// Transport errors and non-2xx statuses yield an empty object and,
    /// unless transient, an [`IntegrationEvent`]. A body that is not JSON
    /// also yields an empty object but no event.
    pub fn get_json(&self, url: &str) -> Value {
        let response = match self
            .client
            .get(url)
            .send()
            .and_then(Response::error_for_status)
        {
            Ok(response) => response,
            Err(e) => {
                if e.status().is_some_and(is_transient) {
                    debug!(url, error = %e, "service temporarily unavailable");
                } else {
                    self.report_failure(url, &e);
                }
                return empty_object();
            }
        };

        match response.json::<Value>() {
            Ok(doc) => doc,
            Err(e) => {
                debug!(url, error = %e, "response is not JSON");
                empty_object()
            }
        }
    }

    /// GET `url` and return the body of a successful response.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.get_from_url(url)?.error_for_status()?.bytes()?.to_vec())
    }

    /// Download the resource at `url`.
    pub fn get_image_from_url(&self, url: &str) -> Result<RemoteFile, FetchError> {
        let content = self.get_bytes(url)?;
        let name = url.rsplit('/').next().unwrap_or_default().to_string();
        Ok(RemoteFile { name, content })
    }
}
