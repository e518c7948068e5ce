use super::{IssueLookup, IssueSummary, IssueTracker};
use crate::error::FetchFailure;
use crate::issues::IssueReference;
use crate::trace_debug;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Fields requested from the issues endpoint
const ISSUE_FIELDS: &str = "idReadable,summary,customFields(name,value(text,name))";

/// Custom field holding the curated release note text
const RELEASE_NOTE_FIELD: &str = "Release note";

#[derive(Debug, Deserialize)]
struct IssueResponse {
    #[serde(rename = "idReadable")]
    id_readable: Option<String>,
    summary: String,
    #[serde(rename = "customFields", default)]
    custom_fields: Vec<CustomField>,
}

#[derive(Debug, Deserialize)]
struct CustomField {
    name: String,
    #[serde(default)]
    value: Value,
}

impl CustomField {
    /// Text fields come back as `{"text": ...}`, simple string fields as a bare string
    fn text(&self) -> Option<&str> {
        match &self.value {
            Value::String(text) => Some(text.as_str()),
            Value::Object(fields) => fields.get("text").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl IssueResponse {
    fn release_note(&self) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|field| field.name == RELEASE_NOTE_FIELD)
            .and_then(CustomField::text)
    }
}

/// Client for the YouTrack REST API
pub struct YouTrackClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl YouTrackClient {
    /// Creates a client for the API rooted at `base_url`, e.g.
    /// `https://example.youtrack.cloud/api/`
    pub fn new(base_url: Url, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// URL of a single issue resource
    pub fn issue_url(&self, reference: &IssueReference) -> Result<Url, url::ParseError> {
        let root = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{root}/issues/{reference}"))?;
        url.query_pairs_mut().append_pair("fields", ISSUE_FIELDS);
        Ok(url)
    }

    fn classify_transport_error(error: &reqwest::Error) -> FetchFailure {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_decode() {
            FetchFailure::MalformedResponse
        } else {
            FetchFailure::Transport
        }
    }
}

#[async_trait]
impl IssueTracker for YouTrackClient {
    async fn fetch(&self, reference: &IssueReference) -> IssueLookup {
        let url = self
            .issue_url(reference)
            .map_err(|_| FetchFailure::Transport)?;

        trace_debug!(target: "relnotes::tracker", issue = %reference, "GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                trace_debug!(target: "relnotes::tracker", issue = %reference, "request failed: {}", e);
                Self::classify_transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            trace_debug!(target: "relnotes::tracker", issue = %reference, "status {}", status);
            return Err(FetchFailure::from_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport_error(&e))?;

        let issue: IssueResponse = serde_json::from_str(&body).map_err(|e| {
            trace_debug!(target: "relnotes::tracker", issue = %reference, "unparseable body: {}", e);
            FetchFailure::MalformedResponse
        })?;

        if let Some(returned) = &issue.id_readable
            && !returned.eq_ignore_ascii_case(reference.as_str())
        {
            trace_debug!(
                target: "relnotes::tracker",
                issue = %reference,
                "tracker answered with {}",
                returned
            );
        }

        Ok(IssueSummary::new(reference.clone(), issue.summary.trim())
            .with_release_note(issue.release_note()))
    }
}
