#![allow(dead_code)]

use async_trait::async_trait;
use relnotes::tracker::IssueLookup;
use relnotes::{FetchFailure, IssueReference, IssueSummary, IssueTracker};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// Parses `KEY-123` into a reference
pub fn reference(id: &str) -> IssueReference {
    let (key, number) = id.split_once('-').expect("test ids look like KEY-1");
    IssueReference::new(key, number)
}

/// Builds a log stream the way the CI step produces it
pub fn log_stream(separator: &str, commits: &[(&str, &str)]) -> String {
    commits
        .iter()
        .map(|(hash, message)| format!("{separator}\n{hash}\n{message}\n"))
        .collect()
}

/// In-memory issue tracker that records how it was called
#[derive(Default)]
pub struct MockTracker {
    responses: HashMap<String, IssueLookup>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(mut self, id: &str, title: &str) -> Self {
        self.responses.insert(
            id.to_string(),
            Ok(IssueSummary::new(reference(id), title)),
        );
        self
    }

    pub fn with_failure(mut self, id: &str, failure: FetchFailure) -> Self {
        self.responses.insert(id.to_string(), Err(failure));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn fetch(&self, reference: &IssueReference) -> IssueLookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses
            .get(reference.as_str())
            .cloned()
            .unwrap_or(Err(FetchFailure::NotFound))
    }
}

/// Address nothing listens on
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read address");
    drop(listener);
    addr
}
