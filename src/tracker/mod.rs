//! Issue tracker lookups
//!
//! The fetcher only talks to an [`IssueTracker`], so the HTTP client can be
//! swapped for a stub in tests.

mod youtrack;

pub use youtrack::YouTrackClient;

use crate::error::FetchFailure;
use crate::issues::IssueReference;
use crate::{log_debug, log_error, log_info};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Default number of lookups in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Default upper bound for a single lookup
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Release note value that means "nothing to announce"
pub const NO_RELEASE_NOTE: &str = "No release note";

/// Successfully resolved issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: IssueReference,
    pub title: String,
    /// Curated text from the tracker's `Release note` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_note: Option<String>,
}

impl IssueSummary {
    pub fn new(id: IssueReference, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            release_note: None,
        }
    }

    /// Attaches a release note. Blank values and the `No release note`
    /// placeholder are ignored.
    pub fn with_release_note(mut self, note: Option<&str>) -> Self {
        self.release_note = note
            .map(str::trim)
            .filter(|note| !note.is_empty() && *note != NO_RELEASE_NOTE)
            .map(ToString::to_string);
        self
    }

    /// Text shown next to the issue id: the release note if any, else the title
    pub fn display_text(&self) -> &str {
        self.release_note.as_deref().unwrap_or(&self.title)
    }
}

/// Outcome of looking up one reference
pub type IssueLookup = Result<IssueSummary, FetchFailure>;

/// Capability to resolve a single issue reference
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch(&self, reference: &IssueReference) -> IssueLookup;
}

#[async_trait]
impl<T: IssueTracker + ?Sized> IssueTracker for Arc<T> {
    async fn fetch(&self, reference: &IssueReference) -> IssueLookup {
        (**self).fetch(reference).await
    }
}

/// Lookup results keyed by reference. Entries are written once and never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueMap {
    entries: BTreeMap<IssueReference, IssueLookup>,
}

impl IssueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup result. Returns `false` and keeps the existing value if
    /// the reference was already recorded.
    pub fn insert(&mut self, reference: IssueReference, lookup: IssueLookup) -> bool {
        use std::collections::btree_map::Entry;

        match self.entries.entry(reference) {
            Entry::Vacant(slot) => {
                slot.insert(lookup);
                true
            }
            Entry::Occupied(existing) => {
                log_error!(
                    "Ignoring second lookup result for {}; keeping the first",
                    existing.key()
                );
                false
            }
        }
    }

    pub fn get(&self, reference: &IssueReference) -> Option<&IssueLookup> {
        self.entries.get(reference)
    }

    pub fn contains(&self, reference: &IssueReference) -> bool {
        self.entries.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IssueReference, &IssueLookup)> {
        self.entries.iter()
    }

    /// References whose lookup failed
    pub fn failed(&self) -> BTreeSet<IssueReference> {
        self.entries
            .iter()
            .filter(|(_, lookup)| lookup.is_err())
            .map(|(reference, _)| reference.clone())
            .collect()
    }
}

/// Resolves a set of references with bounded concurrency
pub struct IssueFetcher<T> {
    tracker: T,
    concurrency: usize,
    timeout: Duration,
}

impl<T: IssueTracker> IssueFetcher<T> {
    pub fn new(tracker: T) -> Self {
        Self {
            tracker,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Looks up every reference and returns once each has a result.
    ///
    /// Individual failures are recorded in the map; nothing here aborts the run.
    pub async fn fetch_all(&self, references: &BTreeSet<IssueReference>) -> IssueMap {
        let mut map = IssueMap::new();
        if references.is_empty() {
            log_debug!("No issue references to look up");
            return map;
        }

        log_info!(
            "Looking up {} issue(s), {} at a time",
            references.len(),
            self.concurrency
        );

        let results: Vec<(IssueReference, IssueLookup)> = stream::iter(references)
            .map(|reference| async move { (reference.clone(), self.fetch_one(reference).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (reference, lookup) in results {
            map.insert(reference, lookup);
        }

        let failed = map.failed().len();
        let unreachable = map
            .iter()
            .all(|(_, lookup)| lookup.as_ref().is_err_and(FetchFailure::is_transport_level));
        if unreachable {
            log_error!(
                "Issue tracker looks unreachable: all {} lookups failed; rendering them as unresolved",
                failed
            );
        } else if failed > 0 {
            log_info!("{} of {} issue lookups failed", failed, map.len());
        }

        map
    }

    async fn fetch_one(&self, reference: &IssueReference) -> IssueLookup {
        if let Ok(lookup) = tokio::time::timeout(self.timeout, self.tracker.fetch(reference)).await
        {
            if let Err(failure) = &lookup {
                log_debug!("Lookup for {} failed: {}", reference, failure);
            }
            lookup
        } else {
            log_debug!(
                "Lookup for {} timed out after {:?}",
                reference,
                self.timeout
            );
            Err(FetchFailure::Timeout)
        }
    }
}
