//! Issue reference extraction from commit messages

use crate::commits::CommitRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Project key (two or more letters), dash, number
static ISSUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{2,})-(\d+)\b").expect("issue pattern should compile")
});

/// Normalized issue identifier such as `PROJ-42`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueReference(String);

impl IssueReference {
    /// Builds a reference from a project key and number, upper-casing the key
    pub fn new(key: &str, number: &str) -> Self {
        Self(format!("{}-{}", key.to_ascii_uppercase(), number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Project key part, e.g. `PROJ`
    pub fn project_key(&self) -> &str {
        self.0.rsplit_once('-').map_or(&self.0, |(key, _)| key)
    }
}

impl fmt::Display for IssueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds issue identifiers in free-form commit text
#[derive(Debug, Clone, Default)]
pub struct IssueExtractor {
    project_keys: Option<BTreeSet<String>>,
}

impl IssueExtractor {
    /// Creates an extractor. An empty key list accepts any project key.
    pub fn new(project_keys: &[String]) -> Self {
        let project_keys = if project_keys.is_empty() {
            None
        } else {
            Some(
                project_keys
                    .iter()
                    .map(|key| key.trim().to_ascii_uppercase())
                    .collect(),
            )
        };

        Self { project_keys }
    }

    /// References in one message, in order of first appearance, without repeats
    pub fn extract(&self, message: &str) -> Vec<IssueReference> {
        let mut seen = BTreeSet::new();
        ISSUE_PATTERN
            .captures_iter(message)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let number = caps.get(2)?.as_str();
                Some(IssueReference::new(key, number))
            })
            .filter(|reference| self.accepts(reference))
            .filter(|reference| seen.insert(reference.clone()))
            .collect()
    }

    /// Unique references across a whole commit range
    pub fn collect<'a, I>(&self, commits: I) -> BTreeSet<IssueReference>
    where
        I: IntoIterator<Item = &'a CommitRecord>,
    {
        commits
            .into_iter()
            .flat_map(|commit| self.extract(&commit.message))
            .collect()
    }

    fn accepts(&self, reference: &IssueReference) -> bool {
        self.project_keys
            .as_ref()
            .is_none_or(|keys| keys.contains(reference.project_key()))
    }
}
