//! Release notes assembly and rendering

use crate::commits::CommitRecord;
use crate::config::FormatConfig;
use crate::issues::{IssueExtractor, IssueReference};
use crate::log_warn;
use crate::tracker::{IssueLookup, IssueMap};
use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as FmtWrite;

const EMPTY_SUBJECT: &str = "(no commit message)";

/// One commit in the notes along with the issues it mentions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub commit: CommitRecord,
    pub issues: Vec<(IssueReference, IssueLookup)>,
}

/// The assembled notes for one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotesDocument {
    pub title: String,
    pub entries: Vec<NoteEntry>,
    /// References shown in `entries` whose lookup failed
    pub unresolved: BTreeSet<IssueReference>,
    /// Malformed chunks dropped while parsing the log
    pub skipped_chunks: usize,
}

impl ReleaseNotesDocument {
    /// Builds the document from commits in log order.
    ///
    /// Commits whose subject line repeats an earlier one are dropped, including
    /// any references only they mention.
    pub fn build(
        title: impl Into<String>,
        commits: impl IntoIterator<Item = CommitRecord>,
        issues: &IssueMap,
        extractor: &IssueExtractor,
    ) -> Self {
        let mut seen_subjects = HashSet::new();
        let mut unresolved = BTreeSet::new();
        let mut entries = Vec::new();

        for commit in commits {
            if !seen_subjects.insert(commit.subject().to_string()) {
                log_warn!(
                    "Dropping commit {} with duplicate subject '{}'",
                    commit.short_hash(),
                    commit.subject()
                );
                continue;
            }

            let mut resolved = Vec::new();
            for reference in extractor.extract(&commit.message) {
                let Some(lookup) = issues.get(&reference) else {
                    log_warn!("No lookup result for {}; leaving it out", reference);
                    continue;
                };
                if lookup.is_err() {
                    unresolved.insert(reference.clone());
                }
                resolved.push((reference, lookup.clone()));
            }

            entries.push(NoteEntry {
                commit,
                issues: resolved,
            });
        }

        Self {
            title: title.into(),
            entries,
            unresolved,
            skipped_chunks: 0,
        }
    }

    pub fn with_skipped_chunks(mut self, skipped: usize) -> Self {
        self.skipped_chunks = skipped;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders a [`ReleaseNotesDocument`] as chat-friendly text
#[derive(Debug, Clone, Default)]
pub struct NotesFormatter {
    include_body: bool,
    issue_url: Option<String>,
    commit_url: Option<String>,
}

impl NotesFormatter {
    pub fn new(config: &FormatConfig) -> Self {
        Self {
            include_body: config.include_body,
            issue_url: config.issue_url.clone(),
            commit_url: config.commit_url.clone(),
        }
    }

    /// Plain text document, always ending in a single newline
    pub fn render(&self, doc: &ReleaseNotesDocument) -> String {
        let mut out = String::new();
        writeln!(out, "{}", doc.title.trim_end()).expect("writing to string should never fail");

        if !doc.entries.is_empty() {
            out.push('\n');
            for entry in &doc.entries {
                self.render_entry(&mut out, entry);
            }
        }

        if !doc.unresolved.is_empty() {
            let ids: Vec<String> = doc
                .unresolved
                .iter()
                .map(|reference| self.issue_label(reference))
                .collect();
            write!(out, "\nUnresolved issues: {}\n", ids.join(", "))
                .expect("writing to string should never fail");
        }

        out
    }

    /// Webhook body: `{"text": "<document>"}`
    pub fn render_payload(&self, doc: &ReleaseNotesDocument) -> Result<String> {
        let text = self.render(doc);
        let payload = serde_json::json!({ "text": text.trim_end() });
        Ok(serde_json::to_string(&payload)?)
    }

    fn render_entry(&self, out: &mut String, entry: &NoteEntry) {
        let commit = &entry.commit;
        let subject = match commit.subject() {
            "" => EMPTY_SUBJECT,
            subject => subject,
        };

        write!(out, "- {subject}").expect("writing to string should never fail");
        if let Some(template) = &self.commit_url {
            write!(
                out,
                " [<{}|{}>]",
                template.replace("{hash}", &commit.hash),
                commit.short_hash()
            )
            .expect("writing to string should never fail");
        }
        out.push('\n');

        if self.include_body {
            for line in commit.body().lines().filter(|line| !line.trim().is_empty()) {
                writeln!(out, "    {}", line.trim_end())
                    .expect("writing to string should never fail");
            }
        }

        for (reference, lookup) in &entry.issues {
            let label = self.issue_label(reference);
            let line = match lookup {
                Ok(summary) => format!("  - {label}: {}", summary.display_text()),
                Err(failure) => format!("  - {label}: (lookup failed — {failure})"),
            };
            writeln!(out, "{line}").expect("writing to string should never fail");
        }
    }

    fn issue_label(&self, reference: &IssueReference) -> String {
        match &self.issue_url {
            Some(template) => format!(
                "<{}|{reference}>",
                template.replace("{id}", reference.as_str())
            ),
            None => reference.to_string(),
        }
    }
}
