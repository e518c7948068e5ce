//! Commit stream parsing
//!
//! The pipeline feeds us the output of something like
//! `git log --format='<sep>%n%H%n%B' <prev-tag>..<tag>`: a separator token, the
//! commit hash on its own line, then the raw message body.

use crate::error::{InputError, MalformedChunk};
use crate::log_warn;
use std::str::Split;

/// A single commit from the log stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
}

impl CommitRecord {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// First line of the message
    pub fn subject(&self) -> &str {
        self.message.lines().next().map_or("", str::trim)
    }

    /// Everything after the subject line
    pub fn body(&self) -> &str {
        self.message
            .split_once('\n')
            .map_or("", |(_, rest)| rest.trim())
    }

    /// Abbreviated hash for display
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }
}

/// Lazily splits a log stream into commits.
///
/// The iterator consumes the underlying split, so it can only be walked once.
/// Chunks without a recognizable hash are skipped and counted.
pub struct CommitParser<'a> {
    chunks: Split<'a, &'a str>,
    skipped: usize,
}

impl<'a> CommitParser<'a> {
    pub fn new(text: &'a str, separator: &'a str) -> Result<Self, InputError> {
        if separator.is_empty() {
            return Err(InputError::EmptySeparator);
        }
        Ok(Self {
            chunks: text.split(separator),
            skipped: 0,
        })
    }

    /// Number of malformed chunks dropped so far
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for CommitParser<'_> {
    type Item = CommitRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chunk = self.chunks.next()?.trim();
            if chunk.is_empty() {
                continue;
            }

            match parse_chunk(chunk) {
                Ok(record) => return Some(record),
                Err(malformed) => {
                    log_warn!("Skipping malformed commit chunk: {}", malformed);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Parses one trimmed, non-empty chunk
pub fn parse_chunk(chunk: &str) -> Result<CommitRecord, MalformedChunk> {
    let (first, rest) = chunk.split_once('\n').unwrap_or((chunk, ""));
    let hash = first.trim();

    if !is_commit_hash(hash) {
        return Err(MalformedChunk {
            first_line: hash.chars().take(40).collect(),
        });
    }

    Ok(CommitRecord::new(hash, rest.trim()))
}

fn is_commit_hash(candidate: &str) -> bool {
    (4..=64).contains(&candidate.len()) && candidate.chars().all(|c| c.is_ascii_hexdigit())
}

/// Splits a self-describing stream whose first line is the separator token.
///
/// Returns `None` when the input is empty.
pub fn split_separator_header(input: &str) -> Option<(&str, &str)> {
    if input.trim().is_empty() {
        return None;
    }
    let (header, rest) = input.split_once('\n').unwrap_or((input, ""));
    Some((header.trim_end_matches('\r'), rest))
}
