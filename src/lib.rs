//! relnotes - release notes from a commit log
//!
//! Splits a separator-delimited commit log into commits, looks up the issue
//! tracker summary of every referenced issue and renders a chat-ready document.

#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine

pub mod cli;
pub mod commits;
pub mod common;
pub mod config;
pub mod error;
pub mod issues;
pub mod logger;
pub mod notes;
pub mod pipeline;
pub mod tracker;
pub mod ui;

pub use commits::{CommitParser, CommitRecord};
pub use config::Config;
pub use error::{ConfigError, FetchFailure, InputError};
pub use issues::{IssueExtractor, IssueReference};
pub use notes::{NotesFormatter, ReleaseNotesDocument};
pub use pipeline::generate_release_notes;
pub use tracker::{IssueFetcher, IssueMap, IssueSummary, IssueTracker, YouTrackClient};
