//! One release-notes run: log text in, document out

use crate::commits::{CommitParser, CommitRecord};
use crate::error::InputError;
use crate::issues::IssueExtractor;
use crate::notes::ReleaseNotesDocument;
use crate::tracker::{IssueFetcher, IssueTracker};
use crate::{log_info, log_warn};

/// Parses the log, resolves referenced issues and assembles the document.
///
/// Lookup failures never fail the run; only an unusable separator does.
pub async fn generate_release_notes<T: IssueTracker>(
    title: &str,
    log: &str,
    separator: &str,
    extractor: &IssueExtractor,
    fetcher: &IssueFetcher<T>,
) -> Result<ReleaseNotesDocument, InputError> {
    let mut parser = CommitParser::new(log, separator)?;
    let commits: Vec<CommitRecord> = parser.by_ref().collect();
    let skipped = parser.skipped();

    if skipped > 0 {
        log_warn!("Skipped {} malformed commit chunk(s)", skipped);
    }
    log_info!("Parsed {} commit(s) for '{}'", commits.len(), title);

    let references = extractor.collect(&commits);
    let issues = fetcher.fetch_all(&references).await;

    let document = ReleaseNotesDocument::build(title, commits, &issues, extractor)
        .with_skipped_chunks(skipped);

    log_info!(
        "Release notes ready: {} entr(ies), {} unresolved issue(s)",
        document.entries.len(),
        document.unresolved.len()
    );

    Ok(document)
}
