use crate::commits::{CommitRecord, split_separator_header};
use crate::common::CommonParams;
use crate::config::Config;
use crate::error::InputError;
use crate::issues::IssueExtractor;
use crate::notes::{NotesFormatter, ReleaseNotesDocument};
use crate::pipeline::generate_release_notes;
use crate::tracker::{IssueFetcher, IssueMap, IssueTracker, YouTrackClient};
use crate::{log_debug, ui};
use anyhow::{Context, Result};
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, ValueEnum, crate_version};
use std::io::Read;

/// CLI structure: one title, the commit log on stdin
#[derive(Parser, Debug)]
#[command(
    author,
    version = crate_version!(),
    about = "Release notes from a commit log, enriched with issue tracker summaries",
    long_about = "Reads a separator-delimited commit log on stdin, looks up every referenced issue \
                  in YouTrack and prints release notes ready to post to a chat webhook.\n\n\
                  Requires YOUTRACK_API_URL and YOUTRACK_API_TOKEN in the environment.",
    styles = get_styles(),
)]
pub struct Cli {
    /// Title line of the notes, usually the release tag
    #[arg(value_parser = parse_title)]
    pub title: String,

    /// Separator token between commits; if omitted the first stdin line is the token
    #[arg(
        short = 's',
        long,
        help = "Separator token between commits (defaults to the first line of stdin)"
    )]
    pub separator: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub common: CommonParams,

    /// Log debug messages to stderr
    #[arg(short = 'l', long = "log", help = "Log debug messages to stderr")]
    pub log: bool,

    /// Also write log messages to this file
    #[arg(long = "log-file", help = "Also write log messages to this file")]
    pub log_file: Option<String>,

    /// Suppress the run summary on stderr
    #[arg(short = 'q', long = "quiet", help = "Suppress non-essential output")]
    pub quiet: bool,
}

/// How the document is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text document
    Text,
    /// Webhook body: {"text": "..."}
    Json,
}

fn parse_title(raw: &str) -> Result<String, String> {
    let title = raw.trim();
    if title.is_empty() {
        Err("title must not be blank".to_string())
    } else {
        Ok(title.to_string())
    }
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Main function: configuration is checked before stdin is touched, and
/// nothing reaches stdout unless the whole document was produced.
pub async fn main() -> Result<()> {
    let cli = parse_args();

    if cli.log || cli.log_file.is_some() {
        crate::logger::enable_logging();
        crate::logger::set_log_to_stderr(cli.log);
        if let Some(log_file) = cli.log_file.as_deref() {
            crate::logger::set_log_file(log_file)
                .with_context(|| format!("Failed to open log file {log_file}"))?;
        }
    }

    if cli.quiet {
        ui::set_quiet_mode(true);
    }

    let mut config = Config::load(cli.common.config.as_deref())?;
    cli.common.apply_to_config(&mut config);
    config.validate()?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(InputError::Read)?;

    let tracker = YouTrackClient::new(
        config.tracker.url()?,
        config.tracker.token.clone(),
        config.tracker.timeout(),
    )?;

    let (output, document) = handle_release_notes(&cli, &config, &input, tracker).await?;
    print!("{output}");

    report_summary(&document);
    Ok(())
}

/// Runs the pipeline for already-parsed arguments and returns the stdout text
/// together with the document it was rendered from.
pub async fn handle_release_notes<T: IssueTracker>(
    cli: &Cli,
    config: &Config,
    input: &str,
    tracker: T,
) -> Result<(String, ReleaseNotesDocument)> {
    log_debug!(
        "Handling release notes for '{}' with separator {:?}, format {:?}",
        cli.title,
        cli.separator,
        cli.format
    );

    let extractor = IssueExtractor::new(&config.tracker.project_keys);
    let fetcher = IssueFetcher::new(tracker)
        .with_concurrency(config.tracker.concurrency)
        .with_timeout(config.tracker.timeout());

    let stream = match cli.separator.as_deref() {
        Some(separator) => Some((separator, input)),
        None => split_separator_header(input).map(|(header, log)| (header.trim(), log)),
    };

    let document = match stream {
        Some((separator, log)) => {
            generate_release_notes(&cli.title, log, separator, &extractor, &fetcher).await?
        }
        None => {
            log_debug!("Empty commit log; nothing to resolve");
            ReleaseNotesDocument::build(
                cli.title.as_str(),
                Vec::<CommitRecord>::new(),
                &IssueMap::new(),
                &extractor,
            )
        }
    };

    let formatter = NotesFormatter::new(&config.format);
    let output = match cli.format {
        OutputFormat::Text => formatter.render(&document),
        OutputFormat::Json => {
            let mut payload = formatter
                .render_payload(&document)
                .context("Failed to serialize webhook payload")?;
            payload.push('\n');
            payload
        }
    };

    Ok((output, document))
}

fn report_summary(document: &ReleaseNotesDocument) {
    if document.skipped_chunks > 0 {
        ui::print_warning(&format!(
            "Skipped {} malformed commit chunk(s)",
            document.skipped_chunks
        ));
    }
    if !document.unresolved.is_empty() {
        ui::print_warning(&format!(
            "{} issue lookup(s) failed; they are marked inline",
            document.unresolved.len()
        ));
    }
    ui::print_success(&format!(
        "Release notes generated: {} entr(ies)",
        document.entries.len()
    ));
}
