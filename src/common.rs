use crate::config::Config;
use clap::Args;
use std::path::PathBuf;

/// Options that override the project config file
#[derive(Args, Clone, Default, Debug)]
pub struct CommonParams {
    /// Path to a config file instead of ./.relnotes.toml
    #[arg(long, help = "Path to a config file (defaults to ./.relnotes.toml if present)")]
    pub config: Option<PathBuf>,

    /// Maximum number of issue lookups in flight
    #[arg(long, help = "Maximum number of concurrent issue lookups")]
    pub concurrency: Option<usize>,

    /// Per-lookup timeout in seconds
    #[arg(long, help = "Timeout for a single issue lookup, in seconds")]
    pub timeout: Option<u64>,

    /// Include commit message bodies under each entry
    #[arg(long, help = "Include commit message bodies under each entry")]
    pub include_body: bool,

    /// Only treat these project keys as issue references
    #[arg(
        long = "project-key",
        value_name = "KEY",
        help = "Only recognize issue references with this project key (repeatable)"
    )]
    pub project_keys: Vec<String>,
}

impl CommonParams {
    /// Applies the overrides; returns whether anything changed
    pub fn apply_to_config(&self, config: &mut Config) -> bool {
        let mut changes_made = false;

        if let Some(concurrency) = self.concurrency
            && config.tracker.concurrency != concurrency
        {
            config.tracker.concurrency = concurrency;
            changes_made = true;
        }

        if let Some(timeout) = self.timeout
            && config.tracker.timeout_secs != timeout
        {
            config.tracker.timeout_secs = timeout;
            changes_made = true;
        }

        if self.include_body && !config.format.include_body {
            config.format.include_body = true;
            changes_made = true;
        }

        if !self.project_keys.is_empty() {
            config.tracker.project_keys.clone_from(&self.project_keys);
            changes_made = true;
        }

        changes_made
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overrides_changes_nothing() {
        let mut config = Config::default();
        assert!(!CommonParams::default().apply_to_config(&mut config));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = Config::default();
        let params = CommonParams {
            concurrency: Some(2),
            timeout: Some(3),
            include_body: true,
            project_keys: vec!["ALT".to_string()],
            ..CommonParams::default()
        };

        assert!(params.apply_to_config(&mut config));
        assert_eq!(config.tracker.concurrency, 2);
        assert_eq!(config.tracker.timeout_secs, 3);
        assert!(config.format.include_body);
        assert_eq!(config.tracker.project_keys, vec!["ALT"]);
    }
}
