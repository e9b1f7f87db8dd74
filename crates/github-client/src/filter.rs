//! Repo-level and README-level quality heuristics.
//!
//! Thresholds come from [`RepoFilterConfig`] rather than hardcoded
//! constants, so they can be tuned without a rebuild.

use chrono::{DateTime, Utc};
use harvestline_core::config::RepoFilterConfig;

const README_KEYWORDS: &[&str] = &["install", "usage", "api", "example", "documentation"];

pub struct RepoFilter<'a> {
    config: &'a RepoFilterConfig,
}

impl<'a> RepoFilter<'a> {
    pub fn new(config: &'a RepoFilterConfig) -> Self {
        Self { config }
    }

    /// Repo-level heuristic filter: quality, activity, then name blacklist.
    pub fn is_valid(
        &self,
        name: &str,
        stars: i64,
        size_kb: i64,
        is_fork: bool,
        archived: bool,
        pushed_at: DateTime<Utc>,
    ) -> bool {
        if stars < self.config.min_stars {
            return false;
        }
        if size_kb < self.config.min_size_kb {
            return false;
        }
        if is_fork || archived {
            return false;
        }

        let cutoff = Utc::now() - chrono::Duration::days(self.config.max_pushed_at_days);
        if pushed_at < cutoff {
            return false;
        }

        let lowercase_name = name.to_lowercase();
        if self
            .config
            .blacklist_name_keywords
            .iter()
            .any(|bad| lowercase_name.contains(bad.as_str()))
        {
            return false;
        }

        true
    }
}

/// README quality heuristic: long enough and mentions at least one
/// documentation-shaped keyword.
pub fn is_meaningful_readme(content: &str, min_length: usize) -> bool {
    let lowercase = content.to_lowercase();

    if lowercase.len() < min_length {
        return false;
    }

    README_KEYWORDS.iter().any(|kw| lowercase.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RepoFilterConfig {
        RepoFilterConfig {
            min_stars: 20,
            min_size_kb: 50,
            max_pushed_at_days: 30,
            blacklist_name_keywords: vec!["awesome".to_string(), "tutorial".to_string()],
        }
    }

    #[test]
    fn rejects_blacklisted_names() {
        let cfg = config();
        let filter = RepoFilter::new(&cfg);
        assert!(!filter.is_valid("awesome-rust", 1000, 500, false, false, Utc::now()));
    }

    #[test]
    fn rejects_forks_and_archived() {
        let cfg = config();
        let filter = RepoFilter::new(&cfg);
        assert!(!filter.is_valid("my-lib", 1000, 500, true, false, Utc::now()));
        assert!(!filter.is_valid("my-lib", 1000, 500, false, true, Utc::now()));
    }

    #[test]
    fn accepts_active_non_fork_above_thresholds() {
        let cfg = config();
        let filter = RepoFilter::new(&cfg);
        assert!(filter.is_valid("my-lib", 1000, 500, false, false, Utc::now()));
    }

    #[test]
    fn readme_needs_minimum_length_and_keyword() {
        assert!(!is_meaningful_readme("too short", 500));
        let long_but_no_keyword = "x".repeat(600);
        assert!(!is_meaningful_readme(&long_but_no_keyword, 500));
        let long_with_keyword = format!("{}\nSee the Installation docs.", "x".repeat(600));
        assert!(is_meaningful_readme(&long_with_keyword, 500));
    }
}
