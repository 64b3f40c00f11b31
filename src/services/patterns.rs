//! Ordered pattern lists driving the job extraction heuristics.
//!
//! Every pattern compiles on its own. A pattern that fails to compile is
//! logged and dropped; the rest of its list keeps working.

use regex::{Regex, RegexBuilder};
use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::ExtractionConfig;

/// Link selectors for known listing containers and ATS markup, tried in order.
pub const LISTING_SELECTORS: &[&str] = &[
    // Listing containers
    r#"[class*="job-list"] a"#,
    r#"[class*="jobs-list"] a"#,
    r#"[class*="career"] a"#,
    r#"[class*="opening"] a"#,
    r#"[class*="position"] a"#,
    r#"[class*="vacancy"] a"#,
    "[data-job] a",
    "[data-position] a",
    // Lever / Greenhouse
    ".posting a",
    ".posting-title a",
    r#"[data-qa="posting-name"] a"#,
    ".job-post a",
    // Workday
    r#"[data-automation-id="jobTitle"] a"#,
    // Lists
    "ul.jobs li a",
    "ul.positions li a",
    ".job-card a",
    ".job-item a",
    ".job-listing a",
    // Tables
    "table.jobs a",
    "tr.job a",
    // Component frameworks
    r#"[class*="JobCard"] a"#,
    r#"[class*="job-card"] a"#,
    r#"[class*="JobListing"] a"#,
    r#"[class*="job-listing"] a"#,
];

/// URL shapes that usually point at a job posting, matched on lowercased URLs.
pub const JOB_URL_PATTERNS: &[&str] = &[
    r"/jobs?/",
    r"/careers?/",
    r"/positions?/",
    r"/openings?/",
    r"/vacancies?/",
    r"/opportunities?/",
    r"/job-",
    r"/career-",
    r"/apply",
    r"jobid=",
    r"job_id=",
    r"position_id=",
    r"/job/\d+",
    r"/jobs/\d+",
];

/// Child elements of a link that usually carry the job title.
pub const TITLE_SELECTORS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    r#"[class*="title"]"#,
    r#"[class*="name"]"#,
    r#"[class*="position"]"#,
    r#"[class*="role"]"#,
];

/// Link texts that belong to navigation rather than a job.
pub const GENERIC_LINK_TEXTS: &[&str] = &[
    "apply",
    "learn more",
    "read more",
    "view all",
    "see all",
    "back",
    "next",
    "previous",
];

/// Description snippet candidates inside a link's parent, first in document order.
pub const DESCRIPTION_SELECTOR: &str = r#"[class*="description"], [class*="summary"], p"#;

/// Every link with a target, scanned by the URL fallback.
pub const ANCHOR_SELECTOR: &str = "a[href]";

/// Document base URL override.
pub const BASE_SELECTOR: &str = "base[href]";

/// A compiled CSS selector together with its source text.
#[derive(Debug, Clone)]
pub struct NamedSelector {
    pub pattern: String,
    pub selector: Selector,
}

/// All extraction patterns, compiled once per extractor.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub listing: Vec<NamedSelector>,
    pub job_urls: Vec<Regex>,
    pub titles: Vec<Selector>,
    pub description: Option<Selector>,
    pub anchor: Option<Selector>,
    pub base: Option<Selector>,
}

impl PatternSet {
    /// Compile the built-in lists followed by the configured additions.
    pub fn new(config: &ExtractionConfig) -> Self {
        let listing_sources = LISTING_SELECTORS
            .iter()
            .copied()
            .chain(config.extra_selectors.iter().map(String::as_str));
        let url_sources = JOB_URL_PATTERNS
            .iter()
            .copied()
            .chain(config.extra_url_patterns.iter().map(String::as_str));

        Self {
            listing: compile_selectors(listing_sources),
            job_urls: compile_url_patterns(url_sources),
            titles: compile_selectors(TITLE_SELECTORS.iter().copied())
                .into_iter()
                .map(|named| named.selector)
                .collect(),
            description: compile_one(DESCRIPTION_SELECTOR),
            anchor: compile_one(ANCHOR_SELECTOR),
            base: compile_one(BASE_SELECTOR),
        }
    }

    /// Check a resolved URL against the job URL patterns.
    pub fn is_job_url(&self, url: &str) -> bool {
        self.job_urls.iter().any(|re| re.is_match(url))
    }

    /// Check whether a title is a generic navigation phrase.
    pub fn is_generic_text(title: &str) -> bool {
        let normalized = title.trim().to_lowercase();
        GENERIC_LINK_TEXTS.contains(&normalized.as_str())
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

/// Parse a CSS selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Compile a job URL regex. Matching ignores case.
pub fn parse_url_pattern(s: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(s).case_insensitive(true).build()?)
}

fn compile_one(pattern: &str) -> Option<Selector> {
    match parse_selector(pattern) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::warn!("Skipping selector: {}", e);
            None
        }
    }
}

fn compile_selectors<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Vec<NamedSelector> {
    patterns
        .into_iter()
        .filter_map(|pattern| {
            compile_one(pattern).map(|selector| NamedSelector {
                pattern: pattern.to_string(),
                selector,
            })
        })
        .collect()
}

fn compile_url_patterns<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Vec<Regex> {
    patterns
        .into_iter()
        .filter_map(|pattern| match parse_url_pattern(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Skipping URL pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_all_compile() {
        let patterns = PatternSet::default();
        assert_eq!(patterns.listing.len(), LISTING_SELECTORS.len());
        assert_eq!(patterns.job_urls.len(), JOB_URL_PATTERNS.len());
        assert_eq!(patterns.titles.len(), TITLE_SELECTORS.len());
        assert!(patterns.description.is_some());
        assert!(patterns.anchor.is_some());
        assert!(patterns.base.is_some());
    }

    #[test]
    fn test_invalid_extras_are_skipped() {
        let config = ExtractionConfig {
            extra_selectors: vec!["[[broken".into(), ".custom-job a".into()],
            extra_url_patterns: vec!["(unclosed".into(), "/gigs/".into()],
            ..ExtractionConfig::default()
        };
        let patterns = PatternSet::new(&config);

        assert_eq!(patterns.listing.len(), LISTING_SELECTORS.len() + 1);
        assert_eq!(
            patterns.listing.last().unwrap().pattern,
            ".custom-job a".to_string()
        );
        assert_eq!(patterns.job_urls.len(), JOB_URL_PATTERNS.len() + 1);
        assert!(patterns.is_job_url("https://acme.test/gigs/7"));
    }

    #[test]
    fn test_extra_url_patterns_ignore_case() {
        let config = ExtractionConfig {
            extra_url_patterns: vec!["/Vacatures/".into()],
            ..ExtractionConfig::default()
        };
        let patterns = PatternSet::new(&config);

        assert!(patterns.is_job_url("https://acme.test/vacatures/12"));
        assert!(patterns.is_job_url("https://acme.test/VACATURES/12"));
    }

    #[test]
    fn test_is_job_url() {
        let patterns = PatternSet::default();
        assert!(patterns.is_job_url("https://acme.test/jobs/123"));
        assert!(patterns.is_job_url("https://acme.test/Careers/backend"));
        assert!(patterns.is_job_url("https://acme.test/listing?JobId=9"));
        assert!(patterns.is_job_url("https://acme.test/apply/42"));
        assert!(!patterns.is_job_url("https://acme.test/about"));
        assert!(!patterns.is_job_url("https://acme.test/blog/2024/hello"));
    }

    #[test]
    fn test_is_generic_text() {
        assert!(PatternSet::is_generic_text("Learn More"));
        assert!(PatternSet::is_generic_text("  APPLY "));
        assert!(!PatternSet::is_generic_text("Apply Engineer"));
        assert!(!PatternSet::is_generic_text("Backend Engineer"));
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
        assert!(parse_selector("tr:has(a)").is_ok());
    }
}
