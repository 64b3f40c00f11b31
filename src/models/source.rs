// src/models/source.rs

//! Career page source definition and its keyword filters.

use serde::{Deserialize, Serialize};

/// A configured career page plus the keyword rules applied to its titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Display name, used as the posting's company
    pub name: String,

    /// URL of the page listing the jobs
    pub url: String,

    /// Titles must contain at least one of these (empty = accept all)
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Titles containing any of these are dropped
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            keywords: Vec::new(),
            exclude_keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Apply include then exclude rules to a title, case-insensitively.
    ///
    /// Exclusion always wins over inclusion.
    pub fn accepts_title(&self, title: &str) -> bool {
        let title_lower = title.to_lowercase();

        if !self.keywords.is_empty() && !contains_any(&title_lower, &self.keywords) {
            return false;
        }

        if !self.exclude_keywords.is_empty() && contains_any(&title_lower, &self.exclude_keywords) {
            return false;
        }

        true
    }
}

fn contains_any(haystack_lower: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|kw| haystack_lower.contains(&kw.to_lowercase()))
}
