// src/services/extractor.rs

//! Job posting extractor.
//!
//! Infers postings from arbitrary career pages in two passes:
//!
//! 1. **Structural**: links matched by known listing selectors.
//! 2. **Fallback**: when the structural pass finds too few postings, every
//!    link whose URL looks like a job page.
//!
//! Both passes share the same link checks and deduplicate by absolute URL.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use url::Url;

use crate::error::Result;
use crate::models::{ExtractionConfig, Posting, Source};
use crate::services::patterns::PatternSet;
use crate::utils::{normalize_whitespace, resolve_link};

/// Titles shorter than this are never job titles.
const MIN_TITLE_CHARS: usize = 3;

/// Extracts candidate job postings from listing pages.
#[derive(Debug, Clone)]
pub struct JobExtractor {
    patterns: PatternSet,
    fallback_threshold: usize,
}

impl JobExtractor {
    /// Create an extractor with the built-in patterns plus configured extras.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            patterns: PatternSet::new(config),
            fallback_threshold: config.fallback_threshold,
        }
    }

    /// Parse raw HTML fetched from `source.url` and extract its postings.
    pub fn extract_html(&self, html: &str, source: &Source) -> Result<Vec<Posting>> {
        let page_url = Url::parse(&source.url)?;
        let document = Html::parse_document(html);
        Ok(self.extract(&document, &page_url, source))
    }

    /// Extract postings from a parsed document.
    pub fn extract(&self, document: &Html, page_url: &Url, source: &Source) -> Vec<Posting> {
        let base = self.document_base(document, page_url);
        let mut seen_urls = HashSet::new();
        let mut postings = Vec::new();

        for named in &self.patterns.listing {
            for link in document.select(&named.selector) {
                if let Some(posting) = self.process_link(link, source, &base, &mut seen_urls) {
                    postings.push(posting);
                }
            }
        }

        let structural = postings.len();
        if structural < self.fallback_threshold {
            if let Some(anchor) = &self.patterns.anchor {
                for link in document.select(anchor) {
                    let is_job_link = link
                        .value()
                        .attr("href")
                        .and_then(|href| resolve_link(&base, href))
                        .is_some_and(|url| self.patterns.is_job_url(url.as_str()));
                    if !is_job_link {
                        continue;
                    }
                    if let Some(posting) = self.process_link(link, source, &base, &mut seen_urls) {
                        postings.push(posting);
                    }
                }
            }
        }

        log::debug!(
            "{}: {} postings ({} structural, {} from URL fallback)",
            source.name,
            postings.len(),
            structural,
            postings.len() - structural
        );
        postings
    }

    /// Turn one link element into a posting, or reject it.
    fn process_link(
        &self,
        link: ElementRef<'_>,
        source: &Source,
        base: &Url,
        seen_urls: &mut HashSet<String>,
    ) -> Option<Posting> {
        let href = link.value().attr("href")?;
        let url = resolve_link(base, href)?.to_string();
        if !seen_urls.insert(url.clone()) {
            return None;
        }

        let title = self.extract_title(link)?;
        if title.chars().count() < MIN_TITLE_CHARS || PatternSet::is_generic_text(&title) {
            return None;
        }
        if !source.accepts_title(&title) {
            return None;
        }

        let description = self.extract_description(link);

        Some(Posting::new(title, url, &source.name).with_description(description))
    }

    /// Title from a title-bearing child, the link text, or its attributes.
    fn extract_title(&self, link: ElementRef<'_>) -> Option<String> {
        self.patterns
            .titles
            .iter()
            .filter_map(|selector| link.select(selector).next())
            .map(element_text)
            .find(|text| !text.is_empty())
            .or_else(|| Some(element_text(link)).filter(|text| !text.is_empty()))
            .or_else(|| attr_text(link, "title"))
            .or_else(|| attr_text(link, "aria-label"))
    }

    /// First description-like element inside the link's parent.
    fn extract_description(&self, link: ElementRef<'_>) -> Option<String> {
        let selector = self.patterns.description.as_ref()?;
        let parent = link.parent().and_then(ElementRef::wrap)?;
        parent
            .select(selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
    }

    /// The page URL, or the document's `<base href>` resolved against it.
    fn document_base(&self, document: &Html, page_url: &Url) -> Url {
        self.patterns
            .base
            .as_ref()
            .and_then(|selector| document.select(selector).next())
            .and_then(|base| base.value().attr("href"))
            .and_then(|href| page_url.join(href.trim()).ok())
            .unwrap_or_else(|| page_url.clone())
    }
}

impl Default for JobExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn attr_text(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(normalize_whitespace)
        .filter(|text| !text.is_empty())
}
