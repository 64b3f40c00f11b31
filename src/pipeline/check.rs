// src/pipeline/check.rs

//! One check cycle: fetch → extract → dedup → notify → persist.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, DeliveryPolicy, Posting, SeenSet, Source};
use crate::services::{HttpFetcher, JobExtractor, Notifier, PageFetcher, TelegramNotifier};
use crate::storage::{LocalStorage, SeenStorage};

/// Summary of a check cycle.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    pub sources_checked: usize,
    pub source_failures: usize,
    pub postings_found: usize,
    pub new_postings: Vec<Posting>,
    pub notified: usize,
    pub notify_failures: usize,
}

/// Owns everything a scheduler run needs: sources, collaborators and the
/// in-memory seen set.
pub struct Monitor {
    sources: Vec<Source>,
    delivery: DeliveryPolicy,
    source_delay: Duration,
    notify_delay: Duration,
    fetcher: Box<dyn PageFetcher>,
    extractor: JobExtractor,
    notifier: Option<Box<dyn Notifier>>,
    storage: Box<dyn SeenStorage>,
    seen: SeenSet,
}

impl Monitor {
    /// Build a monitor from explicit collaborators and load the seen set.
    pub async fn new(
        config: &Config,
        fetcher: Box<dyn PageFetcher>,
        notifier: Option<Box<dyn Notifier>>,
        storage: Box<dyn SeenStorage>,
    ) -> Result<Self> {
        let seen = storage.load_seen().await?;
        log::info!("Loaded {} previously seen postings", seen.len());

        Ok(Self {
            sources: config.sources.clone(),
            delivery: config.delivery,
            source_delay: config.scraper.source_delay(),
            notify_delay: config.notifier.delay(),
            fetcher,
            extractor: JobExtractor::new(&config.extraction),
            notifier,
            storage,
            seen,
        })
    }

    /// Build a monitor with the HTTP fetcher, Telegram (when configured) and
    /// file storage under `config.data_dir`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.scraper)?;
        let notifier: Option<Box<dyn Notifier>> = match config.telegram_credentials() {
            Some((token, chat_id)) => Some(Box::new(TelegramNotifier::new(
                token,
                chat_id,
                &config.notifier,
            )?)),
            None => {
                log::warn!("Telegram credentials missing, notifications are disabled");
                None
            }
        };
        let storage = LocalStorage::new(&config.data_dir);

        Self::new(config, Box::new(fetcher), notifier, Box::new(storage)).await
    }

    /// The seen set as of the last completed step.
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Whether a posting has not been handled before.
    pub fn is_new(&self, posting: &Posting) -> bool {
        !self.seen.contains(&posting.id())
    }

    /// Run a single check cycle over all sources.
    ///
    /// Source failures are logged and skipped. The seen set is persisted
    /// once, after every notification of the cycle was attempted.
    pub async fn run_once(&mut self) -> Result<CheckOutcome> {
        let start_time = Utc::now();
        log::info!("Checking {} sources for new jobs...", self.sources.len());

        let mut outcome = CheckOutcome::default();
        let fresh = self.collect_new(&mut outcome).await;

        if fresh.is_empty() {
            log::info!("No new jobs found");
        } else {
            log::info!("Found {} new job(s)", fresh.len());
            self.deliver(&fresh, &mut outcome).await;
        }
        outcome.new_postings = fresh;

        self.storage.save_seen(&self.seen).await?;

        let elapsed = Utc::now() - start_time;
        log::info!(
            "Cycle done in {}s: {} sources ({} failed), {} postings, {} new, {} notified, {} notify failures",
            elapsed.num_seconds(),
            outcome.sources_checked,
            outcome.source_failures,
            outcome.postings_found,
            outcome.new_postings.len(),
            outcome.notified,
            outcome.notify_failures
        );
        Ok(outcome)
    }

    /// Check every source in turn and keep postings that were never seen.
    async fn collect_new(&self, outcome: &mut CheckOutcome) -> Vec<Posting> {
        let mut fresh = Vec::new();
        let mut fresh_ids = HashSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            if index > 0 && !self.source_delay.is_zero() {
                tokio::time::sleep(self.source_delay).await;
            }

            outcome.sources_checked += 1;
            let postings = match self.check_source(source).await {
                Ok(postings) => postings,
                Err(e) => {
                    outcome.source_failures += 1;
                    log::error!("Error checking {}: {}", source.name, e);
                    continue;
                }
            };

            outcome.postings_found += postings.len();
            for posting in postings {
                let id = posting.id();
                if self.seen.contains(&id) || !fresh_ids.insert(id) {
                    continue;
                }
                log::info!("New job found: {} at {}", posting.title, posting.company);
                fresh.push(posting);
            }
        }
        fresh
    }

    async fn check_source(&self, source: &Source) -> Result<Vec<Posting>> {
        let html = self.fetcher.fetch(&source.url).await?;
        let postings = self.extractor.extract_html(&html, source)?;
        log::info!("Found {} jobs from {}", postings.len(), source.name);
        Ok(postings)
    }

    /// Notify about each posting and record it according to the delivery policy.
    async fn deliver(&mut self, postings: &[Posting], outcome: &mut CheckOutcome) {
        let record_failures = self.delivery == DeliveryPolicy::AtMostOnce;

        let Some(notifier) = self.notifier.as_deref() else {
            log::warn!(
                "Telegram not configured, skipping {} notifications",
                postings.len()
            );
            if record_failures {
                for posting in postings {
                    self.seen.insert(posting.id());
                }
            }
            return;
        };

        for (index, posting) in postings.iter().enumerate() {
            if index > 0 && !self.notify_delay.is_zero() {
                tokio::time::sleep(self.notify_delay).await;
            }

            match notifier.notify(posting).await {
                Ok(()) => {
                    outcome.notified += 1;
                    log::info!("Notification sent for: {}", posting.title);
                    self.seen.insert(posting.id());
                }
                Err(e) => {
                    outcome.notify_failures += 1;
                    log::error!("Failed to notify about {}: {}", posting.title, e);
                    if record_failures {
                        self.seen.insert(posting.id());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::AppError;

    pub(crate) const ACME_PAGE: &str = r#"<html><body>
        <div class="posting-title"><a href="/jobs/123">Backend Engineer</a></div>
    </body></html>"#;

    /// Serves fixed pages; unknown URLs fail like an unreachable host.
    #[derive(Default)]
    pub(crate) struct StaticFetcher {
        pages: HashMap<String, String>,
        pub(crate) calls: Arc<AtomicUsize>,
    }

    impl StaticFetcher {
        pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::fetch(url, "connection refused"))
        }
    }

    /// Records titles it was asked to send; optionally fails every send.
    #[derive(Default, Clone)]
    pub(crate) struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, posting: &Posting) -> Result<()> {
            self.sent.lock().unwrap().push(posting.title.clone());
            if self.fail {
                Err(AppError::notify("Telegram returned 502 Bad Gateway"))
            } else {
                Ok(())
            }
        }
    }

    pub(crate) fn test_config(sources: Vec<Source>) -> Config {
        let mut config = Config::default();
        config.sources = sources;
        config.scraper.source_delay_ms = 0;
        config.notifier.delay_ms = 0;
        config
    }

    fn acme() -> Source {
        Source::new("Acme", "https://acme.test/careers")
    }

    async fn monitor(
        config: &Config,
        fetcher: StaticFetcher,
        notifier: Option<RecordingNotifier>,
        dir: &TempDir,
    ) -> Monitor {
        let notifier = notifier.map(|n| Box::new(n) as Box<dyn Notifier>);
        Monitor::new(
            config,
            Box::new(fetcher),
            notifier,
            Box::new(LocalStorage::new(dir.path())),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_on_first_run_then_seen() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![acme()]);
        let notifier = RecordingNotifier::default();
        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let mut monitor = monitor(&config, fetcher, Some(notifier.clone()), &tmp).await;

        let first = monitor.run_once().await.unwrap();
        assert_eq!(first.new_postings.len(), 1);
        let posting = &first.new_postings[0];
        assert_eq!(posting.url, "https://acme.test/jobs/123");
        assert_eq!(posting.title, "Backend Engineer");
        assert_eq!(posting.company, "Acme");
        assert_eq!(first.notified, 1);
        assert!(!monitor.is_new(posting));

        let second = monitor.run_once().await.unwrap();
        assert!(second.new_postings.is_empty());
        assert_eq!(second.postings_found, 1);
        assert_eq!(notifier.sent(), vec!["Backend Engineer"]);
    }

    #[tokio::test]
    async fn test_seen_set_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![acme()]);

        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let mut first = monitor(&config, fetcher, Some(RecordingNotifier::default()), &tmp).await;
        first.run_once().await.unwrap();
        let written = first.seen().clone();

        let stored = LocalStorage::new(tmp.path()).load_seen().await.unwrap();
        assert_eq!(stored, written);

        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let notifier = RecordingNotifier::default();
        let mut restarted = monitor(&config, fetcher, Some(notifier.clone()), &tmp).await;
        assert_eq!(restarted.seen(), &written);

        let outcome = restarted.run_once().await.unwrap();
        assert!(outcome.new_postings.is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_cycle() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![
            Source::new("Down", "https://down.test/jobs"),
            acme(),
        ]);
        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let mut monitor = monitor(&config, fetcher, Some(RecordingNotifier::default()), &tmp).await;

        let outcome = monitor.run_once().await.unwrap();
        assert_eq!(outcome.sources_checked, 2);
        assert_eq!(outcome.source_failures, 1);
        assert_eq!(outcome.new_postings.len(), 1);
    }

    #[tokio::test]
    async fn test_at_most_once_records_failed_notifications() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![acme()]);
        let notifier = RecordingNotifier::failing();
        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let mut monitor = monitor(&config, fetcher, Some(notifier.clone()), &tmp).await;

        let first = monitor.run_once().await.unwrap();
        assert_eq!(first.notify_failures, 1);
        assert_eq!(monitor.seen().len(), 1);

        let second = monitor.run_once().await.unwrap();
        assert!(second.new_postings.is_empty());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_at_least_once_retries_failed_notifications() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(vec![acme()]);
        config.delivery = DeliveryPolicy::AtLeastOnce;
        let notifier = RecordingNotifier::failing();
        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let mut monitor = monitor(&config, fetcher, Some(notifier.clone()), &tmp).await;

        monitor.run_once().await.unwrap();
        assert!(monitor.seen().is_empty());

        let second = monitor.run_once().await.unwrap();
        assert_eq!(second.new_postings.len(), 1);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_without_notifier_postings_are_still_recorded() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![acme()]);
        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let mut monitor = monitor(&config, fetcher, None, &tmp).await;

        let outcome = monitor.run_once().await.unwrap();
        assert_eq!(outcome.new_postings.len(), 1);
        assert_eq!(outcome.notified, 0);
        assert_eq!(monitor.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_same_posting_from_two_sources_is_notified_once() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![
            acme(),
            Source::new("Acme Mirror", "https://acme.test/careers/"),
        ]);
        let notifier = RecordingNotifier::default();
        let fetcher = StaticFetcher::default()
            .with_page("https://acme.test/careers", ACME_PAGE)
            .with_page("https://acme.test/careers/", ACME_PAGE);
        let mut monitor = monitor(&config, fetcher, Some(notifier.clone()), &tmp).await;

        let outcome = monitor.run_once().await.unwrap();
        assert_eq!(outcome.postings_found, 2);
        assert_eq!(outcome.new_postings.len(), 1);
        assert_eq!(notifier.sent().len(), 1);
    }
}
