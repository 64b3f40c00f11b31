// src/pipeline/schedule.rs

//! Fixed-interval scheduling of check cycles.

use std::time::Duration;

use crate::pipeline::Monitor;

/// Run check cycles forever, sleeping `interval` between them.
pub async fn run_forever(monitor: &mut Monitor, interval: Duration) {
    run_every(monitor, interval, None).await
}

/// Run check cycles every `interval`, stopping after `max_cycles` if given.
///
/// A failed cycle is logged; the loop keeps going.
pub async fn run_every(monitor: &mut Monitor, interval: Duration, max_cycles: Option<usize>) {
    let minutes = interval.as_secs() / 60;
    log::info!("Starting job monitor (checking every {} minutes)", minutes);

    let mut cycles = 0usize;
    loop {
        if let Err(e) = monitor.run_once().await {
            log::error!("Error during check cycle: {}", e);
        }

        cycles += 1;
        if max_cycles.is_some_and(|max| cycles >= max) {
            break;
        }

        log::info!("Next check in {} minutes", minutes);
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use tempfile::TempDir;

    use crate::models::Source;
    use crate::pipeline::check::tests::{ACME_PAGE, StaticFetcher, test_config};
    use crate::storage::LocalStorage;

    #[tokio::test]
    async fn test_runs_requested_number_of_cycles() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(vec![Source::new("Acme", "https://acme.test/careers")]);
        let fetcher = StaticFetcher::default().with_page("https://acme.test/careers", ACME_PAGE);
        let calls = fetcher.calls.clone();

        let mut monitor = Monitor::new(
            &config,
            Box::new(fetcher),
            None,
            Box::new(LocalStorage::new(tmp.path())),
        )
        .await
        .unwrap();

        run_every(&mut monitor, Duration::ZERO, Some(3)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(monitor.seen().len(), 1);
    }
}
