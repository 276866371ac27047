use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::shutdown::ShutdownToken;
use crate::rpc::client::TorrentBackend;
use crate::sweep::tracker::CompletionTracker;
use crate::utils::time::current_timestamp;

/// Drive fetch -> reconcile -> sleep until shutdown is requested.
///
/// One cycle runs to completion before the next begins; a shutdown
/// request arriving mid-cycle lets the in-flight pass finish, then the
/// loop exits without starting another poll. The between-poll sleep is
/// interruptible, so shutdown latency is bounded by signal delivery, not
/// by the poll interval.
pub async fn run_poll_loop(
    backend: &dyn TorrentBackend,
    tracker: &mut CompletionTracker,
    interval: Duration,
    mut token: ShutdownToken,
) {
    info!(interval_secs = interval.as_secs(), "Poll loop started");

    loop {
        if token.is_cancelled() {
            break;
        }

        let now = current_timestamp();
        match backend.list_torrents().await {
            Ok(snapshot) => {
                debug!(
                    torrents = snapshot.len(),
                    tracked = tracker.tracked_count(),
                    "Reconciling snapshot"
                );
                tracker.reconcile(backend, &snapshot, now).await;
            }
            Err(error) => {
                warn!(error = %error, "Failed to fetch torrents, skipping this cycle");
            }
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = token.cancelled() => break,
        }
    }

    info!("Poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BackendError;
    use crate::core::shutdown::ShutdownHandle;
    use crate::models::torrent::TorrentSnapshot;
    use crate::sweep::policy::RemovalPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingBackend {
        polls: AtomicUsize,
        fail_lists: bool,
    }

    impl CountingBackend {
        fn new(fail_lists: bool) -> Self {
            Self {
                polls: AtomicUsize::new(0),
                fail_lists,
            }
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TorrentBackend for CountingBackend {
        async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, BackendError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lists {
                return Err(BackendError::Protocol("simulated outage".to_string()));
            }
            Ok(Vec::new())
        }

        async fn stop_torrent(&self, _id: i64) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_polls_nothing() {
        let backend = CountingBackend::new(false);
        let mut tracker = CompletionTracker::new(RemovalPolicy::Delay { minutes: 0 });
        let (handle, token) = ShutdownHandle::new();

        handle.trigger();
        run_poll_loop(&backend, &mut tracker, Duration::from_millis(5), token).await;

        assert_eq!(backend.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_loop_polls_until_shutdown() {
        let backend = Arc::new(CountingBackend::new(false));
        let (handle, token) = ShutdownHandle::new();

        let loop_backend = Arc::clone(&backend);
        let task = tokio::spawn(async move {
            let mut tracker = CompletionTracker::new(RemovalPolicy::Delay { minutes: 0 });
            run_poll_loop(
                &*loop_backend,
                &mut tracker,
                Duration::from_millis(5),
                token,
            )
            .await;
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.trigger();
        task.await.expect("poll loop task panicked");

        assert!(backend.poll_count() >= 1);
    }

    #[tokio::test]
    async fn test_transient_fetch_errors_do_not_stop_the_loop() {
        let backend = Arc::new(CountingBackend::new(true));
        let (handle, token) = ShutdownHandle::new();

        let loop_backend = Arc::clone(&backend);
        let task = tokio::spawn(async move {
            let mut tracker = CompletionTracker::new(RemovalPolicy::Delay { minutes: 0 });
            run_poll_loop(
                &*loop_backend,
                &mut tracker,
                Duration::from_millis(5),
                token,
            )
            .await;
        });

        tokio::time::sleep(Duration::from_millis(40)).await;
        handle.trigger();
        task.await.expect("poll loop task panicked");

        // Failing polls keep cycling rather than crashing the daemon
        assert!(backend.poll_count() >= 2);
    }
}
