use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

pub const LIVE_STREAMS_POLL: Duration = Duration::from_secs(30);
pub const PLAYER_POLL: Duration = Duration::from_secs(10);

/// Fixed-interval re-fetch timer owned by a mounted page.
///
/// The first tick is skipped since the page fetched on mount. Each tick
/// spawns the fetch rather than awaiting it, so a slow response never delays
/// the schedule; overlapping fetches are sorted out by the page's generation
/// counter. No backoff. Dropping the poller stops it.
pub struct Poller {
    name: String,
    stop_tx: watch::Sender<bool>,
}

impl Poller {
    pub fn start<F, Fut>(name: impl Into<String>, period: Duration, tick: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task_name = name.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => {
                        break;
                    }
                    _ = interval.tick() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                        tracing::debug!("Poller {}: tick", task_name);
                        tokio::spawn(tick());
                    }
                }
            }
            tracing::debug!("Poller {}: stopped", task_name);
        });

        tracing::info!("Poller {}: every {:?}", name, period);
        Self { name, stop_tx }
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period_after_skipping_the_first() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let poller = Poller::start("test", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(poller.name(), "test");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_ticking() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let poller = Poller::start("test", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let seen = count.load(Ordering::SeqCst);
        assert_eq!(seen, 2);

        drop(poller);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }
}
