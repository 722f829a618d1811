use super::{now, EmptyState, Outcome, PageStatus};
use crate::client::ApiClient;
use crate::components::LiveStreamCard;
use crate::lifecycle::{Commit, Resource};
use crate::models::Stream;
use crate::poll::{Poller, LIVE_STREAMS_POLL};
use crate::routes::Route;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const LOAD_FAILED: &str = "Failed to load live streams. Please try again.";
const FIND_FAILED: &str = "Failed to find channel details.";
const REFRESH_NOTE: &str = "Live streams are automatically refreshed every 30 seconds";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum LiveStreamsAction {
    Refresh,
    #[serde(rename_all = "camelCase")]
    Watch {
        channel_arn: String,
    },
    #[serde(rename_all = "camelCase")]
    ViewChannel {
        channel_arn: String,
    },
    Create,
    DismissError,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamsView {
    #[serde(flatten)]
    pub status: PageStatus,
    pub count: usize,
    pub streams: Vec<LiveStreamCard>,
    pub empty: Option<EmptyState>,
    pub refresh_note: Option<&'static str>,
}

/// `/live-streams`: every stream currently live, re-fetched on a timer
/// while mounted.
pub struct LiveStreamsPage {
    api: ApiClient,
    streams: Resource<Vec<Stream>>,
    poller: Mutex<Option<Poller>>,
}

impl LiveStreamsPage {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            streams: Resource::new(),
            poller: Mutex::new(None),
        }
    }

    pub async fn mount(self: &Arc<Self>) {
        let page = Arc::downgrade(self);
        let poller = Poller::start("live-streams", LIVE_STREAMS_POLL, move || {
            let page = page.clone();
            async move {
                if let Some(page) = page.upgrade() {
                    page.fetch().await;
                }
            }
        });
        if let Ok(mut slot) = self.poller.lock() {
            *slot = Some(poller);
        }
        self.fetch().await;
    }

    pub fn unmount(&self) {
        self.streams.unmount();
        if let Ok(mut slot) = self.poller.lock() {
            slot.take();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|p| !p.is_stopped()))
            .unwrap_or(false)
    }

    pub async fn fetch(&self) -> Commit {
        self.streams
            .load(
                "Error fetching live streams",
                LOAD_FAILED,
                self.api.streams().live(),
            )
            .await
    }

    pub async fn act(&self, action: LiveStreamsAction) -> Outcome {
        match action {
            LiveStreamsAction::Refresh => {
                self.fetch().await;
            }
            LiveStreamsAction::Watch { channel_arn } => {
                return Outcome::Navigate(Route::Player(channel_arn))
            }
            LiveStreamsAction::ViewChannel { channel_arn } => {
                match self.api.channels().get_by_arn(&channel_arn).await {
                    Ok(channel) => return Outcome::Navigate(Route::ChannelDetail(channel.id)),
                    Err(e) => {
                        tracing::error!("Error finding channel {}: {}", channel_arn, e);
                        self.streams.set_banner(FIND_FAILED.to_string()).await;
                    }
                }
            }
            LiveStreamsAction::Create => return Outcome::Navigate(Route::CreateChannel),
            LiveStreamsAction::DismissError => self.streams.dismiss_banner().await,
        }
        Outcome::Render
    }

    pub async fn view(&self) -> LiveStreamsView {
        let snapshot = self.streams.snapshot().await;
        let now = now();
        let streams: Vec<LiveStreamCard> = snapshot
            .lifecycle
            .data()
            .map(|list| list.iter().map(|s| LiveStreamCard::new(s, now)).collect())
            .unwrap_or_default();
        let loaded = snapshot.lifecycle.data().is_some();

        LiveStreamsView {
            status: PageStatus::of(&snapshot),
            count: streams.len(),
            empty: (loaded && streams.is_empty()).then(|| EmptyState {
                title: "No Live Streams",
                hint: Some(
                    "There are currently no active live streams. Create a channel and start streaming to see them here.",
                ),
                create_href: Some(Route::CreateChannel.path()),
            }),
            refresh_note: (!streams.is_empty()).then_some(REFRESH_NOTE),
            streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{channel, stream};
    use crate::models::ChannelStatus;
    use crate::pages::testkit::{self, Backend};
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn seeded() -> Arc<Backend> {
        let backend = Arc::new(Backend::default());
        let c = channel(8, ChannelStatus::Live);
        *backend.live_streams.lock().unwrap() = vec![stream(1, &c.channel_arn)];
        *backend.channels.lock().unwrap() = vec![c];
        backend
    }

    async fn mounted(backend: &Arc<Backend>) -> Arc<LiveStreamsPage> {
        let page = Arc::new(LiveStreamsPage::new(testkit::start(backend.clone()).await));
        page.mount().await;
        page
    }

    #[tokio::test]
    async fn mount_fetches_and_starts_polling() {
        let backend = seeded();
        let page = mounted(&backend).await;

        let view = page.view().await;
        assert_eq!(view.count, 1);
        assert_eq!(view.refresh_note, Some(REFRESH_NOTE));
        assert!(page.is_polling());

        page.unmount();
        assert!(!page.is_polling());
    }

    #[tokio::test]
    async fn timer_refetches_every_thirty_seconds_until_unmounted() {
        let backend = seeded();
        let page = mounted(&backend).await;
        tokio::time::pause();

        tokio::time::advance(LIVE_STREAMS_POLL - Duration::from_secs(1)).await;
        testkit::settle().await;
        assert_eq!(backend.hits("GET /streams/live"), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(testkit::spin_until(|| backend.hits("GET /streams/live") == 2).await);

        page.unmount();
        tokio::time::advance(LIVE_STREAMS_POLL * 3).await;
        testkit::settle().await;
        assert_eq!(backend.hits("GET /streams/live"), 2);
    }

    #[tokio::test]
    async fn manual_refresh_wins_over_slower_poll_fetch() {
        let backend = seeded();
        let page = mounted(&backend).await;
        let arn = channel(8, ChannelStatus::Live).channel_arn;

        // A tick's fetch reads the one-stream list, then stalls.
        let gate = backend.gate("GET /streams/live");
        let tick = tokio::spawn({
            let page = page.clone();
            async move { page.fetch().await }
        });
        while backend.hits("GET /streams/live") < 2 {
            tokio::task::yield_now().await;
        }

        // The operator refreshes after a second stream went live.
        backend.live_streams.lock().unwrap().push(stream(2, &arn));
        page.act(LiveStreamsAction::Refresh).await;
        assert_eq!(page.view().await.count, 2);

        gate.notify_one();
        assert_eq!(tick.await.unwrap(), Commit::Stale);
        assert_eq!(page.view().await.count, 2);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_streams_visible() {
        let backend = seeded();
        let page = mounted(&backend).await;
        backend.fail("GET /streams/live", StatusCode::INTERNAL_SERVER_ERROR, None);

        page.act(LiveStreamsAction::Refresh).await;
        let view = page.view().await;
        assert_eq!(view.count, 1);
        assert_eq!(view.status.error.as_deref(), Some(LOAD_FAILED));

        backend.heal("GET /streams/live");
        page.act(LiveStreamsAction::Refresh).await;
        assert_eq!(page.view().await.status.error, None);
    }

    #[tokio::test]
    async fn view_channel_resolves_arn_to_detail_route() {
        let backend = seeded();
        let page = mounted(&backend).await;
        let arn = channel(8, ChannelStatus::Live).channel_arn;

        assert_eq!(
            page.act(LiveStreamsAction::ViewChannel { channel_arn: arn.clone() }).await,
            Outcome::Navigate(Route::ChannelDetail(8))
        );
        assert_eq!(
            page.act(LiveStreamsAction::Watch { channel_arn: arn.clone() }).await,
            Outcome::Navigate(Route::Player(arn))
        );
    }

    #[tokio::test]
    async fn unknown_arn_sets_banner() {
        let backend = seeded();
        let page = mounted(&backend).await;

        let outcome = page
            .act(LiveStreamsAction::ViewChannel {
                channel_arn: "arn:aws:ivs:us-west-2:1:channel/missing".to_string(),
            })
            .await;
        assert_eq!(outcome, Outcome::Render);
        assert_eq!(page.view().await.status.error.as_deref(), Some(FIND_FAILED));
    }

    #[tokio::test]
    async fn empty_list_shows_placeholder() {
        let page = mounted(&Arc::new(Backend::default())).await;
        let view = page.view().await;
        assert!(view.empty.is_some());
        assert_eq!(view.refresh_note, None);
    }

    #[test]
    fn actions_use_camel_case_fields() {
        let action: LiveStreamsAction =
            serde_json::from_str(r#"{"action":"viewChannel","channelArn":"arn"}"#).unwrap();
        assert_eq!(
            action,
            LiveStreamsAction::ViewChannel {
                channel_arn: "arn".to_string()
            }
        );
    }
}
