use super::{Outcome, PageStatus, CONFIRM_DELETE};
use crate::api::DEFAULT_HISTORY_LIMIT;
use crate::client::ApiClient;
use crate::components::{
    enum_label, format_date, status_badge, Badge, StreamHistoryEntry, DETAIL_DATE,
};
use crate::error::ApiError;
use crate::lifecycle::{Commit, Resource};
use crate::models::{Channel, ChannelId, Stream};
use crate::routes::Route;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

const LOAD_FAILED: &str = "Failed to load channel details. Please try again.";
const DELETE_FAILED: &str = "Failed to delete channel. Please try again.";
const SYNC_FAILED: &str = "Failed to sync channel. Please try again.";
pub const EDIT_PLACEHOLDER: &str = "Edit functionality would be implemented here";
const STREAM_KEY_WARNING: &str =
    "Keep your stream key secure. Anyone with this key can stream to your channel.";

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDetail {
    pub channel: Channel,
    pub history: Vec<Stream>,
}

/// History is best effort: a failed history call leaves the page with an
/// empty list rather than failing it.
async fn fetch_detail(api: &ApiClient, id: ChannelId) -> Result<ChannelDetail, ApiError> {
    let channel = api.channels().get(id).await?;
    let history = api
        .streams()
        .history(&channel.channel_arn, DEFAULT_HISTORY_LIMIT)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Stream history for channel {} unavailable: {}", id, e);
            Vec::new()
        });
    Ok(ChannelDetail { channel, history })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ChannelDetailAction {
    Refresh,
    Sync,
    Delete {
        #[serde(default)]
        confirmed: bool,
    },
    Edit,
    Watch,
    Back,
    DismissError,
    DismissNotice,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub status: Badge,
    pub channel_arn: String,
    pub channel_type: String,
    pub latency_mode: String,
    pub authorized: &'static str,
    pub created: String,
    pub updated: String,
    pub last_stream: String,
    pub current_viewers: Option<u64>,
    pub description: Option<String>,
    pub watch_href: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingConfig {
    pub ingest_endpoint: Option<String>,
    pub stream_key: Option<String>,
    pub stream_key_warning: &'static str,
    pub playback_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDetailView {
    #[serde(flatten)]
    pub status: PageStatus,
    pub notice: Option<String>,
    pub back_href: String,
    pub channel: Option<ChannelInfo>,
    pub streaming: Option<StreamingConfig>,
    pub history: Vec<StreamHistoryEntry>,
    pub no_history: Option<&'static str>,
}

impl ChannelInfo {
    fn new(channel: &Channel) -> Self {
        let live = channel.is_live();
        Self {
            id: channel.id,
            name: channel.name.clone(),
            status: status_badge(channel.status),
            channel_arn: channel.channel_arn.clone(),
            channel_type: enum_label(&channel.channel_type),
            latency_mode: enum_label(&channel.latency_mode),
            authorized: if channel.authorized { "Yes" } else { "No" },
            created: format_date(channel.created_at, DETAIL_DATE),
            updated: format_date(channel.updated_at, DETAIL_DATE),
            last_stream: format_date(channel.last_stream_start_time, DETAIL_DATE),
            current_viewers: live.then(|| channel.current_viewers.unwrap_or(0)),
            description: channel.description.clone().filter(|d| !d.is_empty()),
            watch_href: live.then(|| Route::Player(channel.channel_arn.clone()).path()),
        }
    }
}

/// `/channels/{id}`: one channel, its ingest settings and recent streams.
pub struct ChannelDetailPage {
    id: ChannelId,
    api: ApiClient,
    detail: Resource<ChannelDetail>,
    notice: RwLock<Option<String>>,
}

impl ChannelDetailPage {
    pub fn new(api: ApiClient, id: ChannelId) -> Self {
        Self {
            id,
            api,
            detail: Resource::new(),
            notice: RwLock::new(None),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub async fn mount(&self) {
        self.fetch().await;
    }

    pub fn unmount(&self) {
        self.detail.unmount();
    }

    pub async fn fetch(&self) -> Commit {
        self.detail
            .load(
                "Error fetching channel details",
                LOAD_FAILED,
                fetch_detail(&self.api, self.id),
            )
            .await
    }

    pub async fn act(&self, action: ChannelDetailAction) -> Outcome {
        match action {
            ChannelDetailAction::Refresh => {
                self.fetch().await;
            }
            ChannelDetailAction::Sync => match self.api.channels().sync(self.id).await {
                Ok(()) => {
                    self.fetch().await;
                }
                Err(e) => self.detail.fail("Error syncing channel", SYNC_FAILED, &e).await,
            },
            ChannelDetailAction::Delete { confirmed } => {
                if !confirmed {
                    return Outcome::Confirm(CONFIRM_DELETE);
                }
                match self.api.channels().delete(self.id).await {
                    Ok(()) => {
                        tracing::info!("Channel {} deleted", self.id);
                        return Outcome::Navigate(Route::Channels);
                    }
                    Err(e) => {
                        self.detail
                            .fail("Error deleting channel", DELETE_FAILED, &e)
                            .await
                    }
                }
            }
            ChannelDetailAction::Edit => {
                *self.notice.write().await = Some(EDIT_PLACEHOLDER.to_string());
            }
            ChannelDetailAction::Watch => {
                if let Some(detail) = self.detail.data().await {
                    return Outcome::Navigate(Route::Player(detail.channel.channel_arn));
                }
            }
            ChannelDetailAction::Back => return Outcome::Navigate(Route::Channels),
            ChannelDetailAction::DismissError => self.detail.dismiss_banner().await,
            ChannelDetailAction::DismissNotice => *self.notice.write().await = None,
        }
        Outcome::Render
    }

    pub async fn view(&self) -> ChannelDetailView {
        let snapshot = self.detail.snapshot().await;
        let data = snapshot.lifecycle.data();
        let history: Vec<StreamHistoryEntry> = data
            .map(|d| d.history.iter().map(StreamHistoryEntry::new).collect())
            .unwrap_or_default();

        ChannelDetailView {
            status: PageStatus::of(&snapshot),
            notice: self.notice.read().await.clone(),
            back_href: Route::Channels.path(),
            channel: data.map(|d| ChannelInfo::new(&d.channel)),
            streaming: data.map(|d| StreamingConfig {
                ingest_endpoint: d.channel.ingest_endpoint.clone(),
                stream_key: d.channel.stream_key.clone(),
                stream_key_warning: STREAM_KEY_WARNING,
                playback_url: d.channel.playback_url.clone(),
            }),
            no_history: (data.is_some() && history.is_empty())
                .then_some("No stream history available."),
            history,
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
    use std::sync::Arc;

    fn seeded() -> Arc<Backend> {
        let backend = Arc::new(Backend::default());
        let mut c = channel(5, ChannelStatus::Live);
        c.authorized = true;
        c.stream_key = Some("sk_live_secret".to_string());
        let arn = c.channel_arn.clone();
        *backend.channels.lock().unwrap() = vec![c];
        *backend.history.lock().unwrap() = (1..=12).map(|id| stream(id, &arn)).collect();
        backend
    }

    async fn mounted(backend: &Arc<Backend>, id: ChannelId) -> ChannelDetailPage {
        let page = ChannelDetailPage::new(testkit::start(backend.clone()).await, id);
        page.mount().await;
        page
    }

    #[tokio::test]
    async fn loads_channel_with_limited_history() {
        let backend = seeded();
        let page = mounted(&backend, 5).await;
        let view = page.view().await;

        let info = view.channel.unwrap();
        assert_eq!(info.authorized, "Yes");
        assert_eq!(info.channel_type, "STANDARD");
        assert_eq!(info.current_viewers, Some(0));
        assert_eq!(
            view.streaming.unwrap().stream_key.as_deref(),
            Some("sk_live_secret")
        );
        assert_eq!(view.history.len(), 10);
        assert_eq!(view.no_history, None);
    }

    #[tokio::test]
    async fn history_failure_yields_empty_history() {
        let backend = seeded();
        backend.fail("GET /streams/history", StatusCode::INTERNAL_SERVER_ERROR, None);
        let page = mounted(&backend, 5).await;
        let view = page.view().await;

        assert_eq!(view.status.state, "loaded");
        assert!(view.history.is_empty());
        assert_eq!(view.no_history, Some("No stream history available."));
    }

    #[tokio::test]
    async fn missing_channel_fails_the_page() {
        let page = mounted(&seeded(), 99).await;
        let view = page.view().await;
        assert_eq!(view.status.state, "failed");
        assert_eq!(view.status.error.as_deref(), Some(LOAD_FAILED));
        assert!(view.channel.is_none());
    }

    #[tokio::test]
    async fn delete_navigates_back_to_the_list() {
        let backend = seeded();
        let page = mounted(&backend, 5).await;

        assert_eq!(
            page.act(ChannelDetailAction::Delete { confirmed: false }).await,
            Outcome::Confirm(CONFIRM_DELETE)
        );
        assert_eq!(
            page.act(ChannelDetailAction::Delete { confirmed: true }).await,
            Outcome::Navigate(Route::Channels)
        );
        assert!(backend.channels.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_only_shows_a_notice() {
        let backend = seeded();
        let page = mounted(&backend, 5).await;

        assert_eq!(page.act(ChannelDetailAction::Edit).await, Outcome::Render);
        assert_eq!(page.view().await.notice.as_deref(), Some(EDIT_PLACEHOLDER));
        assert_eq!(backend.hits("GET /channels/{id}"), 1);

        page.act(ChannelDetailAction::DismissNotice).await;
        assert_eq!(page.view().await.notice, None);
    }

    #[tokio::test]
    async fn sync_refetches_and_watch_opens_player() {
        let backend = seeded();
        let page = mounted(&backend, 5).await;

        page.act(ChannelDetailAction::Sync).await;
        assert_eq!(backend.hits("POST /channels/{id}/sync"), 1);
        assert_eq!(backend.hits("GET /channels/{id}"), 2);

        let arn = channel(5, ChannelStatus::Live).channel_arn;
        assert_eq!(
            page.act(ChannelDetailAction::Watch).await,
            Outcome::Navigate(Route::Player(arn))
        );
    }

    #[tokio::test]
    async fn failed_sync_keeps_channel_on_screen() {
        let backend = seeded();
        let page = mounted(&backend, 5).await;
        backend.fail("POST /channels/{id}/sync", StatusCode::BAD_REQUEST, Some("Channel not found in IVS"));

        page.act(ChannelDetailAction::Sync).await;
        let view = page.view().await;
        assert!(view.channel.is_some());
        assert_eq!(view.status.error.as_deref(), Some("Channel not found in IVS"));
    }
}
