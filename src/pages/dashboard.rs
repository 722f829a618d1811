use super::{now, EmptyState, Outcome, PageStatus, CONFIRM_DELETE_SHORT};
use crate::client::ApiClient;
use crate::components::{ChannelCard, LiveStreamCard};
use crate::error::ApiError;
use crate::lifecycle::{Commit, Resource};
use crate::models::{Channel, ChannelId, DashboardStats, Stream};
use crate::routes::Route;
use serde::{Deserialize, Serialize};

const LOAD_FAILED: &str = "Failed to load dashboard data. Please try again.";
const SYNC_ALL_FAILED: &str = "Failed to sync data. Please try again.";
const DELETE_FAILED: &str = "Failed to delete channel. Please try again.";
const SYNC_FAILED: &str = "Failed to sync channel. Please try again.";

const RECENT_CHANNELS: usize = 5;
const LIVE_PREVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent_channels: Vec<Channel>,
    pub live_streams: Vec<Stream>,
}

async fn fetch_data(api: &ApiClient) -> Result<DashboardData, ApiError> {
    let stats = api.dashboard().stats().await?;
    let channels = api.channels().list().await?;
    let live = api.streams().live().await?;
    Ok(DashboardData {
        stats,
        recent_channels: channels.into_iter().take(RECENT_CHANNELS).collect(),
        live_streams: live.into_iter().take(LIVE_PREVIEW).collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DashboardAction {
    Refresh,
    SyncAll,
    Sync {
        id: ChannelId,
    },
    Delete {
        id: ChannelId,
        #[serde(default)]
        confirmed: bool,
    },
    Edit {
        id: ChannelId,
    },
    DismissError,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(flatten)]
    pub status: PageStatus,
    pub stats: DashboardStats,
    pub recent_channels: Vec<ChannelCard>,
    pub live_streams: Vec<LiveStreamCard>,
    pub all_channels_href: String,
    pub all_streams_href: String,
    pub no_channels: Option<EmptyState>,
    pub no_live_streams: Option<EmptyState>,
}

/// `/`: headline counters and short previews of channels and live streams.
/// Every mutation re-fetches the whole page.
pub struct DashboardPage {
    api: ApiClient,
    data: Resource<DashboardData>,
}

impl DashboardPage {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            data: Resource::new(),
        }
    }

    pub async fn mount(&self) {
        self.fetch().await;
    }

    pub fn unmount(&self) {
        self.data.unmount();
    }

    pub async fn fetch(&self) -> Commit {
        self.data
            .load("Error fetching dashboard data", LOAD_FAILED, fetch_data(&self.api))
            .await
    }

    pub async fn act(&self, action: DashboardAction) -> Outcome {
        match action {
            DashboardAction::Refresh => {
                self.fetch().await;
            }
            DashboardAction::SyncAll => match self.sync_everything().await {
                Ok(()) => {
                    self.fetch().await;
                }
                Err(e) => self.data.fail("Error syncing data", SYNC_ALL_FAILED, &e).await,
            },
            DashboardAction::Sync { id } => match self.api.channels().sync(id).await {
                Ok(()) => {
                    self.fetch().await;
                }
                Err(e) => self.data.fail("Error syncing channel", SYNC_FAILED, &e).await,
            },
            DashboardAction::Delete { id, confirmed } => {
                if !confirmed {
                    return Outcome::Confirm(CONFIRM_DELETE_SHORT);
                }
                match self.api.channels().delete(id).await {
                    Ok(()) => {
                        tracing::info!("Channel {} deleted", id);
                        self.fetch().await;
                    }
                    Err(e) => {
                        self.data
                            .fail("Error deleting channel", DELETE_FAILED, &e)
                            .await
                    }
                }
            }
            DashboardAction::Edit { id } => return Outcome::Navigate(Route::ChannelDetail(id)),
            DashboardAction::DismissError => self.data.dismiss_banner().await,
        }
        Outcome::Render
    }

    async fn sync_everything(&self) -> Result<(), ApiError> {
        self.api.channels().sync_all().await?;
        self.api.streams().sync_all().await
    }

    pub async fn view(&self) -> DashboardView {
        let snapshot = self.data.snapshot().await;
        let data = snapshot.lifecycle.data();
        let now = now();

        let recent_channels: Vec<ChannelCard> = data
            .map(|d| d.recent_channels.iter().map(ChannelCard::new).collect())
            .unwrap_or_default();
        let live_streams: Vec<LiveStreamCard> = data
            .map(|d| {
                d.live_streams
                    .iter()
                    .map(|s| LiveStreamCard::new(s, now))
                    .collect()
            })
            .unwrap_or_default();

        let loaded = data.is_some();
        DashboardView {
            status: PageStatus::of(&snapshot),
            stats: data.map(|d| d.stats).unwrap_or_default(),
            no_channels: (loaded && recent_channels.is_empty()).then(|| EmptyState {
                title: "No channels found. Create your first channel to get started.",
                hint: None,
                create_href: Some(Route::CreateChannel.path()),
            }),
            no_live_streams: (loaded && live_streams.is_empty()).then(|| EmptyState {
                title: "No live streams currently active.",
                hint: None,
                create_href: None,
            }),
            recent_channels,
            live_streams,
            all_channels_href: Route::Channels.path(),
            all_streams_href: Route::LiveStreams.path(),
        }
    }
}
