use super::{EmptyState, Outcome, PageStatus, CONFIRM_DELETE};
use crate::client::ApiClient;
use crate::components::ChannelCard;
use crate::error::ApiError;
use crate::lifecycle::{Commit, Resource};
use crate::models::{Channel, ChannelId, ChannelStatus};
use crate::routes::Route;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

const LOAD_FAILED: &str = "Failed to load channels. Please try again.";
const DELETE_FAILED: &str = "Failed to delete channel. Please try again.";
const SYNC_FAILED: &str = "Failed to sync channel. Please try again.";
const SYNC_ALL_FAILED: &str = "Failed to sync channels. Please try again.";

pub const STATUS_OPTIONS: [&str; 5] = ["ALL", "LIVE", "OFFLINE", "CREATING", "ERROR"];

/// Status dropdown value: `ALL` or one exact channel status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ChannelStatus),
}

impl From<String> for StatusFilter {
    fn from(value: String) -> Self {
        let value = value.trim().to_uppercase();
        if value.is_empty() || value == "ALL" {
            return StatusFilter::All;
        }
        let status = serde_json::from_value(serde_json::Value::String(value)).unwrap_or_default();
        StatusFilter::Only(status)
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => "ALL".to_string(),
            StatusFilter::Only(status) => status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelFilter {
    pub search: String,
    pub status: StatusFilter,
}

/// Case-insensitive substring match on name or description, plus an exact
/// status match. Returns a new list; the source is never touched.
pub fn filter_channels(channels: &[Arc<Channel>], filter: &ChannelFilter) -> Vec<Arc<Channel>> {
    let term = filter.search.trim().to_lowercase();
    channels
        .iter()
        .filter(|c| {
            term.is_empty()
                || c.name.to_lowercase().contains(&term)
                || c.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&term))
        })
        .filter(|c| match filter.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => c.status == status,
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ChannelsAction {
    Refresh,
    Search {
        term: String,
    },
    FilterStatus {
        status: StatusFilter,
    },
    Sync {
        id: ChannelId,
    },
    SyncAll,
    Delete {
        id: ChannelId,
        #[serde(default)]
        confirmed: bool,
    },
    Edit {
        id: ChannelId,
    },
    Create,
    DismissError,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsView {
    #[serde(flatten)]
    pub status: PageStatus,
    pub search: String,
    pub status_filter: StatusFilter,
    pub status_options: [&'static str; 5],
    pub count: usize,
    pub cards: Vec<ChannelCard>,
    pub empty: Option<EmptyState>,
}

/// `/channels`: the full channel list with search, status filter and
/// per-card mutations.
pub struct ChannelsPage {
    api: ApiClient,
    channels: Resource<Vec<Arc<Channel>>>,
    filter: RwLock<ChannelFilter>,
}

impl ChannelsPage {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            channels: Resource::new(),
            filter: RwLock::new(ChannelFilter::default()),
        }
    }

    pub async fn mount(&self) {
        self.fetch().await;
    }

    pub fn unmount(&self) {
        self.channels.unmount();
    }

    pub async fn fetch(&self) -> Commit {
        let api = self.api.channels();
        let fetch = async {
            api.list()
                .await
                .map(|list| list.into_iter().map(Arc::new).collect())
        };
        self.channels
            .load("Error fetching channels", LOAD_FAILED, fetch)
            .await
    }

    pub async fn act(&self, action: ChannelsAction) -> Outcome {
        match action {
            ChannelsAction::Refresh => {
                self.fetch().await;
            }
            ChannelsAction::Search { term } => self.filter.write().await.search = term,
            ChannelsAction::FilterStatus { status } => self.filter.write().await.status = status,
            ChannelsAction::Sync { id } => self.sync(id).await,
            ChannelsAction::SyncAll => match self.api.channels().sync_all().await {
                Ok(()) => {
                    self.fetch().await;
                }
                Err(e) => {
                    self.channels
                        .fail("Error syncing channels", SYNC_ALL_FAILED, &e)
                        .await
                }
            },
            ChannelsAction::Delete { id, confirmed } => {
                if !confirmed {
                    return Outcome::Confirm(CONFIRM_DELETE);
                }
                self.delete(id).await;
            }
            ChannelsAction::Edit { id } => return Outcome::Navigate(Route::ChannelDetail(id)),
            ChannelsAction::Create => return Outcome::Navigate(Route::CreateChannel),
            ChannelsAction::DismissError => self.channels.dismiss_banner().await,
        }
        Outcome::Render
    }

    async fn delete(&self, id: ChannelId) {
        match self.api.channels().delete(id).await {
            Ok(()) => {
                tracing::info!("Channel {} deleted", id);
                self.channels
                    .update(|list| list.retain(|c| c.id != id))
                    .await;
            }
            Err(e) => {
                self.channels
                    .fail("Error deleting channel", DELETE_FAILED, &e)
                    .await
            }
        }
    }

    /// Sync one channel and swap in the fresh record; siblings keep their
    /// existing allocation.
    async fn sync(&self, id: ChannelId) {
        match self.sync_and_reload(id).await {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                self.channels
                    .update(|list| {
                        for slot in list.iter_mut().filter(|c| c.id == id) {
                            *slot = fresh.clone();
                        }
                    })
                    .await;
            }
            Err(e) => {
                self.channels
                    .fail("Error syncing channel", SYNC_FAILED, &e)
                    .await
            }
        }
    }

    async fn sync_and_reload(&self, id: ChannelId) -> Result<Channel, ApiError> {
        let api = self.api.channels();
        api.sync(id).await?;
        api.get(id).await
    }

    pub async fn filtered(&self) -> Vec<Arc<Channel>> {
        let source = self.channels.data().await.unwrap_or_default();
        filter_channels(&source, &*self.filter.read().await)
    }

    pub async fn view(&self) -> ChannelsView {
        let snapshot = self.channels.snapshot().await;
        let filter = self.filter.read().await.clone();
        let source = snapshot.lifecycle.data().cloned();
        let visible = source
            .as_deref()
            .map(|list| filter_channels(list, &filter))
            .unwrap_or_default();

        let empty = match &source {
            Some(list) if visible.is_empty() => Some(if list.is_empty() {
                EmptyState {
                    title: "No channels found",
                    hint: Some("Create your first channel to get started with live streaming."),
                    create_href: Some(Route::CreateChannel.path()),
                }
            } else {
                EmptyState {
                    title: "No channels found",
                    hint: Some("Try adjusting your search criteria or filters."),
                    create_href: None,
                }
            }),
            _ => None,
        };

        ChannelsView {
            status: PageStatus::of(&snapshot),
            search: filter.search,
            status_filter: filter.status,
            status_options: STATUS_OPTIONS,
            count: visible.len(),
            cards: visible.iter().map(|c| ChannelCard::new(c)).collect(),
            empty,
        }
    }
}
