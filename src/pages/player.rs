use super::{now, Outcome, PageStatus};
use crate::client::ApiClient;
use crate::components::{
    enum_label, format_date, format_elapsed, health_badge, status_badge, Badge, CARD_DATE,
    DAY_DATE,
};
use crate::error::ApiError;
use crate::lifecycle::{Commit, Resource};
use crate::models::{Channel, Stream};
use crate::player::{SurfaceView, VideoEngine, VideoSurface};
use crate::poll::{Poller, PLAYER_POLL};
use crate::routes::Route;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const LOAD_FAILED: &str = "Failed to load stream information. Please try again.";
const OFFLINE_MESSAGE: &str =
    "This channel is currently not streaming. Check back later or explore other live streams.";
const PLAYBACK_NOTE: &str = "You can use the playback URL with any HLS-compatible video player or integrate it into your own applications.";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    pub channel: Channel,
    /// `None` when the channel has no current stream.
    pub stream: Option<Stream>,
}

async fn fetch_player(api: &ApiClient, channel_arn: &str) -> Result<PlayerData, ApiError> {
    let channels = api.channels();
    let streams = api.streams();
    let (channel, stream) = futures_util::join!(
        channels.get_by_arn(channel_arn),
        streams.by_channel(channel_arn)
    );
    let stream = match stream {
        Ok(stream) => Some(stream),
        Err(e) if e.is_not_found() => {
            tracing::debug!("No current stream for {}", channel_arn);
            None
        }
        Err(e) => {
            tracing::warn!("Error fetching current stream for {}: {}", channel_arn, e);
            None
        }
    };
    Ok(PlayerData {
        channel: channel?,
        stream,
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PlayerAction {
    Refresh,
    ViewChannel,
    Back,
    BrowseLiveStreams,
    DismissError,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub channel: String,
    pub description: Option<String>,
    pub channel_type: String,
    pub latency_mode: String,
    pub title: Option<String>,
    pub started: Option<String>,
    pub duration: Option<String>,
    pub health: Option<Badge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_viewers: u64,
    pub created: String,
    pub last_stream: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackInfo {
    pub playback_url: Option<String>,
    pub channel_arn: String,
    pub note: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineNotice {
    pub title: &'static str,
    pub message: &'static str,
    pub browse_href: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    #[serde(flatten)]
    pub status: PageStatus,
    pub title: String,
    pub badge: Option<Badge>,
    pub back_href: String,
    pub details_href: Option<String>,
    pub surface: Option<SurfaceView>,
    pub offline: Option<OfflineNotice>,
    pub stream: Option<StreamInfo>,
    pub current_viewers: Option<u64>,
    pub stats: Option<ChannelStats>,
    pub playback: Option<PlaybackInfo>,
}

/// `/player/{channelArn}`: live playback of one channel plus its stream
/// stats, re-fetched on a timer for the viewer count.
///
/// A [`VideoSurface`] exists only while the channel is live. It is replaced
/// when the playback URL changes and torn down when the channel goes offline
/// or the page unmounts.
pub struct PlayerPage {
    channel_arn: String,
    api: ApiClient,
    engine: Arc<dyn VideoEngine>,
    data: Resource<PlayerData>,
    surface: Mutex<Option<Arc<VideoSurface>>>,
    poller: Mutex<Option<Poller>>,
}

impl PlayerPage {
    pub fn new(api: ApiClient, engine: Arc<dyn VideoEngine>, channel_arn: String) -> Self {
        Self {
            channel_arn,
            api,
            engine,
            data: Resource::new(),
            surface: Mutex::new(None),
            poller: Mutex::new(None),
        }
    }

    pub fn channel_arn(&self) -> &str {
        &self.channel_arn
    }

    pub async fn mount(self: &Arc<Self>) {
        let page = Arc::downgrade(self);
        let poller = Poller::start(
            format!("player {}", self.channel_arn),
            PLAYER_POLL,
            move || {
                let page = page.clone();
                async move {
                    if let Some(page) = page.upgrade() {
                        page.fetch().await;
                    }
                }
            },
        );
        if let Ok(mut slot) = self.poller.lock() {
            *slot = Some(poller);
        }
        self.fetch().await;
    }

    pub fn unmount(&self) {
        self.data.unmount();
        if let Ok(mut slot) = self.poller.lock() {
            slot.take();
        }
        if let Some(surface) = self.take_surface() {
            surface.unmount();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|p| !p.is_stopped()))
            .unwrap_or(false)
    }

    pub async fn fetch(&self) -> Commit {
        let commit = self
            .data
            .load(
                "Error fetching stream data",
                LOAD_FAILED,
                fetch_player(&self.api, &self.channel_arn),
            )
            .await;
        if commit == Commit::Applied {
            if let Some(data) = self.data.data().await {
                self.reconcile_surface(&data.channel).await;
            }
        }
        commit
    }

    /// Bring the surface in line with the channel: one surface per playback
    /// URL while live, none otherwise.
    async fn reconcile_surface(&self, channel: &Channel) {
        if !channel.is_live() {
            if let Some(old) = self.take_surface() {
                tracing::info!("Channel {} went offline; stopping playback", channel.id);
                old.unmount();
            }
            return;
        }

        let url = channel
            .playback_url
            .clone()
            .filter(|u| !u.trim().is_empty());
        let fresh = {
            let Ok(mut slot) = self.surface.lock() else {
                return;
            };
            // Checked under the lock; `unmount` flips the flag before taking it.
            if !self.data.is_mounted() {
                return;
            }
            if slot
                .as_ref()
                .is_some_and(|s| s.playback_url() == url.as_deref())
            {
                return;
            }
            if let Some(old) = slot.take() {
                old.unmount();
            }
            let fresh = VideoSurface::new(self.engine.clone(), url, true);
            *slot = Some(fresh.clone());
            fresh
        };
        fresh.start().await;
    }

    fn take_surface(&self) -> Option<Arc<VideoSurface>> {
        self.surface.lock().ok().and_then(|mut slot| slot.take())
    }

    fn current_surface(&self) -> Option<Arc<VideoSurface>> {
        self.surface.lock().ok().and_then(|slot| slot.clone())
    }

    pub async fn act(&self, action: PlayerAction) -> Outcome {
        match action {
            PlayerAction::Refresh => {
                self.fetch().await;
            }
            PlayerAction::ViewChannel => {
                if let Some(data) = self.data.data().await {
                    return Outcome::Navigate(Route::ChannelDetail(data.channel.id));
                }
            }
            PlayerAction::Back | PlayerAction::BrowseLiveStreams => {
                return Outcome::Navigate(Route::LiveStreams)
            }
            PlayerAction::DismissError => self.data.dismiss_banner().await,
        }
        Outcome::Render
    }

    pub async fn view(&self) -> PlayerView {
        let snapshot = self.data.snapshot().await;
        let status = PageStatus::of(&snapshot);
        let back_href = Route::LiveStreams.path();

        let Some(PlayerData { channel, stream }) = snapshot.lifecycle.data() else {
            return PlayerView {
                status,
                title: "Stream Player".to_string(),
                badge: None,
                back_href,
                details_href: None,
                surface: None,
                offline: None,
                stream: None,
                current_viewers: None,
                stats: None,
                playback: None,
            };
        };

        let live = channel.is_live();
        let now = now();
        PlayerView {
            status,
            title: channel.name.clone(),
            badge: Some(status_badge(channel.status)),
            back_href,
            details_href: Some(Route::ChannelDetail(channel.id).path()),
            surface: self.current_surface().map(|s| s.view()),
            offline: (!live).then(|| OfflineNotice {
                title: "Stream Offline",
                message: OFFLINE_MESSAGE,
                browse_href: Route::LiveStreams.path(),
            }),
            stream: live.then(|| StreamInfo {
                channel: channel.name.clone(),
                description: channel.description.clone().filter(|d| !d.is_empty()),
                channel_type: enum_label(&channel.channel_type),
                latency_mode: enum_label(&channel.latency_mode),
                title: stream
                    .as_ref()
                    .and_then(|s| s.title.clone())
                    .filter(|t| !t.is_empty()),
                started: stream.as_ref().map(|s| format_date(s.start_time, CARD_DATE)),
                duration: stream.as_ref().map(|s| format_elapsed(s.start_time, now)),
                health: stream.as_ref().map(|s| health_badge(s.health.as_deref())),
            }),
            current_viewers: live.then(|| channel.current_viewers.unwrap_or(0)),
            stats: Some(ChannelStats {
                total_viewers: channel.total_viewers.unwrap_or(0),
                created: format_date(channel.created_at, DAY_DATE),
                last_stream: channel
                    .last_stream_start_time
                    .map(|t| t.format(DAY_DATE).to_string()),
            }),
            playback: Some(PlaybackInfo {
                playback_url: channel.playback_url.clone(),
                channel_arn: channel.channel_arn.clone(),
                note: PLAYBACK_NOTE,
            }),
        }
    }
}

impl Drop for PlayerPage {
    fn drop(&mut self) {
        self.unmount();
    }
}
