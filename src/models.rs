use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChannelId = i64;
pub type StreamId = i64;

// --- Channel models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelStatus {
    Live,
    Offline,
    Creating,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Live => "LIVE",
            ChannelStatus::Offline => "OFFLINE",
            ChannelStatus::Creating => "CREATING",
            ChannelStatus::Error => "ERROR",
            ChannelStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelType {
    Basic,
    #[default]
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LatencyMode {
    Normal,
    #[default]
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub channel_arn: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub latency_mode: LatencyMode,
    #[serde(default)]
    pub authorized: bool,
    #[serde(default)]
    pub recording_configuration_arn: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub status: ChannelStatus,
    #[serde(default)]
    pub current_viewers: Option<u64>,
    #[serde(default)]
    pub total_viewers: Option<u64>,
    #[serde(default)]
    pub last_stream_start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_stream_end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub stream_key: Option<String>,
    #[serde(default)]
    pub ingest_endpoint: Option<String>,
    #[serde(default)]
    pub playback_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Channel {
    pub fn is_live(&self) -> bool {
        self.status == ChannelStatus::Live
    }
}

/// Body of channel create and update calls. Blank optional fields are left
/// out of the JSON rather than sent as empty strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub latency_mode: LatencyMode,
    #[serde(default)]
    pub authorized: bool,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub recording_configuration_arn: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub tags: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

// --- Stream models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamState {
    Live,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: StreamId,
    pub channel_arn: String,
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: StreamState,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub viewer_count: Option<u64>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// --- Dashboard models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_channels: usize,
    pub live_channels: usize,
    pub live_streams: usize,
    pub total_viewers: u64,
}

impl DashboardStats {
    /// Viewer total is taken over `live_channels` only, never the full list.
    pub fn from_lists(all: &[Channel], live_channels: &[Channel], live_streams: &[Stream]) -> Self {
        Self {
            total_channels: all.len(),
            live_channels: live_channels.len(),
            live_streams: live_streams.len(),
            total_viewers: live_channels
                .iter()
                .map(|c| c.current_viewers.unwrap_or(0))
                .sum(),
        }
    }
}

// --- Backend error body ---

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
