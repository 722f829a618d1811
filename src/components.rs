//! Stateless view pieces shared by the pages: cards, badges, and the
//! navigation chrome. Everything here is a pure function of its input.

use crate::models::{Channel, ChannelStatus, Stream, StreamState};
use crate::routes::Route;
use chrono::NaiveDateTime;
use serde::Serialize;

pub const BRAND: &str = "Amazon IVS Platform";

pub const CARD_DATE: &str = "%b %d, %Y %H:%M";
pub const DETAIL_DATE: &str = "%b %d, %Y %H:%M:%S";
pub const SHORT_DATE: &str = "%b %d, %H:%M";
pub const DAY_DATE: &str = "%b %d, %Y";

// --- Formatting ---

pub fn format_date(value: Option<NaiveDateTime>, pattern: &str) -> String {
    value
        .map(|v| v.format(pattern).to_string())
        .unwrap_or_else(|| "Never".to_string())
}

/// "Xh Ym" once past the hour, "Ym" before; "Unknown" without a start.
pub fn format_elapsed(start: Option<NaiveDateTime>, now: NaiveDateTime) -> String {
    let Some(start) = start else {
        return "Unknown".to_string();
    };
    let minutes = (now - start).num_minutes().max(0);
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

pub fn format_seconds(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Trailing resource id of an ARN (`.../channel/AbCd` → `AbCd`).
pub fn channel_short_name(channel_arn: &str) -> &str {
    channel_arn.rsplit('/').next().unwrap_or(channel_arn)
}

// --- Badges ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub label: String,
    pub variant: &'static str,
}

impl Badge {
    fn new(label: impl Into<String>, variant: &'static str) -> Self {
        Self {
            label: label.into(),
            variant,
        }
    }
}

pub fn status_badge(status: ChannelStatus) -> Badge {
    let variant = match status {
        ChannelStatus::Live | ChannelStatus::Error => "danger",
        ChannelStatus::Creating => "warning",
        ChannelStatus::Offline | ChannelStatus::Unknown => "secondary",
    };
    Badge::new(status.as_str(), variant)
}

pub fn health_badge(health: Option<&str>) -> Badge {
    match health {
        Some("HEALTHY") => Badge::new("HEALTHY", "success"),
        Some(other) => Badge::new(other, "warning"),
        None => Badge::new("UNKNOWN", "warning"),
    }
}

fn stream_state_badge(state: StreamState) -> Badge {
    match state {
        StreamState::Live => Badge::new("LIVE", "danger"),
        StreamState::Offline => Badge::new("OFFLINE", "secondary"),
        StreamState::Unknown => Badge::new("UNKNOWN", "secondary"),
    }
}

// --- Cards ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCard {
    pub id: i64,
    pub name: String,
    pub status: Badge,
    pub description: String,
    pub channel_type: String,
    pub latency_mode: String,
    pub created: String,
    /// Only while live.
    pub viewers: Option<u64>,
    pub last_stream: Option<String>,
    pub watch_href: Option<String>,
    pub details_href: String,
}

impl ChannelCard {
    pub fn new(channel: &Channel) -> Self {
        let live = channel.is_live();
        Self {
            id: channel.id,
            name: channel.name.clone(),
            status: status_badge(channel.status),
            description: channel
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "No description available".to_string()),
            channel_type: enum_label(&channel.channel_type),
            latency_mode: enum_label(&channel.latency_mode),
            created: format_date(channel.created_at, CARD_DATE),
            viewers: live.then(|| channel.current_viewers.unwrap_or(0)),
            last_stream: channel
                .last_stream_start_time
                .map(|t| t.format(CARD_DATE).to_string()),
            watch_href: live.then(|| Route::Player(channel.channel_arn.clone()).path()),
            details_href: Route::ChannelDetail(channel.id).path(),
        }
    }
}

/// Serialized name of a unit enum variant, e.g. `LatencyMode::Low` → `LOW`.
pub fn enum_label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamCard {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub channel: String,
    pub channel_arn: String,
    pub started: String,
    pub duration: String,
    pub health: Badge,
    pub viewers: u64,
    pub watch_href: String,
}

impl LiveStreamCard {
    pub fn new(stream: &Stream, now: NaiveDateTime) -> Self {
        Self {
            id: stream.id,
            title: stream_title(stream),
            description: stream.description.clone().filter(|d| !d.is_empty()),
            channel: channel_short_name(&stream.channel_arn).to_string(),
            channel_arn: stream.channel_arn.clone(),
            started: stream
                .start_time
                .map(|t| t.format(SHORT_DATE).to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            duration: format_elapsed(stream.start_time, now),
            health: health_badge(stream.health.as_deref()),
            viewers: stream.viewer_count.unwrap_or(0),
            watch_href: Route::Player(stream.channel_arn.clone()).path(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamHistoryEntry {
    pub id: i64,
    pub title: String,
    pub state: Badge,
    pub description: Option<String>,
    pub started: String,
    pub ended: Option<String>,
    pub duration: Option<String>,
    pub peak_viewers: Option<u64>,
}

impl StreamHistoryEntry {
    pub fn new(stream: &Stream) -> Self {
        Self {
            id: stream.id,
            title: stream_title(stream),
            state: stream_state_badge(stream.state),
            description: stream.description.clone().filter(|d| !d.is_empty()),
            started: format_date(stream.start_time, DETAIL_DATE),
            ended: stream.end_time.map(|t| t.format(DETAIL_DATE).to_string()),
            duration: stream.duration.filter(|d| *d > 0).map(format_seconds),
            peak_viewers: stream.viewer_count.filter(|v| *v > 0),
        }
    }
}

fn stream_title(stream: &Stream) -> String {
    stream
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled Stream".to_string())
}

// --- Chrome ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navigation {
    pub brand: &'static str,
    pub home: String,
    pub links: Vec<NavLink>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            brand: BRAND,
            home: Route::Dashboard.path(),
            links: vec![NavLink {
                label: "Live Streams",
                href: Route::LiveStreams.path(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarItem {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sidebar {
    pub items: Vec<SidebarItem>,
}

impl Sidebar {
    /// An item is active only on an exact path match.
    pub fn for_path(current: &str) -> Self {
        let entries = [
            ("Dashboard", Route::Dashboard),
            ("Channels", Route::Channels),
            ("Create Channel", Route::CreateChannel),
            ("Live Streams", Route::LiveStreams),
        ];
        Self {
            items: entries
                .into_iter()
                .map(|(label, route)| {
                    let href = route.path();
                    SidebarItem {
                        label,
                        active: href == current,
                        href,
                    }
                })
                .collect(),
        }
    }
}

/// Persistent layout around every page view.
#[derive(Debug, Clone, Serialize)]
pub struct Layout<T> {
    pub navigation: Navigation,
    pub sidebar: Sidebar,
    pub page: T,
}

impl<T> Layout<T> {
    pub fn new(current_path: &str, page: T) -> Self {
        Self {
            navigation: Navigation::default(),
            sidebar: Sidebar::for_path(current_path),
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{channel, stream};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn dates_format_or_say_never() {
        assert_eq!(format_date(Some(at(9, 5, 7)), CARD_DATE), "Mar 05, 2024 09:05");
        assert_eq!(format_date(Some(at(9, 5, 7)), DETAIL_DATE), "Mar 05, 2024 09:05:07");
        assert_eq!(format_date(None, CARD_DATE), "Never");
    }

    #[test]
    fn elapsed_switches_to_hours() {
        assert_eq!(format_elapsed(Some(at(10, 0, 0)), at(10, 42, 59)), "42m");
        assert_eq!(format_elapsed(Some(at(8, 15, 0)), at(10, 20, 0)), "2h 5m");
        assert_eq!(format_elapsed(Some(at(11, 0, 0)), at(10, 0, 0)), "0m");
        assert_eq!(format_elapsed(None, at(10, 0, 0)), "Unknown");
    }

    #[test]
    fn seconds_format_as_minutes_and_seconds() {
        assert_eq!(format_seconds(125), "2m 5s");
        assert_eq!(format_seconds(59), "0m 59s");
    }

    #[test]
    fn short_name_is_last_arn_segment() {
        assert_eq!(channel_short_name("arn:aws:ivs:us-west-2:1:channel/AbCd"), "AbCd");
        assert_eq!(channel_short_name("plain"), "plain");
    }

    #[test]
    fn badges_follow_status() {
        assert_eq!(status_badge(ChannelStatus::Live).variant, "danger");
        assert_eq!(status_badge(ChannelStatus::Creating).variant, "warning");
        assert_eq!(status_badge(ChannelStatus::Unknown).label, "UNKNOWN");
        assert_eq!(health_badge(Some("HEALTHY")).variant, "success");
        assert_eq!(health_badge(Some("STARVING")).variant, "warning");
    }

    #[test]
    fn live_card_shows_viewers_and_watch_link() {
        let mut c = channel(3, ChannelStatus::Live);
        c.created_at = Some(at(12, 0, 0));
        let card = ChannelCard::new(&c);
        assert_eq!(card.viewers, Some(0));
        assert_eq!(card.description, "No description available");
        assert_eq!(card.channel_type, "STANDARD");
        assert_eq!(card.latency_mode, "LOW");
        assert_eq!(card.created, "Mar 05, 2024 12:00");
        assert_eq!(card.details_href, "/channels/3");
        assert_eq!(
            card.watch_href.as_deref(),
            Some("/player/arn%3Aaws%3Aivs%3Aus-west-2%3A123456789012%3Achannel%2Fch3")
        );
    }

    #[test]
    fn offline_card_has_no_viewers_or_watch_link() {
        let mut c = channel(4, ChannelStatus::Offline);
        c.current_viewers = Some(9);
        let card = ChannelCard::new(&c);
        assert_eq!(card.viewers, None);
        assert_eq!(card.watch_href, None);
        assert_eq!(card.created, "Never");
    }

    #[test]
    fn live_stream_card_derives_display_fields() {
        let mut s = stream(1, "arn:aws:ivs:us-west-2:1:channel/Xyz");
        s.start_time = Some(at(9, 0, 0));
        s.viewer_count = Some(17);
        let card = LiveStreamCard::new(&s, at(10, 30, 0));
        assert_eq!(card.title, "Untitled Stream");
        assert_eq!(card.channel, "Xyz");
        assert_eq!(card.started, "Mar 05, 09:00");
        assert_eq!(card.duration, "1h 30m");
        assert_eq!(card.health.variant, "success");
        assert_eq!(card.viewers, 17);
    }

    #[test]
    fn history_entry_hides_empty_fields() {
        let mut s = stream(2, "arn");
        s.state = StreamState::Offline;
        s.duration = Some(3725);
        s.viewer_count = Some(0);
        let entry = StreamHistoryEntry::new(&s);
        assert_eq!(entry.state.label, "OFFLINE");
        assert_eq!(entry.duration.as_deref(), Some("62m 5s"));
        assert_eq!(entry.peak_viewers, None);
        assert_eq!(entry.ended, None);
    }

    #[test]
    fn sidebar_marks_exact_match_only() {
        let sidebar = Sidebar::for_path("/channels/create");
        let active: Vec<&str> = sidebar
            .items
            .iter()
            .filter(|i| i.active)
            .map(|i| i.label)
            .collect();
        assert_eq!(active, vec!["Create Channel"]);

        let sidebar = Sidebar::for_path("/channels/7");
        assert!(sidebar.items.iter().all(|i| !i.active));
    }
}
