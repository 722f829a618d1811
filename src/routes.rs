use crate::client::encode_segment;
use crate::models::ChannelId;
use crate::session::LOGIN_PATH;
use std::fmt;

/// Client-visible console routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Channels,
    CreateChannel,
    ChannelDetail(ChannelId),
    LiveStreams,
    /// Carries the raw ARN; it is percent-encoded only when rendered.
    Player(String),
    /// Not served here; the target of the 401 redirect.
    Login,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/".to_string(),
            Route::Channels => "/channels".to_string(),
            Route::CreateChannel => "/channels/create".to_string(),
            Route::ChannelDetail(id) => format!("/channels/{}", id),
            Route::LiveStreams => "/live-streams".to_string(),
            Route::Player(arn) => format!("/player/{}", encode_segment(arn)),
            Route::Login => LOGIN_PATH.to_string(),
        }
    }

    /// Whether a mounted page for this route keeps a poll timer running.
    pub fn polls(&self) -> bool {
        matches!(self, Route::LiveStreams | Route::Player(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
