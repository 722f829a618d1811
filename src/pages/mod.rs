//! Page controllers. Each owns its state, fetches on mount (and on a timer
//! where it polls), applies operator actions and renders a view.

pub mod channel_detail;
pub mod channels;
pub mod create_channel;
pub mod dashboard;
pub mod live_streams;
pub mod player;

use crate::lifecycle::{Lifecycle, Snapshot};
use crate::routes::Route;
use serde::Serialize;

pub use channel_detail::ChannelDetailPage;
pub use channels::ChannelsPage;
pub use create_channel::CreateChannelPage;
pub use dashboard::DashboardPage;
pub use live_streams::LiveStreamsPage;
pub use player::PlayerPage;

pub const CONFIRM_DELETE: &str =
    "Are you sure you want to delete this channel? This action cannot be undone.";
pub const CONFIRM_DELETE_SHORT: &str = "Are you sure you want to delete this channel?";

/// Result of an operator action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stay on the page and re-render.
    Render,
    Navigate(Route),
    /// Destructive action held back until repeated with `confirmed: true`.
    Confirm(&'static str),
}

/// Request state plus whatever error should be on screen, common to every
/// page view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageStatus {
    pub state: &'static str,
    pub error: Option<String>,
}

impl PageStatus {
    pub fn of<T>(snapshot: &Snapshot<T>) -> Self {
        let (state, failure) = match &snapshot.lifecycle {
            Lifecycle::Idle => ("idle", None),
            Lifecycle::Loading => ("loading", None),
            Lifecycle::Loaded(_) => ("loaded", None),
            Lifecycle::Failed(message) => ("failed", Some(message.clone())),
        };
        Self {
            state,
            error: snapshot.banner.clone().or(failure),
        }
    }
}

/// Placeholder shown instead of an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: Option<&'static str>,
    pub create_href: Option<String>,
}

pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
pub(crate) mod testkit {
    //! In-memory IVS backend served over HTTP for page tests.

    use crate::client::{mock, ApiClient};
    use crate::models::{Channel, ChannelStatus, CreateChannelRequest, Stream};
    use crate::session::Session;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Default)]
    pub struct Backend {
        pub channels: Mutex<Vec<Channel>>,
        pub live_streams: Mutex<Vec<Stream>>,
        pub history: Mutex<Vec<Stream>>,
        hits: Mutex<HashMap<String, usize>>,
        failures: Mutex<HashMap<String, (StatusCode, Option<String>)>>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
    }

    type Reply<T> = Result<Json<T>, Response>;

    impl Backend {
        pub fn hits(&self, key: &str) -> usize {
            self.hits.lock().unwrap().get(key).copied().unwrap_or(0)
        }

        pub fn fail(&self, key: &str, status: StatusCode, message: Option<&str>) {
            self.failures
                .lock()
                .unwrap()
                .insert(key.to_string(), (status, message.map(str::to_string)));
        }

        pub fn heal(&self, key: &str) {
            self.failures.lock().unwrap().remove(key);
        }

        /// Hold the next call to `key` after it has read its data, until the
        /// returned handle is notified.
        pub fn gate(&self, key: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(key.to_string(), notify.clone());
            notify
        }

        fn enter(&self, key: &str) -> Result<Option<Arc<Notify>>, Response> {
            *self.hits.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
            if let Some((status, message)) = self.failures.lock().unwrap().get(key).cloned() {
                let body = serde_json::json!({ "message": message });
                return Err((status, Json(body)).into_response());
            }
            Ok(self.gates.lock().unwrap().remove(key))
        }

        fn channel(&self, id: i64) -> Option<Channel> {
            self.channels
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
        }
    }

    async fn hold(gate: Option<Arc<Notify>>) {
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn not_found() -> Response {
        StatusCode::NOT_FOUND.into_response()
    }

    async fn list_channels(State(b): State<Arc<Backend>>) -> Reply<Vec<Channel>> {
        let gate = b.enter("GET /channels")?;
        let data = b.channels.lock().unwrap().clone();
        hold(gate).await;
        Ok(Json(data))
    }

    async fn live_channels(State(b): State<Arc<Backend>>) -> Reply<Vec<Channel>> {
        b.enter("GET /channels/live")?;
        let data = b
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.status == ChannelStatus::Live)
            .cloned()
            .collect();
        Ok(Json(data))
    }

    async fn get_channel(State(b): State<Arc<Backend>>, Path(id): Path<i64>) -> Reply<Channel> {
        let gate = b.enter("GET /channels/{id}")?;
        let found = b.channel(id).ok_or_else(not_found)?;
        hold(gate).await;
        Ok(Json(found))
    }

    async fn channel_by_arn(State(b): State<Arc<Backend>>, Path(arn): Path<String>) -> Reply<Channel> {
        let gate = b.enter("GET /channels/arn")?;
        let found = b
            .channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.channel_arn == arn)
            .cloned()
            .ok_or_else(not_found)?;
        hold(gate).await;
        Ok(Json(found))
    }

    async fn create_channel(
        State(b): State<Arc<Backend>>,
        Json(req): Json<CreateChannelRequest>,
    ) -> Reply<Channel> {
        b.enter("POST /channels")?;
        let mut channels = b.channels.lock().unwrap();
        let id = channels.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let mut created = crate::models::fixtures::channel(id, ChannelStatus::Creating);
        created.name = req.name;
        created.description = req.description;
        channels.push(created.clone());
        Ok(Json(created))
    }

    async fn delete_channel(State(b): State<Arc<Backend>>, Path(id): Path<i64>) -> Result<StatusCode, Response> {
        b.enter("DELETE /channels/{id}")?;
        let mut channels = b.channels.lock().unwrap();
        let before = channels.len();
        channels.retain(|c| c.id != id);
        if channels.len() == before {
            return Err(not_found());
        }
        Ok(StatusCode::NO_CONTENT)
    }

    /// Sync marks the channel live, standing in for IVS reporting a stream.
    async fn sync_channel(State(b): State<Arc<Backend>>, Path(id): Path<i64>) -> Result<StatusCode, Response> {
        b.enter("POST /channels/{id}/sync")?;
        let mut channels = b.channels.lock().unwrap();
        let channel = channels.iter_mut().find(|c| c.id == id).ok_or_else(not_found)?;
        channel.status = ChannelStatus::Live;
        Ok(StatusCode::OK)
    }

    async fn sync_all_channels(State(b): State<Arc<Backend>>) -> Result<StatusCode, Response> {
        b.enter("POST /channels/sync-all")?;
        Ok(StatusCode::OK)
    }

    async fn live_streams(State(b): State<Arc<Backend>>) -> Reply<Vec<Stream>> {
        let gate = b.enter("GET /streams/live")?;
        let data = b.live_streams.lock().unwrap().clone();
        hold(gate).await;
        Ok(Json(data))
    }

    async fn stream_by_channel(State(b): State<Arc<Backend>>, Path(arn): Path<String>) -> Reply<Stream> {
        b.enter("GET /streams/channel")?;
        b.live_streams
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.channel_arn == arn)
            .cloned()
            .map(Json)
            .ok_or_else(not_found)
    }

    async fn stream_history(
        State(b): State<Arc<Backend>>,
        Path(arn): Path<String>,
        Query(q): Query<HashMap<String, usize>>,
    ) -> Reply<Vec<Stream>> {
        b.enter("GET /streams/history")?;
        let limit = q.get("limit").copied().unwrap_or(10);
        let data = b
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.channel_arn == arn)
            .take(limit)
            .cloned()
            .collect();
        Ok(Json(data))
    }

    async fn sync_all_streams(State(b): State<Arc<Backend>>) -> Result<StatusCode, Response> {
        b.enter("POST /streams/sync-all")?;
        Ok(StatusCode::OK)
    }

    pub fn router(backend: Arc<Backend>) -> Router {
        Router::new()
            .route("/api/channels", get(list_channels).post(create_channel))
            .route("/api/channels/live", get(live_channels))
            .route("/api/channels/sync-all", post(sync_all_channels))
            .route("/api/channels/arn/{arn}", get(channel_by_arn))
            .route("/api/channels/{id}", get(get_channel).delete(delete_channel))
            .route("/api/channels/{id}/sync", post(sync_channel))
            .route("/api/streams/live", get(live_streams))
            .route("/api/streams/sync-all", post(sync_all_streams))
            .route("/api/streams/channel/{arn}", get(stream_by_channel))
            .route("/api/streams/channel/{arn}/history", get(stream_history))
            .with_state(backend)
    }

    pub async fn start(backend: Arc<Backend>) -> ApiClient {
        let base = mock::serve(router(backend)).await;
        ApiClient::new(&base, Arc::new(Session::new(Some("token".into()))))
    }

    pub async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    /// Yield until `done` holds or the attempts run out. Never parks the
    /// runtime, so a paused clock only moves when the test advances it.
    pub async fn spin_until(done: impl Fn() -> bool) -> bool {
        for _ in 0..100_000 {
            if done() {
                return true;
            }
            tokio::task::yield_now().await;
        }
        done()
    }
}
