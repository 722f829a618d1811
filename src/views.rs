//! HTTP surface of the console. `GET` on a client route renders the page
//! inside the layout chrome; `POST` applies a JSON action to the mounted page
//! and answers with the new view, a confirmation prompt, or a `303` to the
//! next route.

use crate::components::Layout;
use crate::pages::channel_detail::ChannelDetailAction;
use crate::pages::channels::ChannelsAction;
use crate::pages::create_channel::CreateChannelAction;
use crate::pages::dashboard::DashboardAction;
use crate::pages::live_streams::LiveStreamsAction;
use crate::pages::player::PlayerAction;
use crate::pages::Outcome;
use crate::routes::Route;
use crate::state::{AppState, MountedPage, Page};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

type Reply = Result<Response, Response>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard).post(dashboard_action))
        .route("/channels", get(channels).post(channels_action))
        .route(
            "/channels/create",
            get(create_channel).post(create_channel_action),
        )
        .route("/channels/{id}", get(channel_detail).post(channel_detail_action))
        .route("/live-streams", get(live_streams).post(live_streams_action))
        .route("/player/{channel_arn}", get(player).post(player_action))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ConfirmPrompt {
    pub confirm: &'static str,
}

async fn open(state: &AppState, route: &Route) -> Result<Arc<MountedPage>, Response> {
    state
        .page(route)
        .await
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())
}

fn mismatch(route: &Route) -> Response {
    tracing::error!("Page mounted at {} has the wrong kind", route);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// A 401 anywhere during the request wins over whatever the page wanted.
async fn respond<V, F>(state: &AppState, route: &Route, outcome: Outcome, view: F) -> Response
where
    V: Serialize,
    F: Future<Output = V>,
{
    if let Some(target) = state.api.session().take_navigation() {
        tracing::info!("{}: forced navigation to {}", route, target);
        return Redirect::to(&target).into_response();
    }
    match outcome {
        Outcome::Navigate(next) => {
            // Arriving at a page always mounts it fresh.
            state.unmount(&next.path());
            Redirect::to(&next.path()).into_response()
        }
        Outcome::Confirm(prompt) => Json(ConfirmPrompt { confirm: prompt }).into_response(),
        Outcome::Render => Json(Layout::new(&route.path(), view.await)).into_response(),
    }
}

// --- Dashboard ---

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Reply {
    let route = Route::Dashboard;
    let mounted = open(&state, &route).await?;
    let Page::Dashboard(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    Ok(respond(&state, &route, Outcome::Render, page.view()).await)
}

pub async fn dashboard_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<DashboardAction>,
) -> Reply {
    let route = Route::Dashboard;
    let mounted = open(&state, &route).await?;
    let Page::Dashboard(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    let deleting = matches!(action, DashboardAction::Delete { confirmed: true, .. });
    let outcome = page.act(action).await;
    if deleting {
        state.invalidate_channel_lists(&route);
    }
    Ok(respond(&state, &route, outcome, page.view()).await)
}

// --- Channels ---

pub async fn channels(State(state): State<Arc<AppState>>) -> Reply {
    let route = Route::Channels;
    let mounted = open(&state, &route).await?;
    let Page::Channels(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    Ok(respond(&state, &route, Outcome::Render, page.view()).await)
}

pub async fn channels_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<ChannelsAction>,
) -> Reply {
    let route = Route::Channels;
    let mounted = open(&state, &route).await?;
    let Page::Channels(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    let deleting = matches!(action, ChannelsAction::Delete { confirmed: true, .. });
    let outcome = page.act(action).await;
    if deleting {
        state.invalidate_channel_lists(&route);
    }
    Ok(respond(&state, &route, outcome, page.view()).await)
}

// --- Create channel ---

pub async fn create_channel(State(state): State<Arc<AppState>>) -> Reply {
    let route = Route::CreateChannel;
    let mounted = open(&state, &route).await?;
    let Page::CreateChannel(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    Ok(respond(&state, &route, Outcome::Render, page.view()).await)
}

pub async fn create_channel_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<CreateChannelAction>,
) -> Reply {
    let route = Route::CreateChannel;
    let mounted = open(&state, &route).await?;
    let Page::CreateChannel(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    let outcome = page.act(action).await;
    // The success view renders once; the next visit gets an empty form.
    if page.created().await.is_some() {
        state.unmount(&route.path());
        state.invalidate_channel_lists(&route);
    }
    Ok(respond(&state, &route, outcome, page.view()).await)
}

// --- Channel detail ---

pub async fn channel_detail(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Reply {
    let route = Route::ChannelDetail(id);
    let mounted = open(&state, &route).await?;
    let Page::ChannelDetail(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    Ok(respond(&state, &route, Outcome::Render, page.view()).await)
}

pub async fn channel_detail_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(action): Json<ChannelDetailAction>,
) -> Reply {
    let route = Route::ChannelDetail(id);
    let mounted = open(&state, &route).await?;
    let Page::ChannelDetail(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    let deleting = matches!(action, ChannelDetailAction::Delete { confirmed: true });
    let outcome = page.act(action).await;
    // A deleted channel's page has nothing left to show.
    if deleting && outcome == Outcome::Navigate(Route::Channels) {
        state.unmount(&route.path());
        state.invalidate_channel_lists(&route);
    }
    Ok(respond(&state, &route, outcome, page.view()).await)
}

// --- Live streams ---

pub async fn live_streams(State(state): State<Arc<AppState>>) -> Reply {
    let route = Route::LiveStreams;
    let mounted = open(&state, &route).await?;
    let Page::LiveStreams(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    Ok(respond(&state, &route, Outcome::Render, page.view()).await)
}

pub async fn live_streams_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<LiveStreamsAction>,
) -> Reply {
    let route = Route::LiveStreams;
    let mounted = open(&state, &route).await?;
    let Page::LiveStreams(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    let outcome = page.act(action).await;
    Ok(respond(&state, &route, outcome, page.view()).await)
}

// --- Player ---

pub async fn player(
    State(state): State<Arc<AppState>>,
    Path(channel_arn): Path<String>,
) -> Reply {
    let route = Route::Player(channel_arn);
    let mounted = open(&state, &route).await?;
    let Page::Player(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    Ok(respond(&state, &route, Outcome::Render, page.view()).await)
}

pub async fn player_action(
    State(state): State<Arc<AppState>>,
    Path(channel_arn): Path<String>,
    Json(action): Json<PlayerAction>,
) -> Reply {
    let route = Route::Player(channel_arn);
    let mounted = open(&state, &route).await?;
    let Page::Player(page) = &mounted.page else {
        return Err(mismatch(&route));
    };
    let outcome = page.act(action).await;
    Ok(respond(&state, &route, outcome, page.view()).await)
}

// --- Health ---

#[derive(Debug, Serialize)]
pub struct MountedPageInfo {
    pub path: String,
    pub kind: &'static str,
    pub id: uuid::Uuid,
    pub polling: bool,
    pub idle_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub started_at: String,
    pub uptime_seconds: u64,
    pub api_base: String,
    pub player_engine: &'static str,
    pub mounted_pages: Vec<MountedPageInfo>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed();
    let now_ms = uptime.as_millis() as u64;
    let mut mounted_pages: Vec<MountedPageInfo> = state
        .pages
        .iter()
        .map(|e| MountedPageInfo {
            path: e.key().clone(),
            kind: e.page.kind(),
            id: e.id,
            polling: e.route.polls(),
            idle_seconds: now_ms.saturating_sub(e.last_seen_ms()) / 1000,
        })
        .collect();
    mounted_pages.sort_by(|a, b| a.path.cmp(&b.path));

    let started: chrono::DateTime<chrono::Utc> = (std::time::SystemTime::now() - uptime).into();
    Json(HealthResponse {
        status: "ok".to_string(),
        started_at: started.to_rfc3339(),
        uptime_seconds: uptime.as_secs(),
        api_base: state.api.base_url().to_string(),
        player_engine: state.engine.name(),
        mounted_pages,
    })
}
