//! Request lifecycle shared by every page controller.
//!
//! A page's data is a [`Lifecycle`] plus a dismissible banner. Every fetch
//! takes a [`Ticket`] from the resource's generation counter and its result
//! is only committed if no newer ticket has been issued in the meantime, so
//! overlapping fetches (a poll tick racing a manual refresh) always settle on
//! the most recently issued request, whatever order the responses arrive in.

use crate::error::ApiError;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum Lifecycle<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Lifecycle<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Lifecycle::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Lifecycle::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// A newer request was issued after this one; the result was dropped.
    Stale,
    /// The page was unmounted while the request was in flight.
    Unmounted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<T> {
    #[serde(flatten)]
    pub lifecycle: Lifecycle<T>,
    pub banner: Option<String>,
}

pub struct Resource<T> {
    state: RwLock<Snapshot<T>>,
    generation: AtomicU64,
    mounted: AtomicBool,
}

impl<T: Clone> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Resource<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Snapshot {
                lifecycle: Lifecycle::Idle,
                banner: None,
            }),
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    /// Issue a ticket and enter `Loading` unless data is already on screen.
    pub async fn begin(&self) -> Ticket {
        let ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        let mut state = self.state.write().await;
        state.banner = None;
        if !matches!(state.lifecycle, Lifecycle::Loaded(_)) {
            state.lifecycle = Lifecycle::Loading;
        }
        ticket
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Commit a fetch result. On failure the previous data stays and the
    /// message goes to the banner; with nothing loaded yet the resource
    /// becomes `Failed`.
    pub async fn commit(
        &self,
        ticket: Ticket,
        result: Result<T, ApiError>,
        context: &str,
        fallback: &str,
    ) -> Commit {
        if let Err(e) = &result {
            tracing::error!("{}: {}", context, e);
        }
        if !self.is_mounted() {
            return Commit::Unmounted;
        }
        let mut state = self.state.write().await;
        if !self.is_latest(ticket) {
            tracing::debug!("{}: discarding stale result {:?}", context, ticket);
            return Commit::Stale;
        }
        match result {
            Ok(data) => state.lifecycle = Lifecycle::Loaded(data),
            Err(e) => {
                let message = e.user_message(fallback);
                if matches!(state.lifecycle, Lifecycle::Loaded(_)) {
                    state.banner = Some(message);
                } else {
                    state.lifecycle = Lifecycle::Failed(message);
                }
            }
        }
        Commit::Applied
    }

    /// `begin`, await `fetch`, `commit`.
    pub async fn load<F>(&self, context: &str, fallback: &str, fetch: F) -> Commit
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let ticket = self.begin().await;
        let result = fetch.await;
        self.commit(ticket, result, context, fallback).await
    }

    /// Mutate loaded data in place (local splice or merge after a mutation).
    /// Any fetch issued before this point is invalidated. Returns `None` when
    /// nothing is loaded or the page is gone.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        if !self.is_mounted() {
            return None;
        }
        let mut state = self.state.write().await;
        match &mut state.lifecycle {
            Lifecycle::Loaded(data) => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                Some(f(data))
            }
            _ => None,
        }
    }

    /// Log a failed mutation and surface it on the banner. Data is untouched.
    pub async fn fail(&self, context: &str, fallback: &str, err: &ApiError) {
        tracing::error!("{}: {}", context, err);
        self.set_banner(err.user_message(fallback)).await;
    }

    pub async fn set_banner(&self, message: String) {
        if self.is_mounted() {
            self.state.write().await.banner = Some(message);
        }
    }

    /// Clear whatever error is on screen. A failed first load goes back to
    /// `Idle` so its message disappears too.
    pub async fn dismiss_banner(&self) {
        let mut state = self.state.write().await;
        state.banner = None;
        if matches!(state.lifecycle, Lifecycle::Failed(_)) {
            state.lifecycle = Lifecycle::Idle;
        }
    }

    /// Back to `Idle` with no banner. Any request still in flight is dropped
    /// when it resolves.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.lifecycle = Lifecycle::Idle;
        state.banner = None;
    }

    pub async fn snapshot(&self) -> Snapshot<T> {
        self.state.read().await.clone()
    }

    pub async fn data(&self) -> Option<T> {
        self.state.read().await.lifecycle.data().cloned()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}
