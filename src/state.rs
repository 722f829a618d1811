use crate::client::ApiClient;
use crate::config::Config;
use crate::pages::{
    ChannelDetailPage, ChannelsPage, CreateChannelPage, DashboardPage, LiveStreamsPage, PlayerPage,
};
use crate::player::VideoEngine;
use crate::routes::Route;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// A live page controller, one per route path.
pub enum Page {
    Dashboard(Arc<DashboardPage>),
    Channels(Arc<ChannelsPage>),
    CreateChannel(Arc<CreateChannelPage>),
    ChannelDetail(Arc<ChannelDetailPage>),
    LiveStreams(Arc<LiveStreamsPage>),
    Player(Arc<PlayerPage>),
}

impl Page {
    fn build(route: &Route, api: &ApiClient, engine: &Arc<dyn VideoEngine>) -> Option<Self> {
        let api = api.clone();
        Some(match route {
            Route::Dashboard => Page::Dashboard(Arc::new(DashboardPage::new(api))),
            Route::Channels => Page::Channels(Arc::new(ChannelsPage::new(api))),
            Route::CreateChannel => Page::CreateChannel(Arc::new(CreateChannelPage::new(api))),
            Route::ChannelDetail(id) => {
                Page::ChannelDetail(Arc::new(ChannelDetailPage::new(api, *id)))
            }
            Route::LiveStreams => Page::LiveStreams(Arc::new(LiveStreamsPage::new(api))),
            Route::Player(arn) => {
                Page::Player(Arc::new(PlayerPage::new(api, engine.clone(), arn.clone())))
            }
            Route::Login => return None,
        })
    }

    async fn mount(&self) {
        match self {
            Page::Dashboard(p) => p.mount().await,
            Page::Channels(p) => p.mount().await,
            Page::CreateChannel(p) => p.mount().await,
            Page::ChannelDetail(p) => p.mount().await,
            Page::LiveStreams(p) => p.mount().await,
            Page::Player(p) => p.mount().await,
        }
    }

    fn unmount(&self) {
        match self {
            Page::Dashboard(p) => p.unmount(),
            Page::Channels(p) => p.unmount(),
            Page::CreateChannel(p) => p.unmount(),
            Page::ChannelDetail(p) => p.unmount(),
            Page::LiveStreams(p) => p.unmount(),
            Page::Player(p) => p.unmount(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Page::Dashboard(_) => "dashboard",
            Page::Channels(_) => "channels",
            Page::CreateChannel(_) => "create-channel",
            Page::ChannelDetail(_) => "channel-detail",
            Page::LiveStreams(_) => "live-streams",
            Page::Player(_) => "player",
        }
    }
}

pub struct MountedPage {
    pub id: Uuid,
    pub route: Route,
    pub page: Page,
    /// Milliseconds since [`AppState::start_time`].
    last_seen_ms: AtomicU64,
}

impl MountedPage {
    pub fn last_seen_ms(&self) -> u64 {
        self.last_seen_ms.load(Ordering::Relaxed)
    }

    fn touch(&self, now_ms: u64) {
        self.last_seen_ms.fetch_max(now_ms, Ordering::Relaxed);
    }
}

/// Top-level application state shared across all handlers
pub struct AppState {
    pub start_time: Instant,
    pub config: Config,
    pub api: ApiClient,
    pub engine: Arc<dyn VideoEngine>,
    pub pages: DashMap<String, Arc<MountedPage>>,
}

impl AppState {
    pub fn new(config: Config, api: ApiClient, engine: Arc<dyn VideoEngine>) -> Self {
        Self {
            start_time: Instant::now(),
            config,
            api,
            engine,
            pages: DashMap::new(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// The page for `route`, mounting it on first use. `None` for routes the
    /// console does not serve.
    pub async fn page(&self, route: &Route) -> Option<Arc<MountedPage>> {
        let key = route.path();
        let now = self.now_ms();
        if let Some(existing) = self.pages.get(&key).map(|e| e.value().clone()) {
            existing.touch(now);
            return Some(existing);
        }

        let fresh = Arc::new(MountedPage {
            id: Uuid::new_v4(),
            route: route.clone(),
            page: Page::build(route, &self.api, &self.engine)?,
            last_seen_ms: AtomicU64::new(now),
        });
        match self.pages.entry(key.clone()) {
            Entry::Occupied(e) => return Some(e.get().clone()),
            Entry::Vacant(e) => {
                e.insert(fresh.clone());
            }
        }

        tracing::info!("Page {}: mounted as {} ({})", key, fresh.id, fresh.page.kind());
        fresh.page.mount().await;
        Some(fresh)
    }

    pub fn unmount(&self, path: &str) -> bool {
        match self.pages.remove(path) {
            Some((_, mounted)) => {
                mounted.page.unmount();
                tracing::info!("Page {}: unmounted {}", path, mounted.id);
                true
            }
            None => false,
        }
    }

    /// Unmount the pages that list channels, other than `keep`, so their next
    /// request fetches again.
    pub fn invalidate_channel_lists(&self, keep: &Route) {
        for route in [Route::Dashboard, Route::Channels] {
            if &route != keep {
                self.unmount(&route.path());
            }
        }
    }

    /// Unmount every page not requested within the idle window.
    pub fn reap_idle(&self) -> usize {
        let now = self.now_ms();
        let idle_ms = self.config.idle_unmount.as_millis() as u64;
        let candidates: Vec<String> = self
            .pages
            .iter()
            .filter(|e| now.saturating_sub(e.last_seen_ms()) >= idle_ms)
            .map(|e| e.key().clone())
            .collect();

        let mut reaped = 0;
        for key in candidates {
            let removed = self
                .pages
                .remove_if(&key, |_, m| now.saturating_sub(m.last_seen_ms()) >= idle_ms);
            if let Some((_, mounted)) = removed {
                mounted.page.unmount();
                tracing::info!(
                    "Page {}: no requests for {:?}, unmounted {}",
                    key,
                    self.config.idle_unmount,
                    mounted.id
                );
                reaped += 1;
            }
        }
        reaped
    }

    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let state = self.clone();
        let period = (self.config.idle_unmount / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                state.reap_idle();
            }
        })
    }

    pub fn shutdown(&self) {
        let paths: Vec<String> = self.pages.iter().map(|e| e.key().clone()).collect();
        for path in paths {
            self.unmount(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::command;
    use crate::player::MockEngine;
    use crate::session::Session;
    use pretty_assertions::assert_eq;

    fn state(idle_secs: &str) -> AppState {
        let matches = command()
            .try_get_matches_from(["ivs-console", "--idle-unmount-secs", idle_secs])
            .unwrap();
        let config = Config::from_matches(&matches, |_| None).unwrap();
        let api = ApiClient::new("http://127.0.0.1:9/api", Arc::new(Session::new(None)));
        AppState::new(config, api, Arc::new(MockEngine::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn same_route_reuses_the_mounted_page() {
        let state = state("30");
        let first = state.page(&Route::CreateChannel).await.unwrap();
        let second = state.page(&Route::CreateChannel).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(state.pages.len(), 1);
        assert!(state.page(&Route::Login).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_pages_are_reaped_and_remounted_fresh() {
        let state = state("30");
        let first = state.page(&Route::CreateChannel).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(state.reap_idle(), 0);
        state.page(&Route::CreateChannel).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(state.reap_idle(), 0);

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(state.reap_idle(), 1);
        assert!(state.pages.is_empty());

        let again = state.page(&Route::CreateChannel).await.unwrap();
        assert_ne!(first.id, again.id);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidating_channel_lists_spares_the_current_page() {
        let state = state("30");
        state.pages.insert(
            "/channels".to_string(),
            Arc::new(MountedPage {
                id: Uuid::new_v4(),
                route: Route::Channels,
                page: Page::Channels(Arc::new(ChannelsPage::new(state.api.clone()))),
                last_seen_ms: AtomicU64::new(0),
            }),
        );
        state.page(&Route::CreateChannel).await.unwrap();

        state.invalidate_channel_lists(&Route::Dashboard);
        assert!(state.pages.get("/channels").is_none());
        assert!(state.pages.get("/channels/create").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_unmount_removes_the_page() {
        let state = state("30");
        state.page(&Route::CreateChannel).await.unwrap();
        assert!(state.unmount("/channels/create"));
        assert!(!state.unmount("/channels/create"));
    }
}
