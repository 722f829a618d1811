//! Video surface and the playback engines behind it.
//!
//! The hosting environment picks a [`VideoEngine`] at startup and hands it to
//! every [`VideoSurface`]; nothing is discovered from globals.

use futures_util::future::{self, BoxFuture};
use reqwest::Client;
use serde::Serialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{mpsc, watch, OnceCell};
use tokio::task::JoinHandle;

pub const VENDOR_SCRIPT_URL: &str =
    "https://player.live-video.net/1.21.1/amazon-ivs-player.min.js";

pub const UNSUPPORTED_MESSAGE: &str = "Player is not supported in this environment";
pub const NO_PLAYBACK_URL: &str = "No playback URL provided";

/// Events a player instance reports back to its surface.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Ready,
    Playing,
    Buffering,
    Error(String),
}

/// One player instance created by an engine.
pub trait PlayerHandle: Send {
    fn load(&mut self, playback_url: &str);
    fn play(&mut self);
    /// Release the instance. Must be safe to call in any state.
    fn teardown(&mut self);
}

pub trait VideoEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Make the engine usable. Called on every surface mount; must be
    /// idempotent.
    fn prepare(&self) -> BoxFuture<'_, Result<(), String>>;

    fn is_supported(&self) -> bool;

    fn create(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Box<dyn PlayerHandle>;

    /// Script the browser shell must load to render this engine's player.
    fn script_url(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Native,
    Vendor,
    Mock,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(EngineKind::Native),
            "vendor" => Ok(EngineKind::Vendor),
            "mock" => Ok(EngineKind::Mock),
            other => Err(format!("unknown player engine: {}", other)),
        }
    }
}

pub fn build_engine(kind: EngineKind, script_url: &str) -> Arc<dyn VideoEngine> {
    match kind {
        EngineKind::Native => Arc::new(NativeEngine::new()),
        EngineKind::Vendor => Arc::new(VendorEngine::new(script_url)),
        EngineKind::Mock => Arc::new(MockEngine::new()),
    }
}

// --- Native engine: probes the HLS playlist itself ---

pub struct NativeEngine {
    http: Client,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoEngine for NativeEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    fn prepare(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(future::ready(Ok(())))
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Box<dyn PlayerHandle> {
        Box::new(NativePlayer {
            http: self.http.clone(),
            events,
            ready: Arc::new(AtomicBool::new(false)),
            play_requested: Arc::new(AtomicBool::new(false)),
            probe: None,
        })
    }
}

struct NativePlayer {
    http: Client,
    events: mpsc::UnboundedSender<EngineEvent>,
    ready: Arc<AtomicBool>,
    play_requested: Arc<AtomicBool>,
    probe: Option<JoinHandle<()>>,
}

impl PlayerHandle for NativePlayer {
    fn load(&mut self, playback_url: &str) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
        self.ready.store(false, Ordering::SeqCst);

        let http = self.http.clone();
        let events = self.events.clone();
        let ready = self.ready.clone();
        let play_requested = self.play_requested.clone();
        let url = playback_url.to_string();

        self.probe = Some(tokio::spawn(async move {
            let _ = events.send(EngineEvent::Buffering);
            match probe_playlist(&http, &url).await {
                Ok(()) => {
                    ready.store(true, Ordering::SeqCst);
                    let _ = events.send(EngineEvent::Ready);
                    if play_requested.load(Ordering::SeqCst) {
                        let _ = events.send(EngineEvent::Playing);
                    }
                }
                Err(e) => {
                    let _ = events.send(EngineEvent::Error(e));
                }
            }
        }));
    }

    fn play(&mut self) {
        self.play_requested.store(true, Ordering::SeqCst);
        if self.ready.load(Ordering::SeqCst) {
            let _ = self.events.send(EngineEvent::Playing);
        }
    }

    fn teardown(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
        self.play_requested.store(false, Ordering::SeqCst);
    }
}

async fn probe_playlist(http: &Client, url: &str) -> Result<(), String> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| format!("connect error: {}", e))?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let body = response
        .text()
        .await
        .map_err(|e| format!("read error: {}", e))?;
    if body.trim_start().starts_with("#EXTM3U") {
        Ok(())
    } else {
        Err("playback URL is not an HLS playlist".to_string())
    }
}

// --- Vendor engine: the hosted IVS player script, rendered by the browser ---

pub struct VendorEngine {
    http: Client,
    script_url: String,
    loaded: OnceCell<()>,
}

impl VendorEngine {
    pub fn new(script_url: &str) -> Self {
        Self {
            http: Client::new(),
            script_url: script_url.to_string(),
            loaded: OnceCell::new(),
        }
    }

    async fn load_script(&self) -> Result<(), String> {
        tracing::info!("Loading vendor player script from {}", self.script_url);
        let response = self
            .http
            .get(&self.script_url)
            .send()
            .await
            .map_err(|e| format!("connect error: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        Ok(())
    }
}

impl VideoEngine for VendorEngine {
    fn name(&self) -> &'static str {
        "vendor"
    }

    /// Fetches the script once; later calls return immediately. A failed load
    /// is not cached, the next mount tries again.
    fn prepare(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            self.loaded
                .get_or_try_init(|| self.load_script())
                .await
                .map(|_| ())
        })
    }

    fn is_supported(&self) -> bool {
        self.loaded.initialized()
    }

    fn create(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Box<dyn PlayerHandle> {
        Box::new(VendorPlayer { events })
    }

    fn script_url(&self) -> Option<&str> {
        Some(&self.script_url)
    }
}

/// Playback itself happens in the browser embed; the instance only
/// acknowledges the calls.
struct VendorPlayer {
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl PlayerHandle for VendorPlayer {
    fn load(&mut self, _playback_url: &str) {
        let _ = self.events.send(EngineEvent::Ready);
    }

    fn play(&mut self) {
        let _ = self.events.send(EngineEvent::Playing);
    }

    fn teardown(&mut self) {}
}

// --- Mock engine: scripted, for tests and offline runs ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Prepare,
    Create,
    Load(String),
    Play,
    Teardown,
}

#[derive(Default)]
struct MockShared {
    calls: Mutex<Vec<MockCall>>,
    events: Mutex<Option<mpsc::UnboundedSender<EngineEvent>>>,
}

impl MockShared {
    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

pub struct MockEngine {
    supported: bool,
    prepare_error: Option<String>,
    shared: Arc<MockShared>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            supported: true,
            prepare_error: None,
            shared: Arc::new(MockShared::default()),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn failing_prepare(message: &str) -> Self {
        Self {
            prepare_error: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.shared
            .calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Push an event as if the most recently created player reported it.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.shared
            .events
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|tx| tx.send(event).is_ok()))
            .unwrap_or(false)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn prepare(&self) -> BoxFuture<'_, Result<(), String>> {
        self.shared.record(MockCall::Prepare);
        Box::pin(future::ready(match &self.prepare_error {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }))
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Box<dyn PlayerHandle> {
        self.shared.record(MockCall::Create);
        if let Ok(mut slot) = self.shared.events.lock() {
            *slot = Some(events);
        }
        Box::new(MockPlayer {
            shared: self.shared.clone(),
        })
    }
}

struct MockPlayer {
    shared: Arc<MockShared>,
}

impl PlayerHandle for MockPlayer {
    fn load(&mut self, playback_url: &str) {
        self.shared.record(MockCall::Load(playback_url.to_string()));
    }

    fn play(&mut self) {
        self.shared.record(MockCall::Play);
    }

    fn teardown(&mut self) {
        self.shared.record(MockCall::Teardown);
        if let Ok(mut slot) = self.shared.events.lock() {
            *slot = None;
        }
    }
}

// --- Surface ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum SurfaceState {
    Loading,
    Playing,
    Buffering,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
struct SurfaceStatus {
    state: SurfaceState,
    ready: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurfaceView {
    #[serde(flatten)]
    pub state: SurfaceState,
    pub ready: bool,
    pub engine: &'static str,
    pub playback_url: Option<String>,
    pub script_url: Option<String>,
    pub autoplay: bool,
    pub notice: Option<&'static str>,
}

/// Hosts one player instance for one playback URL.
///
/// `Loading → (Playing | Buffering) → Error`, with `ready` tracked on the
/// side. After [`unmount`](Self::unmount) no engine event or late
/// initialisation step changes the state, and the player is torn down
/// whichever state it was in.
pub struct VideoSurface {
    engine: Arc<dyn VideoEngine>,
    playback_url: Option<String>,
    autoplay: bool,
    status: watch::Sender<SurfaceStatus>,
    mounted: AtomicBool,
    player: Mutex<Option<Box<dyn PlayerHandle>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl VideoSurface {
    pub fn new(engine: Arc<dyn VideoEngine>, playback_url: Option<String>, autoplay: bool) -> Arc<Self> {
        let (status, _) = watch::channel(SurfaceStatus {
            state: SurfaceState::Loading,
            ready: false,
        });
        Arc::new(Self {
            engine,
            playback_url: playback_url.filter(|u| !u.trim().is_empty()),
            autoplay,
            status,
            mounted: AtomicBool::new(true),
            player: Mutex::new(None),
            pump: Mutex::new(None),
        })
    }

    /// Prepare the engine, create the player, load and optionally play.
    pub async fn start(self: &Arc<Self>) {
        if let Err(e) = self.engine.prepare().await {
            tracing::error!("Player engine {} failed to initialize: {}", self.engine.name(), e);
            self.set_state(SurfaceState::Error(format!(
                "Failed to initialize player: {}",
                e
            )));
            return;
        }
        if !self.is_mounted() {
            return;
        }
        if !self.engine.is_supported() {
            self.set_state(SurfaceState::Error(UNSUPPORTED_MESSAGE.to_string()));
            return;
        }

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut player = self.engine.create(events_tx);

        let surface: Weak<Self> = Arc::downgrade(self);
        let pump = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match surface.upgrade() {
                    Some(surface) if surface.is_mounted() => surface.apply(event),
                    _ => break,
                }
            }
        });

        if let Some(url) = &self.playback_url {
            player.load(url);
            if self.autoplay {
                player.play();
            }
        }

        if let Ok(mut slot) = self.pump.lock() {
            *slot = Some(pump);
        }
        if let Ok(mut slot) = self.player.lock() {
            *slot = Some(player);
        }
        // Unmounted while we were creating: release right away.
        if !self.is_mounted() {
            self.release();
        }
    }

    fn apply(&self, event: EngineEvent) {
        self.status.send_modify(|status| match event {
            EngineEvent::Ready => status.ready = true,
            EngineEvent::Playing => status.state = SurfaceState::Playing,
            EngineEvent::Buffering => status.state = SurfaceState::Buffering,
            EngineEvent::Error(message) => {
                tracing::warn!("Playback error: {}", message);
                status.state = SurfaceState::Error(format!("Failed to load stream: {}", message));
            }
        });
    }

    fn set_state(&self, state: SurfaceState) {
        if self.is_mounted() {
            self.status.send_modify(|status| status.state = state);
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.status.borrow().state.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.status.borrow().ready
    }

    pub fn playback_url(&self) -> Option<&str> {
        self.playback_url.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        if self.mounted.swap(false, Ordering::SeqCst) {
            self.release();
        }
    }

    fn release(&self) {
        if let Ok(mut slot) = self.player.lock() {
            if let Some(mut player) = slot.take() {
                player.teardown();
            }
        }
        if let Ok(mut slot) = self.pump.lock() {
            if let Some(pump) = slot.take() {
                pump.abort();
            }
        }
    }

    pub fn view(&self) -> SurfaceView {
        let status = self.status.borrow().clone();
        SurfaceView {
            state: status.state,
            ready: status.ready,
            engine: self.engine.name(),
            playback_url: self.playback_url.clone(),
            script_url: self.engine.script_url().map(str::to_string),
            autoplay: self.autoplay,
            notice: self.playback_url.is_none().then_some(NO_PLAYBACK_URL),
        }
    }
}

impl Drop for VideoSurface {
    fn drop(&mut self) {
        self.unmount();
    }
}
