use ivs_console::client::ApiClient;
use ivs_console::config::Config;
use ivs_console::player::build_engine;
use ivs_console::session::Session;
use ivs_console::state::AppState;
use ivs_console::views;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_args()?;

    let session = Arc::new(match &config.token_file {
        Some(path) => Session::with_token_file(path.clone(), config.token.clone()),
        None => Session::new(config.token.clone()),
    });
    if session.token().is_none() {
        tracing::warn!("No auth token configured; backend calls go out unauthenticated");
    }

    let api = ApiClient::new(&config.api_url, session);
    let engine = build_engine(config.player_engine, &config.player_script_url);
    tracing::info!(
        "IVS backend at {}, player engine {}",
        api.base_url(),
        engine.name()
    );

    let listen = config.listen;
    let state = Arc::new(AppState::new(config, api, engine));
    let reaper = state.spawn_reaper();
    let app = views::router(state.clone());

    tracing::info!("IVS console listening on {}", listen);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    reaper.abort();
    state.shutdown();
    anyhow::Ok(())
}
