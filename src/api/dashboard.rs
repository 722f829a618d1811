use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::DashboardStats;
use futures_util::future::try_join3;

pub struct DashboardApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DashboardApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Aggregate built from three concurrent list calls. The first failure is
    /// returned as-is; there is no partial result.
    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let channels = self.client.channels();
        let streams = self.client.streams();
        let (all, live_channels, live_streams) =
            try_join3(channels.list(), channels.live(), streams.live())
                .await
                .map_err(|e| {
                    tracing::error!("Error fetching dashboard stats: {}", e);
                    e
                })?;
        Ok(DashboardStats::from_lists(&all, &live_channels, &live_streams))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{mock, ApiClient};
    use crate::models::fixtures::{channel, stream};
    use crate::models::{ChannelStatus, DashboardStats};
    use crate::session::Session;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn live_channel(id: i64, viewers: Option<u64>) -> crate::models::Channel {
        let mut c = channel(id, ChannelStatus::Live);
        c.current_viewers = viewers;
        c
    }

    #[tokio::test]
    async fn stats_sum_viewers_over_live_endpoint_only() {
        let router = Router::new()
            .route(
                "/api/channels",
                get(|| async {
                    let mut offline = channel(9, ChannelStatus::Offline);
                    offline.current_viewers = Some(1000);
                    Json(vec![
                        live_channel(1, Some(5)),
                        live_channel(2, None),
                        offline,
                    ])
                }),
            )
            .route(
                "/api/channels/live",
                get(|| async { Json(vec![live_channel(1, Some(5)), live_channel(2, None)]) }),
            )
            .route(
                "/api/streams/live",
                get(|| async { Json(vec![stream(1, "a")]) }),
            );
        let base = mock::serve(router).await;
        let client = ApiClient::new(&base, Arc::new(Session::new(None)));

        let stats = client.dashboard().stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_channels: 3,
                live_channels: 2,
                live_streams: 1,
                total_viewers: 5,
            }
        );
    }

    #[tokio::test]
    async fn stats_propagate_failure_without_partial_result() {
        let router = Router::new()
            .route("/api/channels", get(|| async { Json(Vec::<()>::new()) }))
            .route(
                "/api/channels/live",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route("/api/streams/live", get(|| async { Json(Vec::<()>::new()) }));
        let base = mock::serve(router).await;
        let client = ApiClient::new(&base, Arc::new(Session::new(None)));

        assert!(client.dashboard().stats().await.is_err());
    }
}
