use crate::client::{encode_segment, ApiClient};
use crate::error::ApiError;
use crate::models::{Stream, StreamId, StreamMetadata};
use reqwest::Method;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

pub struct StreamApi<'a> {
    client: &'a ApiClient,
}

impl<'a> StreamApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Current stream of a channel. The backend answers 404 when the channel
    /// has never streamed.
    pub async fn by_channel(&self, channel_arn: &str) -> Result<Stream, ApiError> {
        self.client
            .get_json(&format!("/streams/channel/{}", encode_segment(channel_arn)))
            .await
    }

    pub async fn all_by_channel(&self, channel_arn: &str) -> Result<Vec<Stream>, ApiError> {
        self.client
            .get_json(&format!("/streams/channel/{}/all", encode_segment(channel_arn)))
            .await
    }

    pub async fn history(&self, channel_arn: &str, limit: u32) -> Result<Vec<Stream>, ApiError> {
        self.client
            .get_json_query(
                &format!("/streams/channel/{}/history", encode_segment(channel_arn)),
                &[("limit", limit)],
            )
            .await
    }

    pub async fn live(&self) -> Result<Vec<Stream>, ApiError> {
        self.client.get_json("/streams/live").await
    }

    pub async fn get(&self, id: StreamId) -> Result<Stream, ApiError> {
        self.client.get_json(&format!("/streams/{}", id)).await
    }

    pub async fn update_metadata(
        &self,
        id: StreamId,
        metadata: &StreamMetadata,
    ) -> Result<Stream, ApiError> {
        self.client
            .send_json(Method::PUT, &format!("/streams/{}/metadata", id), metadata)
            .await
    }

    pub async fn stop(&self, channel_arn: &str) -> Result<(), ApiError> {
        self.client
            .send_empty(
                Method::POST,
                &format!("/streams/channel/{}/stop", encode_segment(channel_arn)),
            )
            .await
    }

    pub async fn sync_all(&self) -> Result<(), ApiError> {
        self.client
            .send_empty(Method::POST, "/streams/sync-all")
            .await
    }
}
