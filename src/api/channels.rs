use crate::client::{encode_segment, ApiClient};
use crate::error::ApiError;
use crate::models::{Channel, ChannelId, CreateChannelRequest};
use reqwest::Method;

pub struct ChannelApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ChannelApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Channel>, ApiError> {
        self.client.get_json("/channels").await
    }

    pub async fn get(&self, id: ChannelId) -> Result<Channel, ApiError> {
        self.client.get_json(&format!("/channels/{}", id)).await
    }

    pub async fn get_by_arn(&self, channel_arn: &str) -> Result<Channel, ApiError> {
        self.client
            .get_json(&format!("/channels/arn/{}", encode_segment(channel_arn)))
            .await
    }

    pub async fn live(&self) -> Result<Vec<Channel>, ApiError> {
        self.client.get_json("/channels/live").await
    }

    pub async fn search(&self, keyword: &str) -> Result<Vec<Channel>, ApiError> {
        self.client
            .get_json_query("/channels/search", &[("keyword", keyword)])
            .await
    }

    pub async fn create(&self, request: &CreateChannelRequest) -> Result<Channel, ApiError> {
        self.client
            .send_json(Method::POST, "/channels", request)
            .await
    }

    pub async fn update(
        &self,
        id: ChannelId,
        request: &CreateChannelRequest,
    ) -> Result<Channel, ApiError> {
        self.client
            .send_json(Method::PUT, &format!("/channels/{}", id), request)
            .await
    }

    pub async fn delete(&self, id: ChannelId) -> Result<(), ApiError> {
        self.client
            .send_empty(Method::DELETE, &format!("/channels/{}", id))
            .await
    }

    /// Ask the backend to reconcile one channel's status with IVS.
    pub async fn sync(&self, id: ChannelId) -> Result<(), ApiError> {
        self.client
            .send_empty(Method::POST, &format!("/channels/{}/sync", id))
            .await
    }

    pub async fn sync_all(&self) -> Result<(), ApiError> {
        self.client
            .send_empty(Method::POST, "/channels/sync-all")
            .await
    }
}
