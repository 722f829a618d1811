use super::{Outcome, PageStatus};
use crate::client::ApiClient;
use crate::lifecycle::{Commit, Resource};
use crate::models::{Channel, CreateChannelRequest};
use crate::routes::Route;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub const NAME_REQUIRED: &str = "Channel name is required";
pub const NAME_TOO_LONG: &str = "Channel name must be between 1 and 128 characters";
pub const DESCRIPTION_TOO_LONG: &str = "Description cannot exceed 1000 characters";
pub const CREATED: &str = "Channel created successfully!";
const CREATE_FAILED: &str = "Failed to create channel. Please try again.";

const MAX_NAME: usize = 128;
const MAX_DESCRIPTION: usize = 1000;
pub const REDIRECT_AFTER_SECS: u64 = 2;

/// Checked before anything goes over the wire.
pub fn validate(form: &CreateChannelRequest) -> Result<(), &'static str> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(NAME_REQUIRED);
    }
    if name.chars().count() > MAX_NAME {
        return Err(NAME_TOO_LONG);
    }
    let description = form.description.as_deref().unwrap_or("");
    if description.chars().count() > MAX_DESCRIPTION {
        return Err(DESCRIPTION_TOO_LONG);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CreateChannelAction {
    Submit { form: CreateChannelRequest },
    Cancel,
    DismissError,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldHelp {
    pub name: &'static str,
    pub text: &'static str,
}

const FIELD_HELP: [FieldHelp; 6] = [
    FieldHelp { name: "name", text: "Maximum 128 characters" },
    FieldHelp { name: "type", text: "Standard channels support higher quality and more features" },
    FieldHelp { name: "description", text: "Maximum 1000 characters" },
    FieldHelp { name: "latencyMode", text: "Low latency reduces delay but may affect quality" },
    FieldHelp { name: "authorized", text: "Requires authentication to stream" },
    FieldHelp { name: "recordingConfigurationArn", text: "ARN of the recording configuration to use for this channel" },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub href: String,
    pub after_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelView {
    #[serde(flatten)]
    pub status: PageStatus,
    pub form: CreateChannelRequest,
    pub submitting: bool,
    pub success: Option<&'static str>,
    pub redirect: Option<Redirect>,
    pub type_options: [&'static str; 2],
    pub latency_options: [&'static str; 2],
    pub help: [FieldHelp; 6],
    pub tags_help: &'static str,
    pub cancel_href: String,
}

/// `/channels/create`: the new-channel form.
pub struct CreateChannelPage {
    api: ApiClient,
    form: RwLock<CreateChannelRequest>,
    submission: Resource<Channel>,
}

impl CreateChannelPage {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            form: RwLock::new(CreateChannelRequest::default()),
            submission: Resource::new(),
        }
    }

    /// Nothing to fetch; the form starts from its defaults.
    pub async fn mount(&self) {}

    pub fn unmount(&self) {
        self.submission.unmount();
    }

    pub async fn act(&self, action: CreateChannelAction) -> Outcome {
        match action {
            CreateChannelAction::Submit { form } => {
                self.submit(form).await;
            }
            CreateChannelAction::Cancel => return Outcome::Navigate(Route::Channels),
            CreateChannelAction::DismissError => self.submission.dismiss_banner().await,
        }
        Outcome::Render
    }

    pub async fn submit(&self, form: CreateChannelRequest) -> Option<Commit> {
        *self.form.write().await = form.clone();
        self.submission.reset().await;
        if let Err(message) = validate(&form) {
            self.submission.set_banner(message.to_string()).await;
            return None;
        }

        let api = self.api.channels();
        let commit = self
            .submission
            .load("Error creating channel", CREATE_FAILED, api.create(&form))
            .await;
        if let Some(created) = self.submission.data().await {
            tracing::info!("Channel {} created as {}", created.name, created.id);
        }
        Some(commit)
    }

    /// The channel the last submit created, if it succeeded.
    pub async fn created(&self) -> Option<Channel> {
        self.submission.data().await
    }

    pub async fn view(&self) -> CreateChannelView {
        let snapshot = self.submission.snapshot().await;
        let created = snapshot.lifecycle.data();

        CreateChannelView {
            status: PageStatus::of(&snapshot),
            form: self.form.read().await.clone(),
            submitting: snapshot.lifecycle.is_loading(),
            success: created.map(|_| CREATED),
            redirect: created.map(|c| Redirect {
                href: Route::ChannelDetail(c.id).path(),
                after_secs: REDIRECT_AFTER_SECS,
            }),
            type_options: ["BASIC", "STANDARD"],
            latency_options: ["NORMAL", "LOW"],
            help: FIELD_HELP,
            tags_help: "Comma-separated tags for organizing channels",
            cancel_href: Route::Channels.path(),
        }
    }
}
