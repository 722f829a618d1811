//! Typed request builders over [`ApiClient`](crate::client::ApiClient), one
//! function per backend endpoint.

mod channels;
mod dashboard;
mod streams;

pub use channels::ChannelApi;
pub use dashboard::DashboardApi;
pub use streams::{StreamApi, DEFAULT_HISTORY_LIMIT};
