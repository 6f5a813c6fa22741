//! Remote panel API integration
//!
//! This module handles:
//! - Conditional node info / user list fetches with ETag caching
//! - Envelope parsing and error classification
//! - The HTTP transport seam
//! - Background polling tasks

pub mod cache;
mod client;
pub mod models;
pub mod response;
mod tasks;
pub mod transport;

pub use cache::ETagCache;
pub use client::ApiClient;
pub use models::Resource;
pub use tasks::{
    fetch_node_once, fetch_users_once, BackgroundTasks, BackgroundTasksHandle, NodeState,
    TaskConfig,
};
pub use transport::{PanelRequest, PanelResponse, PanelTransport, ReqwestTransport};
