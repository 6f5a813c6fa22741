//! Host-facing contract
//!
//! The host's polling and reporting loops talk to the panel only through
//! [`PanelApi`], so they can share one `Arc<dyn PanelApi>`.

use async_trait::async_trait;

use super::types::{
    ClientInfo, DetectResult, DetectRule, FetchOutcome, NodeInfo, NodeStatus, OnlineUser,
    UserInfo, UserTraffic,
};
use crate::error::Result;

#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Fetch node configuration, `NotModified` when the panel's ETag matches
    async fn fetch_node_info(&self) -> Result<FetchOutcome<NodeInfo>>;

    /// Fetch the authorized users, `NotModified` when the panel's ETag matches
    async fn fetch_user_list(&self) -> Result<FetchOutcome<Vec<UserInfo>>>;

    /// Rules loaded from the local rule file at construction
    fn fetch_local_rules(&self) -> Vec<DetectRule>;

    async fn report_node_status(&self, status: &NodeStatus) -> Result<()>;

    async fn report_online_users(&self, users: &[OnlineUser]) -> Result<()>;

    async fn report_user_traffic(&self, traffic: &[UserTraffic]) -> Result<()>;

    async fn report_illegal(&self, results: &[DetectResult]) -> Result<()>;

    fn describe(&self) -> ClientInfo;
}
