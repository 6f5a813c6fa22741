//! Core domain module
//!
//! This module contains what the host sees:
//! - Canonical entities (node, users, detection rules)
//! - The `PanelApi` contract implemented by panel clients

pub mod hooks;
mod types;

pub use hooks::PanelApi;
pub use types::{
    ClientInfo, DetectResult, DetectRule, FetchOutcome, NodeInfo, NodeStatus, NodeType,
    OnlineUser, UserId, UserInfo, UserTraffic, LOCAL_RULE_ID,
};
