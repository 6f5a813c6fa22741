//! Canonical entities handed to the host

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// User ID type used throughout the host.
pub type UserId = i64;

/// Rule id carried by rules loaded from the local file (no panel-assigned id)
pub const LOCAL_RULE_ID: i64 = -1;

/// Proxy protocol families the panel can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    V2ray,
    Trojan,
    Shadowsocks,
    Vmess,
    Vless,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::V2ray => "V2ray",
            NodeType::Trojan => "Trojan",
            NodeType::Shadowsocks => "Shadowsocks",
            NodeType::Vmess => "Vmess",
            NodeType::Vless => "Vless",
        }
    }
}

impl FromStr for NodeType {
    type Err = ApiError;

    /// Names are matched exactly as the host configures them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V2ray" => Ok(NodeType::V2ray),
            "Trojan" => Ok(NodeType::Trojan),
            "Shadowsocks" => Ok(NodeType::Shadowsocks),
            "Vmess" => Ok(NodeType::Vmess),
            "Vless" => Ok(NodeType::Vless),
            other => Err(ApiError::UnsupportedNodeType(other.to_string())),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node configuration in the host's model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub node_type: String,
    /// Always the configured id, never the panel's
    pub node_id: u32,
    pub port: u32,
    /// Bytes per second, 0 = unlimited
    pub speed_limit: u64,
    pub transport_protocol: String,
    pub host: String,
    pub path: String,
    pub service_name: String,
    pub enable_tls: bool,
    pub enable_vless: bool,
    pub vless_flow: String,
    pub cipher_method: String,
    pub server_key: String,
}

/// Authorized user in the host's model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub uid: UserId,
    pub uuid: String,
    pub email: String,
    /// Bytes per second, 0 = unlimited
    pub speed_limit: u64,
    pub device_limit: i32,
    /// Only set for Shadowsocks nodes
    pub passwd: Option<String>,
}

/// Abuse-detection rule definition
#[derive(Debug, Clone)]
pub struct DetectRule {
    pub id: i64,
    pub pattern: Regex,
}

impl PartialEq for DetectRule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.pattern.as_str() == other.pattern.as_str()
    }
}

/// Read-only snapshot for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub api_host: String,
    pub node_id: u32,
    pub key: String,
    pub node_type: String,
}

/// Result of a conditional fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// Panel sent a fresh payload
    Modified(T),
    /// Panel answered 304; the caller keeps what it already has
    NotModified,
}

impl<T> FetchOutcome<T> {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, FetchOutcome::NotModified)
    }

    pub fn modified(self) -> Option<T> {
        match self {
            FetchOutcome::Modified(v) => Some(v),
            FetchOutcome::NotModified => None,
        }
    }
}

/// Host resource usage, in percent except uptime (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeStatus {
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
    pub uptime: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineUser {
    pub uid: UserId,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTraffic {
    pub uid: UserId,
    pub email: String,
    pub upload: u64,
    pub download: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectResult {
    pub uid: UserId,
    pub rule_id: i64,
}
