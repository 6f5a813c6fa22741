//! vpnboard wire payloads

use serde::{Deserialize, Deserializer, Serialize};

/// Logical panel resources, each with its own ETag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Node,
    Users,
}

impl Resource {
    /// Static tag used in diagnostics and as the cache key
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Node => "node",
            Resource::Users => "users",
        }
    }

    /// Endpoint path relative to the panel host
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Node => "/api/public/xrayr/node/info",
            Resource::Users => "/api/public/xrayr/user/list",
        }
    }
}

/// Decode JSON `null` as the type's default; panels written in Go emit
/// `null` for empty slices and unset fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Request body shared by both endpoints
#[derive(Debug, Clone, Serialize)]
pub struct NodeRequest {
    pub node_id: u32,
}

/// `data` of the node info endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfoResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub remarks: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub port: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub node_order: i64,
    /// Mbps
    #[serde(deserialize_with = "null_as_default")]
    pub node_speed_limit: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_tls: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub transport_protocol: String,
    #[serde(deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(deserialize_with = "null_as_default")]
    pub service_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enable_vless: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub server_key: String,
}

/// `data` of the user list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: Vec<UserListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListItem {
    pub uid: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Mbps
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed_limit: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_limit: i32,
}
