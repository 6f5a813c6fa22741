//! Panel payload → canonical entity mapping

use once_cell::sync::Lazy;
use regex::Regex;

use super::api::models::{NodeInfoResponse, UserListResponse};
use crate::config::ApiConfig;
use crate::core::{NodeInfo, NodeType, UserInfo};

/// Domain appended to panel usernames that are not email addresses
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "vpnboard.user";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

/// Mbps to bytes per second, truncated. Non-positive input maps to 0.
pub fn mbps_to_bytes_per_sec(mbps: f64) -> u64 {
    // `as` saturates: negatives and NaN become 0
    (mbps * 1_000_000.0 / 8.0) as u64
}

fn panel_mbps_to_bytes_per_sec(mbps: u64) -> u64 {
    mbps.saturating_mul(1_000_000) / 8
}

pub fn is_email_format(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Email-like identity for a panel username
pub fn normalize_email(user_name: &str) -> String {
    if is_email_format(user_name) {
        user_name.to_string()
    } else {
        format!("{}@{}", user_name, PLACEHOLDER_EMAIL_DOMAIN)
    }
}

/// Configured speed override wins when positive
fn effective_speed_limit(config: &ApiConfig, panel_mbps: u64) -> u64 {
    if config.speed_limit > 0.0 {
        mbps_to_bytes_per_sec(config.speed_limit)
    } else {
        panel_mbps_to_bytes_per_sec(panel_mbps)
    }
}

pub fn node_info(raw: &NodeInfoResponse, config: &ApiConfig) -> NodeInfo {
    let panel_speed = u64::try_from(raw.node_speed_limit).unwrap_or(0);

    NodeInfo {
        node_type: raw.node_type.clone(),
        node_id: config.node_id,
        port: u32::try_from(raw.port).unwrap_or(0),
        speed_limit: effective_speed_limit(config, panel_speed),
        transport_protocol: raw.transport_protocol.clone(),
        host: raw.host.clone(),
        path: raw.path.clone(),
        service_name: raw.service_name.clone(),
        enable_tls: raw.enable_tls,
        enable_vless: raw.enable_vless,
        vless_flow: config.vless_flow.clone().unwrap_or_default(),
        cipher_method: raw.method.clone(),
        server_key: raw.server_key.clone(),
    }
}

/// Map every panel user, preserving panel order
pub fn user_list(raw: &UserListResponse, config: &ApiConfig, node_type: NodeType) -> Vec<UserInfo> {
    raw.list
        .iter()
        .map(|u| UserInfo {
            uid: u.uid,
            uuid: u.uuid.clone(),
            email: normalize_email(&u.user_name),
            speed_limit: effective_speed_limit(config, u.speed_limit),
            device_limit: if config.device_limit > 0 {
                config.device_limit
            } else {
                u.device_limit
            },
            passwd: (node_type == NodeType::Shadowsocks).then(|| u.uuid.clone()),
        })
        .collect()
}
