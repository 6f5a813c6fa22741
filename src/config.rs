//! Configuration module for the vpnboard node adapter
//!
//! CLI arguments (with environment variable fallbacks) are turned into an
//! [`ApiConfig`], which is immutable for the lifetime of an `ApiClient`.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::NodeType;

/// Parse duration string (e.g., "5s", "2m", "1h") or plain seconds
fn parse_duration(s: &str) -> Result<Duration, String> {
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }
    s.parse::<u64>().map(Duration::from_secs).map_err(|_| {
        format!(
            "Invalid duration '{}'. Use formats like '60s', '2m', '1h' or plain seconds",
            s
        )
    })
}

/// Default panel request timeout
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of transport-level retries
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// CLI arguments for the vpnboard node adapter
///
/// Supports environment variables with VPNBOARD_ prefix
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "vpnboard panel adapter for proxy nodes")]
#[command(rename_all = "snake_case")]
pub struct CliArgs {
    /// Panel base URL (e.g., "https://panel.example.com")
    #[arg(long = "api_host", env = "VPNBOARD_API_HOST")]
    pub api_host: String,

    /// Panel access key
    #[arg(long, env = "VPNBOARD_KEY")]
    pub key: String,

    /// Node ID from the panel (required)
    #[arg(long = "node_id", env = "VPNBOARD_NODE_ID")]
    pub node_id: u32,

    /// Node type: V2ray, Trojan, Shadowsocks, Vmess or Vless
    #[arg(long = "node_type", env = "VPNBOARD_NODE_TYPE", default_value = "V2ray")]
    pub node_type: String,

    /// Enable VLESS on V2ray nodes
    #[arg(long = "enable_vless", env = "VPNBOARD_ENABLE_VLESS", default_value_t = false)]
    pub enable_vless: bool,

    /// VLESS flow control tag (e.g., "xtls-rprx-vision")
    #[arg(long = "vless_flow", env = "VPNBOARD_VLESS_FLOW")]
    pub vless_flow: Option<String>,

    /// Global speed limit override in Mbps, 0 keeps the panel's values
    #[arg(long = "speed_limit", env = "VPNBOARD_SPEED_LIMIT", default_value_t = 0.0)]
    pub speed_limit: f64,

    /// Global device limit override, 0 keeps the panel's values
    #[arg(long = "device_limit", env = "VPNBOARD_DEVICE_LIMIT", default_value_t = 0)]
    pub device_limit: i32,

    /// Local detection rule file, one pattern per line
    #[arg(long = "rule_list_path", env = "VPNBOARD_RULE_LIST_PATH")]
    pub rule_list_path: Option<PathBuf>,

    /// Ignore custom per-node config fields from the panel
    #[arg(
        long = "disable_custom_config",
        env = "VPNBOARD_DISABLE_CUSTOM_CONFIG",
        default_value_t = false
    )]
    pub disable_custom_config: bool,

    /// Panel request timeout (e.g., "5s", default: 5s)
    #[arg(long = "api_timeout", env = "VPNBOARD_API_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    pub api_timeout: Duration,

    /// Transport-level retries for connect/timeout failures (default: 3)
    #[arg(long = "retry_count", env = "VPNBOARD_RETRY_COUNT", default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: u32,

    /// Interval for refreshing node info (e.g., "60s", default: 60s)
    #[arg(long, env = "VPNBOARD_FETCH_NODE_INTERVAL", default_value = "60s", value_parser = parse_duration)]
    pub fetch_node_interval: Duration,

    /// Interval for refreshing users (e.g., "60s", default: 60s)
    #[arg(long, env = "VPNBOARD_FETCH_USERS_INTERVAL", default_value = "60s", value_parser = parse_duration)]
    pub fetch_users_interval: Duration,

    /// Interval for reporting node status (e.g., "60s", default: 60s)
    #[arg(long, env = "VPNBOARD_REPORT_STATUS_INTERVAL", default_value = "60s", value_parser = parse_duration)]
    pub report_status_interval: Duration,

    /// Log mode: trace, debug, info, warn, error (default: info)
    #[arg(long, env = "VPNBOARD_LOG_MODE", default_value = "info")]
    pub log_mode: String,
}

impl CliArgs {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the CLI arguments
    pub fn validate(&self) -> Result<()> {
        if self.api_host.is_empty() {
            return Err(anyhow!("Panel API host is required"));
        }
        if !self.api_host.starts_with("http://") && !self.api_host.starts_with("https://") {
            return Err(anyhow!(
                "Panel API host must start with http:// or https://: {}",
                self.api_host
            ));
        }
        if self.node_id == 0 {
            return Err(anyhow!("Node ID must be a positive integer"));
        }
        if self.node_type.parse::<NodeType>().is_err() {
            return Err(anyhow!(
                "Unsupported node type '{}', expected one of V2ray, Trojan, Shadowsocks, Vmess, Vless",
                self.node_type
            ));
        }
        if self.fetch_node_interval.is_zero() {
            return Err(anyhow!("fetch_node_interval must be greater than 0"));
        }
        if self.fetch_users_interval.is_zero() {
            return Err(anyhow!("fetch_users_interval must be greater than 0"));
        }
        if self.report_status_interval.is_zero() {
            return Err(anyhow!("report_status_interval must be greater than 0"));
        }

        Ok(())
    }

    /// Whether raw panel exchanges should be traced
    pub fn debug(&self) -> bool {
        self.log_mode.eq_ignore_ascii_case("debug") || self.log_mode.eq_ignore_ascii_case("trace")
    }
}

/// Panel client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Panel base URL, joined verbatim with endpoint paths
    pub api_host: String,
    /// Opaque access key, sent as the `key` query parameter on every request
    pub key: String,
    pub node_id: u32,
    /// Kept as configured so an unsupported value is reported at fetch time
    pub node_type: String,
    pub enable_vless: bool,
    pub vless_flow: Option<String>,
    /// Mbps, `<= 0` means no override
    pub speed_limit: f64,
    /// `<= 0` means no override
    pub device_limit: i32,
    pub rule_list_path: Option<PathBuf>,
    pub disable_custom_config: bool,
    pub timeout: Duration,
    pub retry_count: u32,
    /// Trace raw request/response bodies
    pub debug: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_host: String::new(),
            key: String::new(),
            node_id: 0,
            node_type: NodeType::V2ray.as_str().to_string(),
            enable_vless: false,
            vless_flow: None,
            speed_limit: 0.0,
            device_limit: 0,
            rule_list_path: None,
            disable_custom_config: false,
            timeout: DEFAULT_API_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            debug: false,
        }
    }
}

impl ApiConfig {
    /// Create a config with the required panel coordinates and defaults elsewhere
    pub fn new(api_host: impl Into<String>, key: impl Into<String>, node_id: u32) -> Self {
        Self {
            api_host: api_host.into(),
            key: key.into(),
            node_id,
            ..Self::default()
        }
    }

    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    pub fn with_speed_limit(mut self, mbps: f64) -> Self {
        self.speed_limit = mbps;
        self
    }

    pub fn with_device_limit(mut self, limit: i32) -> Self {
        self.device_limit = limit;
        self
    }

    pub fn with_vless_flow(mut self, flow: impl Into<String>) -> Self {
        self.vless_flow = Some(flow.into());
        self
    }

    pub fn with_rule_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rule_list_path = Some(path.into());
        self
    }

    /// Create ApiConfig from CLI args
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self {
            api_host: cli.api_host.trim_end_matches('/').to_string(),
            key: cli.key.clone(),
            node_id: cli.node_id,
            node_type: cli.node_type.clone(),
            enable_vless: cli.enable_vless,
            vless_flow: cli.vless_flow.clone(),
            speed_limit: cli.speed_limit,
            device_limit: cli.device_limit,
            rule_list_path: cli.rule_list_path.clone(),
            disable_custom_config: cli.disable_custom_config,
            timeout: if cli.api_timeout.is_zero() {
                DEFAULT_API_TIMEOUT
            } else {
                cli.api_timeout
            },
            retry_count: cli.retry_count,
            debug: cli.debug(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_cli_args() -> CliArgs {
        CliArgs {
            api_host: "http://127.0.0.1:3000".to_string(),
            key: "123".to_string(),
            node_id: 4,
            node_type: "V2ray".to_string(),
            enable_vless: false,
            vless_flow: None,
            speed_limit: 0.0,
            device_limit: 0,
            rule_list_path: None,
            disable_custom_config: false,
            api_timeout: Duration::from_secs(5),
            retry_count: 3,
            fetch_node_interval: Duration::from_secs(60),
            fetch_users_interval: Duration::from_secs(60),
            report_status_interval: Duration::from_secs(60),
            log_mode: "info".to_string(),
        }
    }

    #[test]
    fn test_cli_args_validate_success() {
        let cli = create_test_cli_args();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_args_validate_empty_api_host() {
        let mut cli = create_test_cli_args();
        cli.api_host = "".to_string();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_args_validate_api_host_scheme() {
        let mut cli = create_test_cli_args();
        cli.api_host = "127.0.0.1:3000".to_string();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_args_validate_invalid_node_id() {
        let mut cli = create_test_cli_args();
        cli.node_id = 0;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_args_validate_unsupported_node_type() {
        let mut cli = create_test_cli_args();
        cli.node_type = "Foo".to_string();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_args_validate_zero_interval() {
        let mut cli = create_test_cli_args();
        cli.fetch_node_interval = Duration::ZERO;
        assert!(cli.validate().is_err());

        let mut cli = create_test_cli_args();
        cli.fetch_users_interval = Duration::ZERO;
        assert!(cli.validate().is_err());

        let mut cli = create_test_cli_args();
        cli.report_status_interval = Duration::ZERO;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_api_config_from_cli() {
        let mut cli = create_test_cli_args();
        cli.api_host = "http://127.0.0.1:3000/".to_string();
        cli.speed_limit = 1.5;
        cli.device_limit = 3;
        cli.vless_flow = Some("xtls-rprx-vision".to_string());

        let config = ApiConfig::from_cli(&cli);

        assert_eq!(config.api_host, "http://127.0.0.1:3000");
        assert_eq!(config.node_id, 4);
        assert_eq!(config.speed_limit, 1.5);
        assert_eq!(config.device_limit, 3);
        assert_eq!(config.vless_flow.as_deref(), Some("xtls-rprx-vision"));
        assert!(!config.debug);
    }

    #[test]
    fn test_api_config_zero_timeout_uses_default() {
        let mut cli = create_test_cli_args();
        cli.api_timeout = Duration::ZERO;
        let config = ApiConfig::from_cli(&cli);
        assert_eq!(config.timeout, DEFAULT_API_TIMEOUT);
    }

    #[test]
    fn test_api_config_debug_from_log_mode() {
        let mut cli = create_test_cli_args();
        cli.log_mode = "DEBUG".to_string();
        assert!(ApiConfig::from_cli(&cli).debug);
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::new("http://panel", "key", 7);
        assert_eq!(config.node_type, "V2ray");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.speed_limit, 0.0);
        assert!(config.rule_list_path.is_none());
    }
}
