//! vpnboard panel adapter
//!
//! Architecture:
//! - `core/`: Canonical entities and the host-facing `PanelApi` contract
//! - `business/`: vpnboard client, normalizers, rule loading, polling tasks
//! - `config`: CLI arguments and client configuration
//! - `logger`: tracing setup

pub mod business;
pub mod config;
pub mod core;
pub mod error;
pub mod logger;

pub use business::ApiClient;
pub use config::ApiConfig;
pub use error::{ApiError, Result};
