//! Business logic implementations
//!
//! This module contains the panel-specific implementations:
//! - API integration (conditional fetch, envelope parsing, polling tasks)
//! - Normalization of panel payloads into canonical entities
//! - Local detection rule loading

pub mod api;
pub mod normalize;
pub mod rules;

pub use api::{ApiClient, BackgroundTasks, NodeState, TaskConfig};
pub use rules::load_local_rules;
