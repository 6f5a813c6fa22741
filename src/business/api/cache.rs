//! Per-resource ETag store for conditional fetches

use tokio::sync::{Mutex, MutexGuard};

use super::models::Resource;

/// One ETag slot per [`Resource`].
///
/// Each slot has its own lock: a fetch holds its resource's slot from the
/// token read until the token update, so racing fetches of the same
/// resource are serialized while `node` and `users` proceed independently.
#[derive(Debug, Default)]
pub struct ETagCache {
    node: Mutex<String>,
    users: Mutex<String>,
}

impl ETagCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, resource: Resource) -> &Mutex<String> {
        match resource {
            Resource::Node => &self.node,
            Resource::Users => &self.users,
        }
    }

    /// Last stored token, empty if none
    pub async fn token(&self, resource: Resource) -> String {
        self.slot(resource).lock().await.clone()
    }

    /// Store `new_token` if non-empty and different; returns whether it changed
    pub async fn update(&self, resource: Resource, new_token: &str) -> bool {
        self.lock(resource).await.update(new_token)
    }

    /// Hold the resource's slot across a whole fetch
    pub async fn lock(&self, resource: Resource) -> ETagGuard<'_> {
        ETagGuard {
            resource,
            token: self.slot(resource).lock().await,
        }
    }
}

/// Exclusive access to one resource's token
pub struct ETagGuard<'a> {
    resource: Resource,
    token: MutexGuard<'a, String>,
}

impl ETagGuard<'_> {
    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn update(&mut self, new_token: &str) -> bool {
        if new_token.is_empty() || *self.token == new_token {
            return false;
        }
        *self.token = new_token.to_string();
        true
    }
}
