//! HTTP client for the vpnboard panel

use async_trait::async_trait;
use std::sync::Arc;

use super::cache::ETagCache;
use super::models::{NodeInfoResponse, NodeRequest, Resource, UserListResponse};
use super::response::{parse_response, Envelope};
use super::transport::{PanelRequest, PanelTransport, ReqwestTransport};
use crate::business::{normalize, rules};
use crate::config::ApiConfig;
use crate::core::{
    ClientInfo, DetectResult, DetectRule, FetchOutcome, NodeInfo, NodeStatus, NodeType,
    OnlineUser, PanelApi, UserInfo, UserTraffic,
};
use crate::error::{ApiError, Result};
use crate::logger::log;

/// Panel client: owns the config, the transport, the ETag cache and the
/// local rules.
pub struct ApiClient {
    config: ApiConfig,
    transport: Arc<dyn PanelTransport>,
    etags: ETagCache,
    local_rules: Vec<DetectRule>,
}

impl ApiClient {
    /// Create a client backed by reqwest
    pub fn new(config: ApiConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout, config.retry_count, config.debug)
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any transport. Loads the local rule file.
    pub fn with_transport(config: ApiConfig, transport: Arc<dyn PanelTransport>) -> Result<Self> {
        let local_rules = rules::load_local_rules(config.rule_list_path.as_deref())?;

        Ok(Self {
            config,
            transport,
            etags: ETagCache::new(),
            local_rules,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Current ETag for a resource, empty if none
    pub async fn etag(&self, resource: Resource) -> String {
        self.etags.token(resource).await
    }

    fn assemble_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_host, path)
    }

    /// POST to `resource`'s endpoint with its cached ETag and run `normalize`
    /// on the envelope. The resource's token stays locked for the whole
    /// exchange and is only replaced once `normalize` succeeded.
    async fn conditional_fetch<T, F>(&self, resource: Resource, normalize: F) -> Result<FetchOutcome<T>>
    where
        F: FnOnce(Envelope) -> Result<T>,
    {
        let url = self.assemble_url(resource.path());
        let mut etag = self.etags.lock(resource).await;

        let body = serde_json::to_value(NodeRequest {
            node_id: self.config.node_id,
        })
        .map_err(|e| ApiError::Config(format!("failed to encode request: {}", e)))?;
        let mut request = PanelRequest::new(&url, body).query("key", &self.config.key);
        if !etag.token().is_empty() {
            request = request.header("If-None-Match", etag.token());
        }

        let outcome = self.transport.post_json(&request).await;

        // 304 carries no envelope
        if matches!(&outcome, Ok(r) if r.status == 304) {
            log::not_modified(resource.as_str());
            return Ok(FetchOutcome::NotModified);
        }
        let new_etag = outcome
            .as_ref()
            .ok()
            .and_then(|r| r.header("ETag"))
            .map(str::to_string);

        let envelope = parse_response(&url, resource, outcome)?;
        let value = normalize(envelope)?;

        if let Some(tag) = new_etag {
            if etag.update(&tag) {
                log::debug!(resource = resource.as_str(), etag = %tag, "ETag updated");
            }
        }

        Ok(FetchOutcome::Modified(value))
    }

    /// Fetch and normalize node info
    pub async fn fetch_node_info(&self) -> Result<FetchOutcome<NodeInfo>> {
        let outcome = self
            .conditional_fetch(Resource::Node, |envelope| {
                let raw: NodeInfoResponse = envelope.decode_data(Resource::Node)?;
                Ok(normalize::node_info(&raw, &self.config))
            })
            .await?;

        if let FetchOutcome::Modified(info) = &outcome {
            log::info!(
                node_id = info.node_id,
                port = info.port,
                node_type = %info.node_type,
                transport = %info.transport_protocol,
                "Node info fetched"
            );
        }
        Ok(outcome)
    }

    /// Fetch and normalize the user list. The node type is checked before
    /// any request is sent.
    pub async fn fetch_user_list(&self) -> Result<FetchOutcome<Vec<UserInfo>>> {
        let node_type: NodeType = self.config.node_type.parse()?;

        let outcome = self
            .conditional_fetch(Resource::Users, |envelope| {
                let raw: UserListResponse = envelope.decode_data(Resource::Users)?;
                Ok(normalize::user_list(&raw, &self.config, node_type))
            })
            .await?;

        if let FetchOutcome::Modified(users) = &outcome {
            log::debug!(count = users.len(), "Users fetched");
        }
        Ok(outcome)
    }

    pub fn fetch_local_rules(&self) -> Vec<DetectRule> {
        self.local_rules.clone()
    }

    pub fn describe(&self) -> ClientInfo {
        ClientInfo {
            api_host: self.config.api_host.clone(),
            node_id: self.config.node_id,
            key: self.config.key.clone(),
            node_type: self.config.node_type.clone(),
        }
    }
}

// Reporting has no wire contract on this panel yet; the calls succeed without
// touching the network.
#[async_trait]
impl PanelApi for ApiClient {
    async fn fetch_node_info(&self) -> Result<FetchOutcome<NodeInfo>> {
        ApiClient::fetch_node_info(self).await
    }

    async fn fetch_user_list(&self) -> Result<FetchOutcome<Vec<UserInfo>>> {
        ApiClient::fetch_user_list(self).await
    }

    fn fetch_local_rules(&self) -> Vec<DetectRule> {
        ApiClient::fetch_local_rules(self)
    }

    async fn report_node_status(&self, _status: &NodeStatus) -> Result<()> {
        Ok(())
    }

    async fn report_online_users(&self, _users: &[OnlineUser]) -> Result<()> {
        Ok(())
    }

    async fn report_user_traffic(&self, _traffic: &[UserTraffic]) -> Result<()> {
        Ok(())
    }

    async fn report_illegal(&self, _results: &[DetectResult]) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> ClientInfo {
        ApiClient::describe(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::api::transport::PanelResponse;
    use crate::error::TransportError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records requests and replays canned responses in order
    #[derive(Default)]
    struct SpyTransport {
        requests: Mutex<Vec<PanelRequest>>,
        responses: Mutex<VecDeque<std::result::Result<PanelResponse, TransportError>>>,
    }

    impl SpyTransport {
        fn with_responses(
            responses: Vec<std::result::Result<PanelResponse, TransportError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn requests(&self) -> Vec<PanelRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PanelTransport for SpyTransport {
        async fn post_json(
            &self,
            request: &PanelRequest,
        ) -> std::result::Result<PanelResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("no canned response")))
        }
    }

    fn ok(data: serde_json::Value) -> PanelResponse {
        let body = serde_json::json!({"code": 0, "msg": "ok", "data": data});
        PanelResponse::new(200, body.to_string())
    }

    fn node_data() -> serde_json::Value {
        serde_json::json!({
            "name": "hk-01",
            "port": 443,
            "node_speed_limit": 8,
            "node_type": "V2ray",
            "enable_tls": true,
            "transport_protocol": "ws",
            "path": "/ws",
            "host": "cdn.example.com",
            "method": "aes-128-gcm",
            "server_key": "k"
        })
    }

    fn client(config: ApiConfig, spy: &Arc<SpyTransport>) -> ApiClient {
        ApiClient::with_transport(config, Arc::clone(spy) as Arc<dyn PanelTransport>).unwrap()
    }

    fn config() -> ApiConfig {
        ApiConfig::new("http://127.0.0.1:3000", "123", 4)
    }

    #[tokio::test]
    async fn test_fetch_node_info_request_shape() {
        let spy = SpyTransport::with_responses(vec![Ok(ok(node_data()))]);
        let client = client(config(), &spy);

        let info = client.fetch_node_info().await.unwrap().modified().unwrap();
        assert_eq!(info.node_id, 4);
        assert_eq!(info.speed_limit, 1_000_000);

        let requests = spy.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://127.0.0.1:3000/api/public/xrayr/node/info"
        );
        assert_eq!(requests[0].body, serde_json::json!({"node_id": 4}));
        assert_eq!(requests[0].query, vec![("key".to_string(), "123".to_string())]);
        assert_eq!(requests[0].header_value("If-None-Match"), None);
    }

    #[tokio::test]
    async fn test_etag_sent_on_next_request() {
        let spy = SpyTransport::with_responses(vec![
            Ok(ok(node_data()).with_header("ETag", "\"v1\"")),
            Ok(ok(node_data()).with_header("ETag", "\"v2\"")),
            Ok(PanelResponse::new(304, "")),
        ]);
        let client = client(config(), &spy);

        client.fetch_node_info().await.unwrap();
        client.fetch_node_info().await.unwrap();
        let third = client.fetch_node_info().await.unwrap();
        assert!(third.is_not_modified());

        let requests = spy.requests();
        assert_eq!(requests[1].header_value("If-None-Match"), Some("\"v1\""));
        assert_eq!(requests[2].header_value("If-None-Match"), Some("\"v2\""));
        assert_eq!(client.etag(Resource::Node).await, "\"v2\"");
        assert_eq!(client.etag(Resource::Users).await, "");
    }

    #[tokio::test]
    async fn test_not_modified_keeps_etag() {
        let spy = SpyTransport::with_responses(vec![
            Ok(ok(serde_json::json!({"list": []})).with_header("ETag", "u1")),
            Ok(PanelResponse::new(304, "").with_header("ETag", "ignored")),
        ]);
        let client = client(config(), &spy);

        client.fetch_user_list().await.unwrap();
        assert!(client.fetch_user_list().await.unwrap().is_not_modified());
        assert_eq!(client.etag(Resource::Users).await, "u1");
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_update_etag() {
        let spy = SpyTransport::with_responses(vec![Ok(PanelResponse::new(
            200,
            r#"{"code":1,"msg":"node disabled","data":null}"#,
        )
        .with_header("ETag", "v1"))]);
        let client = client(config(), &spy);

        let err = client.fetch_node_info().await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteLogical { .. }));
        assert_eq!(client.etag(Resource::Node).await, "");
    }

    #[tokio::test]
    async fn test_null_user_list_clears_roster() {
        let spy = SpyTransport::with_responses(vec![
            Ok(ok(serde_json::json!({"list": null}))),
            Ok(PanelResponse::new(200, r#"{"code":0,"msg":"","data":null}"#)),
        ]);
        let client = client(config(), &spy);

        assert_eq!(
            client.fetch_user_list().await.unwrap(),
            FetchOutcome::Modified(vec![])
        );
        assert_eq!(
            client.fetch_user_list().await.unwrap(),
            FetchOutcome::Modified(vec![])
        );
    }

    #[tokio::test]
    async fn test_null_user_name_gets_placeholder_email() {
        let spy = SpyTransport::with_responses(vec![Ok(ok(serde_json::json!({
            "list": [{"uid": 9, "uuid": "abc", "user_name": null}]
        })))]);
        let client = client(config(), &spy);

        let users = client.fetch_user_list().await.unwrap().modified().unwrap();
        assert_eq!(users[0].email, "@vpnboard.user");
    }

    #[tokio::test]
    async fn test_null_node_host_is_empty() {
        let mut data = node_data();
        data["host"] = serde_json::Value::Null;
        let spy = SpyTransport::with_responses(vec![Ok(ok(data))]);
        let client = client(config(), &spy);

        let info = client.fetch_node_info().await.unwrap().modified().unwrap();
        assert_eq!(info.host, "");
        assert_eq!(info.port, 443);
    }

    #[tokio::test]
    async fn test_unsupported_node_type_sends_nothing() {
        let spy = SpyTransport::with_responses(vec![]);
        let client = client(config().with_node_type("Foo"), &spy);

        let err = client.fetch_user_list().await.unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedNodeType(ref t) if t == "Foo"));
        assert!(spy.requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_carries_url() {
        let spy = SpyTransport::with_responses(vec![Err(TransportError::new("dns error"))]);
        let client = client(config(), &spy);

        match client.fetch_user_list().await.unwrap_err() {
            ApiError::Transport { url, message } => {
                assert_eq!(url, "http://127.0.0.1:3000/api/public/xrayr/user/list");
                assert_eq!(message, "dns error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_list_decode_failure_echoes_payload() {
        let spy = SpyTransport::with_responses(vec![Ok(ok(serde_json::json!({
            "list": [{"uid": "one", "uuid": "abc"}]
        })))]);
        let client = client(config(), &spy);

        match client.fetch_user_list().await.unwrap_err() {
            ApiError::Decode { resource, raw, .. } => {
                assert_eq!(resource, "users");
                assert!(raw.contains("\"one\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reports_are_noops() {
        let spy = SpyTransport::with_responses(vec![]);
        let client = client(config(), &spy);
        let api: &dyn PanelApi = &client;

        api.report_node_status(&NodeStatus::default()).await.unwrap();
        api.report_online_users(&[OnlineUser {
            uid: 1,
            ip: "1.1.1.1".to_string(),
        }])
        .await
        .unwrap();
        api.report_user_traffic(&[]).await.unwrap();
        api.report_illegal(&[DetectResult { uid: 1, rule_id: 2 }])
            .await
            .unwrap();
        assert!(spy.requests().is_empty());
    }

    #[tokio::test]
    async fn test_describe() {
        let spy = SpyTransport::with_responses(vec![]);
        let client = client(config().with_node_type("Trojan"), &spy);

        let info = client.describe();
        assert_eq!(info.api_host, "http://127.0.0.1:3000");
        assert_eq!(info.node_id, 4);
        assert_eq!(info.key, "123");
        assert_eq!(info.node_type, "Trojan");
    }

    #[tokio::test]
    async fn test_local_rules_empty_without_file() {
        let spy = SpyTransport::with_responses(vec![]);
        let client = client(config(), &spy);
        assert!(client.fetch_local_rules().is_empty());
    }

    #[test]
    fn test_invalid_rule_file_fails_construction() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[invalid\n").unwrap();

        let spy = SpyTransport::with_responses(vec![]);
        let res = ApiClient::with_transport(
            config().with_rule_list_path(file.path()),
            spy as Arc<dyn PanelTransport>,
        );
        assert!(matches!(res, Err(ApiError::Config(_))));
    }
}
