//! vpnboard response envelope

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::Resource;
use super::transport::PanelResponse;
use crate::error::{ApiError, Result, TransportError};

/// Uniform wrapper around every panel payload; `code == 0` is success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Decode `data` into the resource's payload type; `null` is the empty payload
    pub fn decode_data<T: DeserializeOwned + Default>(&self, resource: Resource) -> Result<T> {
        if self.data.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.data.clone()).map_err(|e| ApiError::Decode {
            resource: resource.as_str(),
            message: e.to_string(),
            raw: self.data.to_string(),
        })
    }
}

/// Classify a transport outcome and unwrap the envelope.
///
/// A 304 is not an envelope and must be handled by the caller first.
pub fn parse_response(
    url: &str,
    resource: Resource,
    outcome: std::result::Result<PanelResponse, TransportError>,
) -> Result<Envelope> {
    let response = outcome.map_err(|e| ApiError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if response.status > 400 {
        return Err(ApiError::Remote {
            status: response.status,
            url: url.to_string(),
            body: response.body_text(),
        });
    }

    let envelope: Envelope =
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode {
            resource: resource.as_str(),
            message: format!("invalid envelope: {}", e),
            raw: response.body_text(),
        })?;

    if envelope.code != 0 {
        let serialized =
            serde_json::to_string(&envelope).unwrap_or_else(|_| format!("{:?}", envelope));
        return Err(ApiError::RemoteLogical {
            envelope: serialized,
        });
    }

    Ok(envelope)
}
