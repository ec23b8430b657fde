//! Messages sent down to devices.

use reqwest::Method;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::client::{Client, Error};

/// A message to be delivered to one device or broadcast to a collection.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DownstreamMessage {
    /// Destination port on the device.
    pub port: u16,
    /// Opaque payload, base64 on the wire.
    #[serde(default, with = "crate::base64_bytes")]
    pub payload: Vec<u8>,
    /// CoAP path, when the device is reached over CoAP.
    #[serde(rename = "coapPath", default, skip_serializing_if = "Option::is_none")]
    pub coap_path: Option<String>,
    /// Transport override ("udp" or "coap").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
}

/// Outcome of a collection broadcast.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// Number of devices the message was sent to.
    #[serde(default)]
    pub sent: u32,
    /// Number of devices that could not be reached.
    #[serde(default)]
    pub failed: u32,
    /// Per-device delivery failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BroadcastError>,
}

/// A single delivery failure inside a [`BroadcastResult`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastError {
    /// Device the delivery failed for.
    pub device_id: String,
    /// Server-supplied failure description.
    pub message: String,
}

impl Client {
    /// Sends a message to one device.
    ///
    /// The provisioning state of the device is a server-side concern: an
    /// unprovisioned target surfaces as whatever status the server answers
    /// with, available through [`Error::status`].
    pub async fn send(
        &self,
        collection_id: &str,
        device_id: &str,
        message: &DownstreamMessage,
    ) -> Result<(), Error> {
        self.request::<_, IgnoredAny>(
            Method::POST,
            &format!("/collections/{collection_id}/devices/{device_id}/to"),
            Some(message),
        )
        .await?;
        Ok(())
    }

    /// Broadcasts a message to every device in a collection.
    pub async fn broadcast(
        &self,
        collection_id: &str,
        message: &DownstreamMessage,
    ) -> Result<BroadcastResult, Error> {
        Ok(self
            .request(
                Method::POST,
                &format!("/collections/{collection_id}/to"),
                Some(message),
            )
            .await?
            .unwrap_or_default())
    }
}
