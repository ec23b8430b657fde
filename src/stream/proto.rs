//! Wire protocol for output streams.
//!
//! Each inbound frame is a JSON envelope. Two discriminator generations are
//! in the field: current servers tag frames with `"type": "keepalive" |
//! "data"`, older ones with a `"keepAlive"` boolean. [`Envelope`] absorbs
//! both; only data frames carry an [`OutputDataMessage`].

use serde::{Deserialize, Serialize};

use crate::types::Device;

/// A message sent by a device, as delivered on an output stream.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDataMessage {
    /// The device that sent the message.
    #[serde(default)]
    pub device: Device,
    /// Opaque payload bytes, base64 on the wire.
    #[serde(default, with = "crate::base64_bytes")]
    pub payload: Vec<u8>,
    /// Server receive timestamp in milliseconds since the epoch.
    #[serde(default)]
    pub received: i64,
    /// Transport the message arrived over ("udp" or "coap").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    /// CoAP request details, when received over CoAP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coap_meta_data: Option<CoapMetadata>,
    /// UDP port pair, when received over UDP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_meta_data: Option<UdpMetadata>,
}

/// CoAP method and path of an upstream message.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoapMetadata {
    /// CoAP method, e.g. `POST`.
    #[serde(default)]
    pub method: String,
    /// CoAP path the device wrote to.
    #[serde(default)]
    pub path: String,
}

/// UDP port pair of an upstream message.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UdpMetadata {
    /// Port the message arrived on.
    #[serde(default)]
    pub local_port: u16,
    /// Source port on the device.
    #[serde(default)]
    pub remote_port: u16,
}

/// Inbound frame wrapper distinguishing keep-alives from data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    keep_alive: Option<bool>,
    #[serde(flatten)]
    message: OutputDataMessage,
}

impl Envelope {
    /// A frame is a keep-alive when either generation marks it as one, or
    /// when it carries an unrecognized `type` tag.
    pub(crate) fn is_keep_alive(&self) -> bool {
        if self.keep_alive == Some(true) {
            return true;
        }
        matches!(self.kind.as_deref(), Some(kind) if kind != "data")
    }

    pub(crate) fn into_message(self) -> OutputDataMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::Envelope;

    #[test]
    fn boolean_generation_marks_keep_alives() {
        let envelope: Envelope = serde_json::from_str(r#"{"keepAlive":true}"#).expect("decode");
        assert!(envelope.is_keep_alive());

        let envelope: Envelope = serde_json::from_str(
            r#"{"keepAlive":false,"device":{"deviceId":"d1"},"payload":"SGVsbG8=","received":1234}"#,
        )
        .expect("decode");
        assert!(!envelope.is_keep_alive());
        let message = envelope.into_message();
        assert_eq!(message.payload, b"Hello");
        assert_eq!(message.received, 1234);
    }

    #[test]
    fn tagged_generation_marks_keep_alives() {
        let envelope: Envelope = serde_json::from_str(r#"{"type":"keepalive"}"#).expect("decode");
        assert!(envelope.is_keep_alive());

        let envelope: Envelope =
            serde_json::from_str(r#"{"type":"data","payload":"cGluZw==","received":7}"#)
                .expect("decode");
        assert!(!envelope.is_keep_alive());
        assert_eq!(envelope.into_message().payload, b"ping");
    }

    #[test]
    fn unknown_type_tags_are_discarded_as_keep_alives() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"type":"heartbeat-v2"}"#).expect("decode");
        assert!(envelope.is_keep_alive());
    }

    #[test]
    fn bare_data_frame_without_discriminator_is_data() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"payload":"cGluZw==","received":9}"#).expect("decode");
        assert!(!envelope.is_keep_alive());
    }

    #[test]
    fn transport_metadata_decodes() {
        let envelope: Envelope = serde_json::from_str(
            r#"{
                "type": "data",
                "device": {"deviceId": "d1", "collectionId": "c1"},
                "payload": "SGVsbG8=",
                "received": 1700000000000,
                "transport": "coap",
                "coapMetaData": {"method": "POST", "path": "/up"},
                "udpMetaData": {"localPort": 31415, "remotePort": 5683}
            }"#,
        )
        .expect("decode");

        let message = envelope.into_message();
        let coap = message.coap_meta_data.expect("coap metadata");
        assert_eq!(coap.method, "POST");
        assert_eq!(coap.path, "/up");
        let udp = message.udp_meta_data.expect("udp metadata");
        assert_eq!(udp.local_port, 31415);
        assert_eq!(udp.remote_port, 5683);
    }
}
