//! Polymorphic output configurations.
//!
//! An output forwards device messages from a collection to an external
//! system. The wire record keeps the discriminator in a `type` field next to
//! a `config` object; [`OutputConfig`] is the closed set of variants. An
//! unknown `type` tag is a decoding error, never a guessed default.

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// Generic wire record for an output on a collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    /// Server-assigned output identifier.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub output_id: Field<String>,
    /// Collection the output belongs to.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub collection_id: Field<String>,
    /// Typed configuration, discriminated by the `type` field.
    #[serde(flatten)]
    pub config: OutputConfig,
}

/// Configuration for one output, discriminated by its `type` tag.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum OutputConfig {
    /// HTTP POSTs to a fixed URL.
    Webhook(WebhookConfig),
    /// Publishes to an MQTT broker.
    Mqtt(MqttConfig),
    /// Triggers an IFTTT event.
    Ifttt(IftttConfig),
    /// Forwards raw payloads over UDP.
    Udp(UdpConfig),
}

impl OutputConfig {
    /// Returns the wire discriminator for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputConfig::Webhook(_) => "webhook",
            OutputConfig::Mqtt(_) => "mqtt",
            OutputConfig::Ifttt(_) => "ifttt",
            OutputConfig::Udp(_) => "udp",
        }
    }
}

/// Webhook output settings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// URL messages are POSTed to.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_header_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_header_value: Option<String>,
}

/// MQTT output settings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttConfig {
    /// Broker endpoint, e.g. `ssl://broker.example:8883`.
    pub endpoint: String,
    /// Client identifier presented to the broker.
    pub client_id: String,
    /// Topic messages are published to.
    pub topic_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Skip broker certificate verification.
    #[serde(default)]
    pub disable_cert_check: bool,
}

/// IFTTT output settings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IftttConfig {
    /// IFTTT service key.
    pub key: String,
    /// Event name reported to IFTTT.
    pub event_name: String,
    /// Pass the payload through without wrapping it.
    #[serde(default)]
    pub as_is_payload: bool,
}

/// UDP output settings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UdpConfig {
    /// Destination host.
    pub host: String,
    /// Destination port.
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::{Output, OutputConfig, UdpConfig, WebhookConfig};
    use crate::field::Field;

    #[test]
    fn webhook_record_round_trips() {
        let output = Output {
            output_id: Field::Value("out-1".to_string()),
            collection_id: Field::Value("c1".to_string()),
            config: OutputConfig::Webhook(WebhookConfig {
                url: "https://hooks.example/ingest".to_string(),
                ..WebhookConfig::default()
            }),
        };

        let value = serde_json::to_value(&output).expect("serialize");
        assert_eq!(value.get("type").and_then(|v| v.as_str()), Some("webhook"));
        assert_eq!(
            value
                .pointer("/config/url")
                .and_then(|v| v.as_str()),
            Some("https://hooks.example/ingest")
        );

        let decoded: Output = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, output);
    }

    #[test]
    fn udp_record_decodes_from_wire() {
        let output: Output = serde_json::from_str(
            r#"{"outputId":"out-2","collectionId":"c1","type":"udp","config":{"host":"collector.example","port":9000}}"#,
        )
        .expect("deserialize");

        assert_eq!(
            output.config,
            OutputConfig::Udp(UdpConfig {
                host: "collector.example".to_string(),
                port: 9000,
            })
        );
        assert_eq!(output.config.kind(), "udp");
    }

    #[test]
    fn unknown_type_tag_is_a_decoding_error() {
        let result = serde_json::from_str::<Output>(
            r#"{"outputId":"out-3","type":"carrier-pigeon","config":{}}"#,
        );
        assert!(result.is_err());
    }
}
