//! Resource types shared across the API surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// A device registered in a collection.
///
/// Identity fields use [`Field`] so partial updates can distinguish an
/// untouched field from one explicitly cleared.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Server-assigned device identifier.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub device_id: Field<String>,
    /// Collection the device belongs to.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub collection_id: Field<String>,
    /// IMEI of the device module.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub imei: Field<String>,
    /// IMSI of the SIM.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub imsi: Field<String>,
    /// Free-form tags. Updates only add or overwrite tags.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::Device;
    use crate::field::Field;

    #[test]
    fn device_decodes_wire_names() {
        let device: Device = serde_json::from_str(
            r#"{"deviceId":"17dh0cf43jg007","collectionId":"17dh0cf43jg001","imei":"350457791002","imsi":"204047970100","tags":{"name":"gate-7"}}"#,
        )
        .expect("deserialize");

        assert_eq!(
            device.device_id.value().map(String::as_str),
            Some("17dh0cf43jg007")
        );
        assert_eq!(device.tags.get("name").map(String::as_str), Some("gate-7"));
    }

    #[test]
    fn unset_fields_stay_off_the_wire() {
        let device = Device {
            imsi: Field::Value("204047970100".to_string()),
            ..Device::default()
        };
        let json = serde_json::to_string(&device).expect("serialize");
        assert_eq!(json, r#"{"imsi":"204047970100"}"#);
    }
}
