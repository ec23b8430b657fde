//! Tri-state optional fields.
//!
//! The API distinguishes "field not sent" from "field explicitly null" in
//! partial updates. [`Field`] keeps that distinction where a plain `Option`
//! would collapse it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that is absent, explicitly null, or set to a value.
///
/// On the wire, `Absent` is skipped entirely (pair it with
/// `#[serde(default, skip_serializing_if = "Field::is_absent")]`), `Null`
/// serializes to `null`, and `Value` to the value itself. A missing field
/// deserializes to `Absent`, `null` to `Null`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field<T> {
    /// The field is not present on the wire.
    Absent,
    /// The field is present and explicitly null.
    Null,
    /// The field is present with a value.
    Value(T),
}

impl<T> Field<T> {
    /// Returns true when the field is not present on the wire.
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// Returns true when the field is an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// Returns the value, if one is set.
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the field, returning the value if one is set.
    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

/// `Some` becomes a value, `None` an explicit null.
impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Value(value),
            None => Field::Null,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Value(value) => serializer.serialize_some(value),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::Field;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Patch {
        #[serde(default, skip_serializing_if = "Field::is_absent")]
        name: Field<String>,
    }

    #[test]
    fn absent_is_skipped() {
        let json = serde_json::to_string(&Patch {
            name: Field::Absent,
        })
        .expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn null_is_serialized_explicitly() {
        let json = serde_json::to_string(&Patch { name: Field::Null }).expect("serialize");
        assert_eq!(json, r#"{"name":null}"#);
    }

    #[test]
    fn value_round_trips() {
        let patch = Patch {
            name: Field::Value("sensor-1".to_string()),
        };
        let json = serde_json::to_string(&patch).expect("serialize");
        assert_eq!(json, r#"{"name":"sensor-1"}"#);
        let decoded: Patch = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, patch);
    }

    #[test]
    fn missing_field_deserializes_to_absent() {
        let decoded: Patch = serde_json::from_str("{}").expect("deserialize");
        assert!(decoded.name.is_absent());

        let decoded: Patch = serde_json::from_str(r#"{"name":null}"#).expect("deserialize");
        assert!(decoded.name.is_null());
    }

    #[test]
    fn conversions_preserve_tri_state_intent() {
        assert_eq!(Field::from("a".to_string()).value(), Some(&"a".to_string()));
        assert_eq!(Field::<String>::from(None), Field::Null);
        assert_eq!(Field::from(Some(7)).into_value(), Some(7));
    }
}
