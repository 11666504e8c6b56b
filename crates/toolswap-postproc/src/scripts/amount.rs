//! Serde helpers for optional distances
//!
//! TOML has no null, so an unset distance is written as `false`. Reading
//! accepts a number, `false`, or (in JSON) `null`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAmount {
    Value(f64),
    Flag(bool),
}

pub(crate) fn serialize_amount<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_bool(false),
    }
}

pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StoredAmount>::deserialize(deserializer)? {
        Some(StoredAmount::Value(v)) => Ok(Some(v)),
        Some(StoredAmount::Flag(false)) | None => Ok(None),
        Some(StoredAmount::Flag(true)) => Err(D::Error::custom(
            "expected a distance in mm, or false to leave it unset",
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::scripts::FilamentChangeParams;

    #[test]
    fn test_unset_amounts_are_written_as_false() {
        let params = FilamentChangeParams {
            later_retract: None,
            ..FilamentChangeParams::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["later_retract"], serde_json::json!(false));
        assert_eq!(json["initial_retract"], serde_json::json!(30.0));

        let parsed: FilamentChangeParams = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_reading_amounts() {
        let parsed: FilamentChangeParams = serde_json::from_str(
            r#"{ "initial_retract": 5, "later_retract": null, "x_position": false }"#,
        )
        .unwrap();
        assert_eq!(parsed.initial_retract, Some(5.0));
        assert_eq!(parsed.later_retract, None);
        assert_eq!(parsed.x_position, None);
        assert_eq!(parsed.y_position, Some(0.0));

        let err = serde_json::from_str::<FilamentChangeParams>(r#"{ "x_position": true }"#);
        assert!(err.is_err());
    }
}
