//! JSON exports of back-office collections

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::shared::types::InfraError;

/// Load a JSON array (or `{ "data": [...] }`) from disk.
pub fn load_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, InfraError> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let items = match value {
        serde_json::Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    Ok(serde_json::from_value(items)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Shipment;

    #[test]
    fn reads_bare_and_wrapped_exports() {
        let dir = std::env::temp_dir().join(format!("courier-billing-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let awb = r#"{"_id":"a1","trackingNumber":"T1","date":"2024-01-02T00:00:00Z","refCode":"CL1"}"#;

        let bare = dir.join("bare.json");
        std::fs::write(&bare, format!("[{}]", awb)).unwrap();
        let wrapped = dir.join("wrapped.json");
        std::fs::write(&wrapped, format!(r#"{{"data":[{}]}}"#, awb)).unwrap();

        let a: Vec<Shipment> = load_json_list(&bare).unwrap();
        let b: Vec<Shipment> = load_json_list(&wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].tracking_number, "T1");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_json_list::<Shipment>(Path::new("/nonexistent/awb.json")).unwrap_err();
        assert!(matches!(err, InfraError::Io(_)));
    }
}
