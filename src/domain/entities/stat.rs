use serde::{Deserialize, Deserializer, Serialize};

/// Per-plugin invocation counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatEntry {
    #[serde(deserialize_with = "lenient_counter")]
    pub total: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub success: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub last: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub last_success: u64,
}

/// Legacy snapshots may hold strings, nulls or negative numbers here.
fn lenient_counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_numeric_fields_become_zero() {
        let raw = r#"{"total": "seven", "success": null, "last": -4, "lastSuccess": 12}"#;
        let entry: StatEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.total, 0);
        assert_eq!(entry.success, 0);
        assert_eq!(entry.last, 0);
        assert_eq!(entry.last_success, 12);
    }

    #[test]
    fn test_missing_fields_default() {
        let entry: StatEntry = serde_json::from_str(r#"{"total": 3}"#).unwrap();
        assert_eq!(entry.total, 3);
        assert_eq!(entry.success, 0);
    }
}
