use std::collections::BTreeMap;

use chainsweep_core::{ErrorInfo, SweepError};
use serde::Serialize;
use serde_json::{Map, Value};

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, val)| (key, canonicalize(val)))
                .collect();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialises a payload to pretty JSON with lexicographically ordered keys.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SweepError> {
    let value = serde_json::to_value(value)
        .map_err(|err| SweepError::Serde(ErrorInfo::new("json-encode", err.to_string())))?;
    let mut bytes = serde_json::to_vec_pretty(&canonicalize(value))
        .map_err(|err| SweepError::Serde(ErrorInfo::new("json-write", err.to_string())))?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::to_canonical_json_bytes;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Job {
        status: &'static str,
        n: u32,
        artifact: &'static str,
    }

    #[derive(Serialize)]
    struct Report {
        plan_hash: &'static str,
        jobs: Vec<Job>,
        created_at: &'static str,
    }

    #[test]
    fn keys_are_sorted_at_every_depth() {
        let report = Report {
            plan_hash: "abc",
            jobs: vec![Job {
                status: "loaded",
                n: 3,
                artifact: "S_3.json",
            }],
            created_at: "2024-01-01T00:00:00Z",
        };
        let text = String::from_utf8(to_canonical_json_bytes(&report).unwrap()).unwrap();
        let position = |key: &str| text.find(&format!("\"{key}\"")).unwrap();
        assert!(position("created_at") < position("jobs"));
        assert!(position("jobs") < position("plan_hash"));
        assert!(position("artifact") < position("n"));
        assert!(position("n") < position("status"));
        assert!(text.ends_with("}\n"));
    }
}
