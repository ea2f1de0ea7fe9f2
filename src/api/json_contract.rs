use serde::{Deserialize, Serialize};

use crate::error::{ViewError, ViewResult};

use super::ViewSnapshot;

pub const VIEW_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: ViewSnapshot,
}

impl ViewSnapshot {
    pub fn to_json_pretty(&self) -> ViewResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ViewError::DocumentParse(format!("failed to serialize view snapshot: {e}"))
        })
    }

    pub fn to_json_contract_v1_pretty(&self) -> ViewResult<String> {
        let payload = ViewSnapshotJsonContractV1 {
            schema_version: VIEW_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ViewError::DocumentParse(format!("failed to serialize snapshot contract v1: {e}"))
        })
    }

    /// Accepts the bare snapshot or the versioned wrapper.
    pub fn from_json_compat_str(input: &str) -> ViewResult<Self> {
        if let Ok(snapshot) = serde_json::from_str::<ViewSnapshot>(input) {
            return Ok(snapshot);
        }
        let payload: ViewSnapshotJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            ViewError::DocumentParse(format!("failed to parse snapshot json payload: {e}"))
        })?;
        if payload.schema_version != VIEW_SNAPSHOT_JSON_SCHEMA_V1 {
            return Err(ViewError::DocumentParse(format!(
                "unsupported snapshot schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.snapshot)
    }
}
