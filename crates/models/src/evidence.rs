use mongodb::bson::{oid::ObjectId, spec::BinarySubtype, Binary};
use serde::{Deserialize, Serialize};

/// Proof-of-payment file (collection `evidence`), keyed by the payment's hex id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub payment_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_data: Binary,
}

pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

impl Evidence {
    pub fn new(payment_id: impl Into<String>, file_name: impl Into<String>, file_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_type = file_type.into();
        Self {
            id: None,
            payment_id: payment_id.into(),
            file_name: file_name.into(),
            file_type: if file_type.trim().is_empty() { DEFAULT_FILE_TYPE.to_string() } else { file_type },
            file_data: Binary { subtype: BinarySubtype::Generic, bytes },
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.file_data.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.file_data.bytes.is_empty()
    }

    /// `attachment; filename="..."` with quotes and control characters stripped.
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .file_name
            .chars()
            .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
            .collect();
        let safe = if safe.trim().is_empty() { "evidence".to_string() } else { safe };
        format!("attachment; filename=\"{safe}\"")
    }
}
