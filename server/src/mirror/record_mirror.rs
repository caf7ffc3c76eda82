// server/src/mirror/record_mirror.rs
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rocket::serde::json::Value;
use rocket::serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Record, RecordId};

/// Row shape written to and read back from the mirror table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MirrorRow {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
    pub timestamp: String,
}

impl MirrorRow {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            value: record.value.clone(),
            description: record.description.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("mirror request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mirror responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid mirror url: {0}")]
    Url(#[from] url::ParseError),
    #[error("mirror timed out after {0} ms")]
    Timeout(u64),
    #[error("mirror unavailable: {0}")]
    Unavailable(String),
}

/// A best-effort secondary copy of written records.
#[async_trait]
pub trait RecordMirror: Send + Sync {
    async fn insert_row(&self, row: &MirrorRow) -> Result<(), MirrorError>;

    async fn fetch_rows(&self) -> Result<Vec<MirrorRow>, MirrorError>;

    /// Short label used in log lines.
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewRecord;
    use rocket::serde::json::json;

    #[test]
    fn test_row_copies_record() {
        let record = NewRecord::new("x", json!({"k": [1, 2]}))
            .with_description("d")
            .into_record(4);
        let row = MirrorRow::from_record(&record);
        assert_eq!(row.id, 4);
        assert_eq!(row.name, "x");
        assert_eq!(row.value, json!({"k": [1, 2]}));
        assert_eq!(row.description.as_deref(), Some("d"));
        assert!(chrono::DateTime::parse_from_rfc3339(&row.timestamp).is_ok());
    }
}
