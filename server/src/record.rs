// record.rs
use rocket::serde::json::Value;
use rocket::serde::{Deserialize, Serialize};

pub type RecordId = i64;

/// A record as submitted by a client. The id is optional on create and
/// ignored on update.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NewRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub(crate) fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            name: self.name,
            value: self.value,
            description: self.description,
        }
    }
}

/// A stored record. Always carries the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
