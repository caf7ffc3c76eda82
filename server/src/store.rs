// store.rs
use std::sync::Arc;

use log::debug;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::record::{NewRecord, Record, RecordId};

pub type SharedStore = Arc<RwLock<RecordStore>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no record with id {0}")]
    NotFound(RecordId),
    #[error("id {0} leaves no room for further ids")]
    IdOutOfRange(RecordId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered in-memory collection of records.
///
/// Records are kept in insertion order and looked up by linear scan. When
/// duplicate ids exist (explicit ids are not checked), the first match wins.
///
/// Auto-assigned ids come from `next_id`, which only moves forward: an id
/// freed by a delete is never handed out again, and an explicit id pushes
/// the counter past itself. An id with no successor (`RecordId::MAX`) is
/// refused, since the counter could not move past it.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<Record>,
    next_id: RecordId,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id the next record inserted without an explicit id will receive.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Appends a record, assigning the next id when the caller gave none.
    /// Returns the stored record and the new total.
    pub fn insert(&mut self, new: NewRecord) -> StoreResult<(Record, usize)> {
        let id = new.id.unwrap_or(self.next_id);
        let successor = id.checked_add(1).ok_or(StoreError::IdOutOfRange(id))?;
        self.next_id = self.next_id.max(successor);
        let record = new.into_record(id);
        debug!("insert: id {} at position {}", id, self.records.len());
        self.records.push(record.clone());
        Ok((record, self.records.len()))
    }

    pub fn get_all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> StoreResult<&Record> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Replaces the record with the given id in place. Any id carried by
    /// `new` is discarded in favour of `id`.
    pub fn update(&mut self, id: RecordId, new: NewRecord) -> StoreResult<(Record, usize)> {
        let index = self.position(id)?;
        let record = new.into_record(id);
        self.records[index] = record.clone();
        debug!("update: id {} at position {}", id, index);
        Ok((record, self.records.len()))
    }

    pub fn delete(&mut self, id: RecordId) -> StoreResult<(Record, usize)> {
        let index = self.position(id)?;
        let removed = self.records.remove(index);
        debug!("delete: id {} from position {}", id, index);
        Ok((removed, self.records.len()))
    }

    /// Inserts each record in order, exactly as repeated `insert` calls would.
    /// Either every record is stored or, on the first refused id, none are.
    pub fn bulk_insert<I>(&mut self, records: I) -> StoreResult<(Vec<Record>, usize)>
    where
        I: IntoIterator<Item = NewRecord>,
    {
        let (len, next_id) = (self.records.len(), self.next_id);
        let created = records
            .into_iter()
            .map(|new| self.insert(new).map(|(record, _)| record))
            .collect::<StoreResult<Vec<_>>>();
        match created {
            Ok(created) => Ok((created, self.records.len())),
            Err(e) => {
                self.records.truncate(len);
                self.next_id = next_id;
                Err(e)
            }
        }
    }

    fn position(&self, id: RecordId) -> StoreResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
