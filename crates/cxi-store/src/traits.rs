use chrono::NaiveDateTime;
use cxi_types::{EntityId, PropertyRecord};

use crate::error::StoreResult;
use crate::key::{RecordKey, RecordSet};

/// Keyed store of entity property records.
///
/// All implementations must satisfy these invariants:
/// - `put` replaces the whole record at its key.
/// - A reader never observes a partially written record.
/// - Absent records are a normal outcome (`Ok(None)`), not an error.
/// - After [`seal`](PropertyStore::seal) every write fails with
///   [`StoreError::ReadOnly`](crate::StoreError::ReadOnly).
/// - Enumeration is deterministic: numeric ids ascending, keys
///   lexicographic.
pub trait PropertyStore: Send + Sync {
    /// Read a record.
    ///
    /// Returns `Ok(None)` if no record exists at `key`.
    fn get(&self, key: &RecordKey) -> StoreResult<Option<PropertyRecord>>;

    /// Write a record, replacing any previous record at `key`.
    fn put(&self, key: &RecordKey, record: &PropertyRecord) -> StoreResult<()>;

    /// Check whether a record exists.
    fn contains(&self, key: &RecordKey) -> StoreResult<bool>;

    /// Enumerate the ids present in a record family.
    fn list_ids(&self, set: &RecordSet) -> StoreResult<Vec<EntityId>>;

    /// Make the store read-only.
    fn seal(&self);

    /// Returns `true` once the store has been sealed.
    fn is_sealed(&self) -> bool;

    /// Read a record, or hand out a fresh empty one when absent and
    /// `create_if_absent` is set. Nothing is written.
    fn get_or_create(
        &self,
        key: &RecordKey,
        create_if_absent: bool,
    ) -> StoreResult<Option<PropertyRecord>> {
        Ok(match self.get(key)? {
            Some(record) => Some(record),
            None if create_if_absent => Some(PropertyRecord::new()),
            None => None,
        })
    }

    /// Read-modify-write a record, starting from an empty record when
    /// absent. Returns the record as written.
    fn merge(
        &self,
        key: &RecordKey,
        update: &mut dyn FnMut(&mut PropertyRecord),
    ) -> StoreResult<PropertyRecord> {
        let mut record = self.get_or_create(key, true)?.unwrap_or_default();
        update(&mut record);
        self.put(key, &record)?;
        Ok(record)
    }

    /// Date property of a record, or `default` when the record or property
    /// is absent or unreadable.
    fn get_date(
        &self,
        key: &RecordKey,
        property: &str,
        default: Option<NaiveDateTime>,
    ) -> StoreResult<Option<NaiveDateTime>> {
        Ok(match self.get(key)? {
            Some(record) => record.get_date(property, default),
            None => default,
        })
    }

    /// List-of-longs property of a record, or `default` when the record or
    /// property is absent or unreadable.
    fn get_long_list(
        &self,
        key: &RecordKey,
        property: &str,
        default: Vec<i64>,
    ) -> StoreResult<Vec<i64>> {
        Ok(match self.get(key)? {
            Some(record) => record.get_long_list(property, default),
            None => default,
        })
    }
}
