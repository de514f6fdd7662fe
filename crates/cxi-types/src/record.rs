//! The ordered property record persisted for every entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::id::EntityId;
use crate::value::PropertyValue;

/// Ordered key→value bag describing one decoded entity.
///
/// Keys keep their first insertion position; setting an existing key
/// replaces its value in place. Serializes as a JSON array of
/// `[key, value]` pairs so the order survives a round trip through disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyRecord {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a property by key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the property is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a property, replacing any previous value at the same position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a property, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Append `value` to the collection stored at `key`, creating a list if
    /// absent. A set only takes values it does not already hold. A scalar
    /// already stored at `key` becomes the first element of a new list.
    pub fn append_to_list(&mut self, key: &str, value: PropertyValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, PropertyValue::List(items))) => items.push(value),
            Some((_, PropertyValue::Set(items))) => {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            Some((_, slot)) => {
                let previous = std::mem::replace(slot, PropertyValue::List(Vec::new()));
                *slot = PropertyValue::List(vec![previous, value]);
            }
            None => self
                .entries
                .push((key.to_string(), PropertyValue::List(vec![value]))),
        }
    }

    /// Iterate over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    // -----------------------------------------------------------------------
    // Coercing accessors
    // -----------------------------------------------------------------------

    /// Text of a `Text` property.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_text()
    }

    /// Id of a `Reference` property.
    pub fn reference(&self, key: &str) -> Option<&EntityId> {
        self.get(key)?.as_reference()
    }

    /// Property coerced to a long.
    pub fn long(&self, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        let long = value.to_long();
        if long.is_none() {
            debug!(key, ?value, "property is not a long");
        }
        long
    }

    /// Property coerced to a boolean.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key)?.to_bool()
    }

    /// Property coerced to a date.
    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        let value = self.get(key)?;
        let date = value.to_date();
        if date.is_none() {
            debug!(key, ?value, "property is not a date");
        }
        date
    }

    /// Property coerced to a list of longs.
    pub fn long_list(&self, key: &str) -> Option<Vec<i64>> {
        let value = self.get(key)?;
        let list = value.to_long_list();
        if list.is_none() {
            debug!(key, ?value, "property is not a list of longs");
        }
        list
    }

    /// Date at `key`, or `default` when absent or unreadable.
    pub fn get_date(&self, key: &str, default: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
        self.date(key).or(default)
    }

    /// List of longs at `key`, or `default` when absent or unreadable.
    pub fn get_long_list(&self, key: &str, default: Vec<i64>) -> Vec<i64> {
        self.long_list(key).unwrap_or(default)
    }

    /// Long at `key`, or `default` when absent or unreadable.
    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        self.long(key).unwrap_or(default)
    }

    /// Boolean at `key`, or `default` when absent or unreadable.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.boolean(key).unwrap_or(default)
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyRecord {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.set(key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> PropertyRecord {
        let mut record = PropertyRecord::new();
        record.set("title", "Home");
        record.set("space", EntityId::from(98304));
        record.set("creationDate", "2012-03-14 10:27:31.000");
        record
    }

    #[test]
    fn set_keeps_insertion_order_and_replaces_in_place() {
        let mut record = sample();
        record.set("title", "Renamed");
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["title", "space", "creationDate"]);
        assert_eq!(record.text("title"), Some("Renamed"));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn remove_returns_value() {
        let mut record = sample();
        assert_eq!(record.remove("title"), Some(PropertyValue::from("Home")));
        assert!(!record.contains("title"));
        assert!(record.remove("title").is_none());
    }

    #[test]
    fn append_to_list_creates_and_extends() {
        let mut record = PropertyRecord::new();
        record.append_to_list("users", EntityId::from(1).into());
        record.append_to_list("users", EntityId::from(2).into());
        assert_eq!(record.long_list("users"), Some(vec![1, 2]));
    }

    #[test]
    fn append_to_list_wraps_scalar() {
        let mut record = PropertyRecord::new();
        record.set("users", "7");
        record.append_to_list("users", PropertyValue::Long(8));
        assert_eq!(record.long_list("users"), Some(vec![7, 8]));
    }

    #[test]
    fn append_to_set_stays_a_set() {
        let mut record = PropertyRecord::new();
        record.set("users", PropertyValue::set_from([EntityId::from(1).into()]));
        record.append_to_list("users", EntityId::from(2).into());
        record.append_to_list("users", EntityId::from(1).into());
        assert_eq!(
            record.get("users"),
            Some(&PropertyValue::Set(vec![
                EntityId::from(1).into(),
                EntityId::from(2).into()
            ]))
        );
        assert_eq!(record.get_long_list("users", Vec::new()), vec![1, 2]);
    }

    #[test]
    fn date_accessor_with_default() {
        let record = sample();
        let expected = NaiveDate::from_ymd_opt(2012, 3, 14)
            .unwrap()
            .and_hms_milli_opt(10, 27, 31, 0)
            .unwrap();
        assert_eq!(record.get_date("creationDate", None), Some(expected));

        let fallback = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(record.get_date("title", Some(fallback)), Some(fallback));
        assert_eq!(record.get_date("missing", None), None);
    }

    #[test]
    fn long_list_default_on_failure() {
        let record = sample();
        assert_eq!(record.get_long_list("title", vec![0]), vec![0]);
        assert_eq!(record.get_long_list("missing", Vec::new()), Vec::<i64>::new());
    }

    #[test]
    fn long_and_bool_defaults() {
        let mut record = sample();
        record.set("homepage", "true");
        assert_eq!(record.get_long("space", -1), 98304);
        assert_eq!(record.get_long("title", -1), -1);
        assert!(record.get_bool("homepage", false));
        assert!(!record.get_bool("missing", false));
    }

    #[test]
    fn json_roundtrip_preserves_order() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with("[[\"title\""));
        let parsed: PropertyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
