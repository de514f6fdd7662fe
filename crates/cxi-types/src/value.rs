use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::temporal::parse_export_date;

/// A single property value.
///
/// The decoder produces `Text`, `List`, `Set` and `Reference` values; `Long`
/// and `Date` appear when records are built programmatically. Coercions
/// never fail loudly: they return `None` and the caller picks a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Long(i64),
    Text(String),
    Date(NaiveDateTime),
    /// Ordered list, duplicates allowed.
    List(Vec<PropertyValue>),
    /// Insertion-ordered list without duplicates.
    Set(Vec<PropertyValue>),
    Reference(EntityId),
}

impl PropertyValue {
    /// Build a set value, dropping duplicates but keeping first-seen order.
    pub fn set_from(values: impl IntoIterator<Item = PropertyValue>) -> Self {
        let mut out: Vec<PropertyValue> = Vec::new();
        for value in values {
            if !out.contains(&value) {
                out.push(value);
            }
        }
        Self::Set(out)
    }

    /// Borrow the text of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the id of a `Reference` value.
    pub fn as_reference(&self) -> Option<&EntityId> {
        match self {
            Self::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// Borrow the elements of a `List` or `Set` value.
    pub fn as_items(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Coerce to a long: longs, numeric references and numeric text.
    pub fn to_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            Self::Reference(id) => id.as_long(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce to a date: dates and text in a known export layout.
    pub fn to_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(dt) => Some(*dt),
            Self::Text(s) => parse_export_date(s),
            _ => None,
        }
    }

    /// Coerce a boolean-ish string (`true`/`false`, case-insensitive).
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Self::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Coerce every element of a list or set to a long. Fails if any
    /// element fails.
    pub fn to_long_list(&self) -> Option<Vec<i64>> {
        self.as_items()?.iter().map(Self::to_long).collect()
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<EntityId> for PropertyValue {
    fn from(id: EntityId) -> Self {
        Self::Reference(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_from_drops_duplicates_in_order() {
        let set = PropertyValue::set_from(vec![
            PropertyValue::from("b"),
            PropertyValue::from("a"),
            PropertyValue::from("b"),
        ]);
        assert_eq!(
            set,
            PropertyValue::Set(vec![PropertyValue::from("b"), PropertyValue::from("a")])
        );
    }

    #[test]
    fn long_coercions() {
        assert_eq!(PropertyValue::Long(3).to_long(), Some(3));
        assert_eq!(PropertyValue::from(" 42 ").to_long(), Some(42));
        assert_eq!(PropertyValue::Reference(EntityId::from(9)).to_long(), Some(9));
        assert_eq!(PropertyValue::Reference(EntityId::from("k")).to_long(), None);
        assert_eq!(PropertyValue::from("4x").to_long(), None);
    }

    #[test]
    fn bool_coercions() {
        assert_eq!(PropertyValue::from("TRUE").to_bool(), Some(true));
        assert_eq!(PropertyValue::from("false").to_bool(), Some(false));
        assert_eq!(PropertyValue::from("yes").to_bool(), None);
    }

    #[test]
    fn long_list_fails_on_any_bad_element() {
        let good = PropertyValue::List(vec![
            PropertyValue::Reference(EntityId::from(1)),
            PropertyValue::from("2"),
        ]);
        assert_eq!(good.to_long_list(), Some(vec![1, 2]));

        let bad = PropertyValue::List(vec![PropertyValue::from("1"), PropertyValue::from("x")]);
        assert_eq!(bad.to_long_list(), None);
        assert_eq!(PropertyValue::from("1").to_long_list(), None);
    }

    #[test]
    fn serde_shape_is_tagged() {
        let json = serde_json::to_string(&PropertyValue::Long(5)).unwrap();
        assert_eq!(json, r#"{"type":"long","value":5}"#);
        let value = PropertyValue::Set(vec![PropertyValue::Reference(EntityId::from("u1"))]);
        let json = serde_json::to_string(&value).unwrap();
        let parsed: PropertyValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }
}
