//! Raw input records.

use serde::{Deserialize, Serialize};

/// One input row: field names mapped to possibly-null string values.
///
/// Field order is the order in which values were added. A field that was
/// never added is *absent*; a field added with `None` is *null*. Only absence
/// can make a record malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    index: u64,
    values: Vec<(String, Option<String>)>,
}

impl RawRecord {
    /// Create an empty record at position `index` of the input stream.
    pub fn new(index: u64) -> Self {
        RawRecord {
            index,
            values: Vec::new(),
        }
    }

    /// Add a non-null value.
    pub fn with<K: Into<String>, V: Into<String>>(mut self, field: K, value: V) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    /// Add a null value.
    pub fn with_null<K: Into<String>>(mut self, field: K) -> Self {
        self.insert(field, None);
        self
    }

    /// Set a field, replacing an earlier value of the same name in place.
    pub fn insert<K: Into<String>>(&mut self, field: K, value: Option<String>) {
        let field = field.into();
        match self.values.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
    }

    /// Position of this record in the input stream.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// `None` if the field is absent, `Some(None)` if it is null.
    pub fn get(&self, field: &str) -> Option<Option<&str>> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_deref())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
