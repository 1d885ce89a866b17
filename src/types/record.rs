use std::collections::HashMap;

use super::Value;

/// Attribute record mapping field names to [`Value`]s.
///
/// Supplied fresh for each evaluation; the engine only borrows it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Insert a field (mutable reference version). Returns the previous value.
    pub fn insert(&mut self, field: &str, value: Value) -> Option<Value> {
        self.values.insert(field.to_owned(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a record from raw form input.
    ///
    /// Every value is trimmed and kept as [`Value::Text`]; numeric comparisons coerce it
    /// later. Blank values are left out, so a field the user did not fill in
    /// is reported as unknown instead of as a type mismatch.
    pub fn from_form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let values = pairs
            .into_iter()
            .filter_map(|(k, v)| {
                let text = v.as_ref().trim();
                (!text.is_empty()).then(|| (k.into(), Value::Text(text.to_owned())))
            })
            .collect();
        Self { values }
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
