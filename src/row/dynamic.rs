/// Untyped row view: ordered (name, value) pairs with case-insensitive lookup
///
/// This is the dictionary-style access path for callers without a target
/// type. It copies the row eagerly and does not go through the projector cache.
use crate::error::ProjectionResult;
use crate::row::accessor::RowAccessor;
use crate::value::Value;
use std::ops::Index;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRow {
    fields: Vec<(String, Value)>,
}

impl DynamicRow {
    pub fn from_accessor(row: &dyn RowAccessor) -> ProjectionResult<Self> {
        let mut fields = Vec::with_capacity(row.field_count());
        for ordinal in 0..row.field_count() {
            fields.push((row.field_name(ordinal).to_string(), row.get_value(ordinal)?));
        }
        Ok(Self { fields })
    }

    /// First field whose name matches, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn get_at(&self, ordinal: usize) -> Option<&Value> {
        self.fields.get(ordinal).map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Index<&str> for DynamicRow {
    type Output = Value;

    /// Missing names read as `Value::Null`
    fn index(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }
}
