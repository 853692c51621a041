/// Shape: the (target type, ordered column list) key of the projector cache
///
/// Two shapes are equal iff the target types match and the column lists match
/// element-wise by name (case-insensitive) and declared type. A removable
/// column prefix changes the mapping plan, so it is part of equality too.
///
/// The hash is deliberately cheap: target type, column count and the first and
/// last column names only. Collisions are resolved by equality.
use crate::metadata::column::Column;
use crate::row::RowSchema;
use std::any::TypeId;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Shape {
    target: TypeId,
    target_name: &'static str,
    columns: Arc<[Column]>,
    prefix: Option<Arc<str>>,
}

impl Shape {
    pub fn new(target: TypeId, target_name: &'static str, columns: Vec<Column>) -> Self {
        Shape {
            target,
            target_name,
            columns: columns.into(),
            prefix: None,
        }
    }

    /// Shape of `columns` projected into `T`
    pub fn of<T: 'static>(columns: Vec<Column>) -> Self {
        Self::new(TypeId::of::<T>(), std::any::type_name::<T>(), columns)
    }

    /// Derive the shape from a row source's metadata
    pub fn from_schema<T: 'static>(schema: &dyn RowSchema) -> Self {
        Self::of::<T>(schema.columns())
    }

    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(Arc::from);
        self
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.prefix == other.prefix
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Shape {}

fn hash_name_ignore_case<H: Hasher>(name: &str, state: &mut H) {
    for b in name.bytes() {
        state.write_u8(b.to_ascii_lowercase());
    }
    state.write_u8(0xff);
}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.hash(state);
        state.write_usize(self.columns.len());
        if let Some(first) = self.columns.first() {
            hash_name_ignore_case(&first.name, state);
        }
        if let Some(last) = self.columns.last() {
            hash_name_ignore_case(&last.name, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::column::TypeTag;
    use ahash::AHasher;

    fn hash_of(shape: &Shape) -> u64 {
        let mut hasher = AHasher::default();
        shape.hash(&mut hasher);
        hasher.finish()
    }

    fn columns(names: &[(&str, TypeTag)]) -> Vec<Column> {
        names
            .iter()
            .enumerate()
            .map(|(i, (name, tag))| Column::new(i, *name, *tag))
            .collect()
    }

    #[test]
    fn test_shape_equality_is_case_insensitive() {
        let a = Shape::of::<i32>(columns(&[("ID", TypeTag::INT32), ("Name", TypeTag::STRING)]));
        let b = Shape::of::<i32>(columns(&[("id", TypeTag::INT32), ("NAME", TypeTag::STRING)]));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_shape_differs_by_target_and_type() {
        let cols = columns(&[("ID", TypeTag::INT32)]);
        let a = Shape::of::<i32>(cols.clone());
        let b = Shape::of::<i64>(cols);
        assert_ne!(a, b);

        let c = Shape::of::<i32>(columns(&[("ID", TypeTag::INT64)]));
        assert_ne!(a, c);
    }

    #[test]
    fn test_middle_columns_collide_in_hash_but_not_equality() {
        let a = Shape::of::<i32>(columns(&[
            ("A", TypeTag::INT32),
            ("B", TypeTag::INT32),
            ("C", TypeTag::INT32),
        ]));
        let b = Shape::of::<i32>(columns(&[
            ("A", TypeTag::INT32),
            ("X", TypeTag::INT32),
            ("C", TypeTag::INT32),
        ]));
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefix_is_part_of_identity() {
        let cols = columns(&[("cust_ID", TypeTag::INT32)]);
        let plain = Shape::of::<i32>(cols.clone());
        let prefixed = Shape::of::<i32>(cols).with_prefix(Some("cust_"));
        assert_ne!(plain, prefixed);
        assert_eq!(prefixed.prefix(), Some("cust_"));
    }
}
