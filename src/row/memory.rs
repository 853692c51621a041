/// In-memory row set: columns plus rows of `Value`s
///
/// Used for tests and benches, and by callers that already hold materialized
/// rows. Rows are validated against the declared column kinds on insert.
use crate::error::{ProjectionError, ProjectionResult};
use crate::metadata::column::{Column, TypeTag, ValueKind};
use crate::row::accessor::{RowAccessor, RowSchema};
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct MemoryRowSet {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl MemoryRowSet {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build from (name, type) pairs in ordinal order
    pub fn with_columns(spec: &[(&str, TypeTag)]) -> Self {
        let columns = spec
            .iter()
            .enumerate()
            .map(|(i, (name, tag))| Column::new(i, *name, *tag))
            .collect();
        Self::new(columns)
    }

    /// Append a row; every value must be null or of its column's kind
    pub fn push_row(&mut self, row: Vec<Value>) -> ProjectionResult<()> {
        if row.len() != self.columns.len() {
            return Err(ProjectionError::row_access(format!(
                "row has {} values, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(row.iter()) {
            if !accepts(column.type_tag.kind, value) {
                return Err(ProjectionError::row_access_at(
                    format!(
                        "column '{}' is {}, got a {} value",
                        column.name,
                        column.type_tag,
                        value.type_name()
                    ),
                    column.ordinal,
                ));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder form of `push_row`
    pub fn with_row(mut self, row: Vec<Value>) -> ProjectionResult<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn row(&self, index: usize) -> Option<MemoryRow<'_>> {
        self.rows.get(index).map(|values| MemoryRow {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = MemoryRow<'_>> + '_ {
        self.rows.iter().map(move |values| MemoryRow {
            columns: &self.columns,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn accepts(kind: ValueKind, value: &Value) -> bool {
    match (kind, value) {
        (_, Value::Null) => true,
        // fixed-length binary is stored at its declared length
        (ValueKind::FixedBinary(_), Value::Bytes(_)) => true,
        (ValueKind::Enum(int), v) => v.kind() == Some(ValueKind::Int(int)),
        (kind, v) => v.kind() == Some(kind),
    }
}

impl RowSchema for MemoryRowSet {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        &self.columns[ordinal].name
    }

    fn field_type(&self, ordinal: usize) -> TypeTag {
        self.columns[ordinal].type_tag
    }
}

/// Cursor over one row of a `MemoryRowSet`
#[derive(Debug, Clone, Copy)]
pub struct MemoryRow<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl<'a> MemoryRow<'a> {
    fn value(&self, ordinal: usize) -> ProjectionResult<&'a Value> {
        self.values
            .get(ordinal)
            .ok_or_else(|| ProjectionError::row_access_at("column ordinal out of range", ordinal))
    }

    fn mismatch(&self, ordinal: usize, requested: &str) -> ProjectionError {
        let declared = self
            .columns
            .get(ordinal)
            .map(|c| c.type_tag.to_string())
            .unwrap_or_else(|| "<out of range>".to_string());
        ProjectionError::unsupported(ordinal, requested, declared)
    }
}

impl RowSchema for MemoryRow<'_> {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        &self.columns[ordinal].name
    }

    fn field_type(&self, ordinal: usize) -> TypeTag {
        self.columns[ordinal].type_tag
    }
}

macro_rules! memory_getter {
    ($method:ident, $ty:ty, $variant:ident, $label:expr) => {
        fn $method(&self, ordinal: usize) -> ProjectionResult<$ty> {
            match self.value(ordinal)? {
                Value::$variant(v) => Ok(v.clone()),
                _ => Err(self.mismatch(ordinal, $label)),
            }
        }
    };
}

impl RowAccessor for MemoryRow<'_> {
    fn is_null(&self, ordinal: usize) -> bool {
        matches!(self.values.get(ordinal), Some(Value::Null) | None)
    }

    memory_getter!(get_bool, bool, Bool, "bool");
    memory_getter!(get_char, char, Char, "char");
    memory_getter!(get_i8, i8, I8, "int8");
    memory_getter!(get_i16, i16, I16, "int16");
    memory_getter!(get_i32, i32, I32, "int32");
    memory_getter!(get_i64, i64, I64, "int64");
    memory_getter!(get_u8, u8, U8, "uint8");
    memory_getter!(get_u16, u16, U16, "uint16");
    memory_getter!(get_u32, u32, U32, "uint32");
    memory_getter!(get_u64, u64, U64, "uint64");
    memory_getter!(get_f32, f32, F32, "float32");
    memory_getter!(get_f64, f64, F64, "float64");
    memory_getter!(get_string, String, String, "string");

    fn get_bytes(&self, ordinal: usize, length: usize) -> ProjectionResult<Vec<u8>> {
        match self.value(ordinal)? {
            Value::Bytes(bytes) => Ok(bytes[..bytes.len().min(length)].to_vec()),
            Value::RowVersion(token) => Ok(token[..token.len().min(length)].to_vec()),
            _ => Err(self.mismatch(ordinal, "binary")),
        }
    }
}
