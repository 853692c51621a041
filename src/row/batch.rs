/// Arrow RecordBatch row source
///
/// `BatchRows` validates a batch once (every column type must map onto a
/// `TypeTag`) and then hands out `BatchRow` cursors that read single cells
/// straight from the Arrow arrays.
use crate::error::{ProjectionError, ProjectionResult};
use crate::metadata::column::{Column, IntKind, TypeTag, ValueKind};
use crate::row::accessor::{RowAccessor, RowSchema};
use arrow::array::{
    Array, BinaryArray, BooleanArray, FixedSizeBinaryArray, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, LargeBinaryArray, LargeStringArray, StringArray, UInt16Array,
    UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

/// Map an Arrow type onto a column type tag; `None` for unsupported types
pub fn type_tag_of(data_type: &DataType, nullable: bool) -> Option<TypeTag> {
    let kind = match data_type {
        DataType::Boolean => ValueKind::Bool,
        DataType::Int8 => ValueKind::Int(IntKind::I8),
        DataType::Int16 => ValueKind::Int(IntKind::I16),
        DataType::Int32 => ValueKind::Int(IntKind::I32),
        DataType::Int64 => ValueKind::Int(IntKind::I64),
        DataType::UInt8 => ValueKind::Int(IntKind::U8),
        DataType::UInt16 => ValueKind::Int(IntKind::U16),
        DataType::UInt32 => ValueKind::Int(IntKind::U32),
        DataType::UInt64 => ValueKind::Int(IntKind::U64),
        DataType::Float32 => ValueKind::Float32,
        DataType::Float64 => ValueKind::Float64,
        DataType::Utf8 | DataType::LargeUtf8 => ValueKind::String,
        DataType::Binary | DataType::LargeBinary => ValueKind::Binary,
        DataType::FixedSizeBinary(len) => ValueKind::FixedBinary((*len).max(0) as u32),
        _ => return None,
    };
    let tag = TypeTag::new(kind);
    Some(if nullable { tag.nullable() } else { tag })
}

/// A validated batch plus its column tags
#[derive(Debug)]
pub struct BatchRows<'a> {
    batch: &'a RecordBatch,
    columns: Vec<Column>,
}

impl<'a> BatchRows<'a> {
    pub fn try_new(batch: &'a RecordBatch) -> ProjectionResult<Self> {
        let schema = batch.schema();
        let mut columns = Vec::with_capacity(schema.fields().len());
        for (ordinal, field) in schema.fields().iter().enumerate() {
            let tag = type_tag_of(field.data_type(), field.is_nullable()).ok_or_else(|| {
                ProjectionError::row_access_at(
                    format!(
                        "column '{}' has unsupported Arrow type {:?}",
                        field.name(),
                        field.data_type()
                    ),
                    ordinal,
                )
            })?;
            columns.push(Column::new(ordinal, field.name().as_str(), tag));
        }
        Ok(Self { batch, columns })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn row(&self, row: usize) -> BatchRow<'_> {
        BatchRow { rows: self, row }
    }

    pub fn iter(&self) -> impl Iterator<Item = BatchRow<'_>> + '_ {
        (0..self.num_rows()).map(move |row| self.row(row))
    }
}

impl RowSchema for BatchRows<'_> {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        &self.columns[ordinal].name
    }

    fn field_type(&self, ordinal: usize) -> TypeTag {
        self.columns[ordinal].type_tag
    }

    fn columns(&self) -> Vec<Column> {
        self.columns.clone()
    }
}

/// One row of a `BatchRows`
#[derive(Debug, Clone, Copy)]
pub struct BatchRow<'a> {
    rows: &'a BatchRows<'a>,
    row: usize,
}

impl<'a> BatchRow<'a> {
    fn array<A: Array + 'static>(&self, ordinal: usize, requested: &str) -> ProjectionResult<&'a A> {
        let batch: &'a RecordBatch = self.rows.batch;
        if ordinal >= batch.num_columns() {
            return Err(ProjectionError::row_access_at("column ordinal out of range", ordinal));
        }
        batch
            .column(ordinal)
            .as_any()
            .downcast_ref::<A>()
            .ok_or_else(|| {
                ProjectionError::unsupported(
                    ordinal,
                    requested,
                    self.rows.columns[ordinal].type_tag.to_string(),
                )
            })
    }
}

impl RowSchema for BatchRow<'_> {
    fn field_count(&self) -> usize {
        self.rows.field_count()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        self.rows.field_name(ordinal)
    }

    fn field_type(&self, ordinal: usize) -> TypeTag {
        self.rows.field_type(ordinal)
    }

    fn columns(&self) -> Vec<Column> {
        self.rows.columns.clone()
    }
}

macro_rules! arrow_getter {
    ($method:ident, $ty:ty, $array:ty, $label:expr) => {
        fn $method(&self, ordinal: usize) -> ProjectionResult<$ty> {
            Ok(self.array::<$array>(ordinal, $label)?.value(self.row))
        }
    };
}

impl RowAccessor for BatchRow<'_> {
    fn is_null(&self, ordinal: usize) -> bool {
        self.rows.batch.column(ordinal).is_null(self.row)
    }

    arrow_getter!(get_bool, bool, BooleanArray, "bool");
    arrow_getter!(get_i8, i8, Int8Array, "int8");
    arrow_getter!(get_i16, i16, Int16Array, "int16");
    arrow_getter!(get_i32, i32, Int32Array, "int32");
    arrow_getter!(get_i64, i64, Int64Array, "int64");
    arrow_getter!(get_u8, u8, UInt8Array, "uint8");
    arrow_getter!(get_u16, u16, UInt16Array, "uint16");
    arrow_getter!(get_u32, u32, UInt32Array, "uint32");
    arrow_getter!(get_u64, u64, UInt64Array, "uint64");
    arrow_getter!(get_f32, f32, Float32Array, "float32");
    arrow_getter!(get_f64, f64, Float64Array, "float64");

    fn get_string(&self, ordinal: usize) -> ProjectionResult<String> {
        if let Ok(array) = self.array::<StringArray>(ordinal, "string") {
            return Ok(array.value(self.row).to_string());
        }
        Ok(self
            .array::<LargeStringArray>(ordinal, "string")?
            .value(self.row)
            .to_string())
    }

    fn get_bytes(&self, ordinal: usize, length: usize) -> ProjectionResult<Vec<u8>> {
        let bytes: &[u8] = if let Ok(array) = self.array::<FixedSizeBinaryArray>(ordinal, "binary") {
            array.value(self.row)
        } else if let Ok(array) = self.array::<BinaryArray>(ordinal, "binary") {
            array.value(self.row)
        } else {
            self.array::<LargeBinaryArray>(ordinal, "binary")?.value(self.row)
        };
        Ok(bytes[..bytes.len().min(length)].to_vec())
    }
}
