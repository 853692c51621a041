/// Row accessor contract consumed by the projection core
///
/// Row sources implement `RowSchema` for their metadata and `RowAccessor` for
/// per-row reads. Typed getters default to an `UnsupportedType` error, so a
/// source only implements the getters for the kinds it actually produces.
use crate::error::{ProjectionError, ProjectionResult};
use crate::mapping::compat::row_version_from_slice;
use crate::metadata::column::{Column, IntKind, TypeTag, ValueKind};
use crate::value::Value;

/// Column metadata of a row source
pub trait RowSchema {
    fn field_count(&self) -> usize;
    fn field_name(&self, ordinal: usize) -> &str;
    fn field_type(&self, ordinal: usize) -> TypeTag;

    /// All columns in ordinal order
    fn columns(&self) -> Vec<Column> {
        (0..self.field_count())
            .map(|i| Column::new(i, self.field_name(i), self.field_type(i)))
            .collect()
    }
}

fn unsupported(schema: &(impl RowSchema + ?Sized), ordinal: usize, requested: &str) -> ProjectionError {
    let declared = if ordinal < schema.field_count() {
        schema.field_type(ordinal).to_string()
    } else {
        "<out of range>".to_string()
    };
    ProjectionError::unsupported(ordinal, requested, declared)
}

/// Read access to one row
pub trait RowAccessor: RowSchema {
    fn is_null(&self, ordinal: usize) -> bool;

    fn get_bool(&self, ordinal: usize) -> ProjectionResult<bool> {
        Err(unsupported(self, ordinal, "bool"))
    }
    fn get_char(&self, ordinal: usize) -> ProjectionResult<char> {
        Err(unsupported(self, ordinal, "char"))
    }
    fn get_i8(&self, ordinal: usize) -> ProjectionResult<i8> {
        Err(unsupported(self, ordinal, "int8"))
    }
    fn get_i16(&self, ordinal: usize) -> ProjectionResult<i16> {
        Err(unsupported(self, ordinal, "int16"))
    }
    fn get_i32(&self, ordinal: usize) -> ProjectionResult<i32> {
        Err(unsupported(self, ordinal, "int32"))
    }
    fn get_i64(&self, ordinal: usize) -> ProjectionResult<i64> {
        Err(unsupported(self, ordinal, "int64"))
    }
    fn get_u8(&self, ordinal: usize) -> ProjectionResult<u8> {
        Err(unsupported(self, ordinal, "uint8"))
    }
    fn get_u16(&self, ordinal: usize) -> ProjectionResult<u16> {
        Err(unsupported(self, ordinal, "uint16"))
    }
    fn get_u32(&self, ordinal: usize) -> ProjectionResult<u32> {
        Err(unsupported(self, ordinal, "uint32"))
    }
    fn get_u64(&self, ordinal: usize) -> ProjectionResult<u64> {
        Err(unsupported(self, ordinal, "uint64"))
    }
    fn get_f32(&self, ordinal: usize) -> ProjectionResult<f32> {
        Err(unsupported(self, ordinal, "float32"))
    }
    fn get_f64(&self, ordinal: usize) -> ProjectionResult<f64> {
        Err(unsupported(self, ordinal, "float64"))
    }
    fn get_string(&self, ordinal: usize) -> ProjectionResult<String> {
        Err(unsupported(self, ordinal, "string"))
    }
    /// Up to `length` bytes from the start of a binary column
    fn get_bytes(&self, ordinal: usize, length: usize) -> ProjectionResult<Vec<u8>> {
        let _ = length;
        Err(unsupported(self, ordinal, "binary"))
    }

    /// Read any column as a `Value` according to its declared type
    fn get_value(&self, ordinal: usize) -> ProjectionResult<Value> {
        if self.is_null(ordinal) {
            return Ok(Value::Null);
        }
        read_native(self, ordinal, self.field_type(ordinal).kind)
    }
}

/// Read a non-null column of a known kind through the typed getters
pub fn read_native<R: RowAccessor + ?Sized>(
    row: &R,
    ordinal: usize,
    kind: ValueKind,
) -> ProjectionResult<Value> {
    let value = match kind {
        ValueKind::Bool => Value::Bool(row.get_bool(ordinal)?),
        ValueKind::Char => Value::Char(row.get_char(ordinal)?),
        ValueKind::Int(int) | ValueKind::Enum(int) => match int {
            IntKind::I8 => Value::I8(row.get_i8(ordinal)?),
            IntKind::I16 => Value::I16(row.get_i16(ordinal)?),
            IntKind::I32 => Value::I32(row.get_i32(ordinal)?),
            IntKind::I64 => Value::I64(row.get_i64(ordinal)?),
            IntKind::U8 => Value::U8(row.get_u8(ordinal)?),
            IntKind::U16 => Value::U16(row.get_u16(ordinal)?),
            IntKind::U32 => Value::U32(row.get_u32(ordinal)?),
            IntKind::U64 => Value::U64(row.get_u64(ordinal)?),
        },
        ValueKind::Float32 => Value::F32(row.get_f32(ordinal)?),
        ValueKind::Float64 => Value::F64(row.get_f64(ordinal)?),
        ValueKind::String => Value::String(row.get_string(ordinal)?),
        ValueKind::Binary => Value::Bytes(row.get_bytes(ordinal, usize::MAX)?),
        ValueKind::FixedBinary(_) => Value::RowVersion(row_version_from_slice(&row.get_bytes(ordinal, 8)?)),
    };
    Ok(value)
}

/// Reads one non-null column of a known kind
pub type Reader = fn(&dyn RowAccessor, usize) -> ProjectionResult<Value>;

/// Pick the native reader for a declared column kind, once per shape
pub fn reader_for(kind: ValueKind) -> Reader {
    match kind {
        ValueKind::Bool => |row: &dyn RowAccessor, i: usize| row.get_bool(i).map(Value::Bool),
        ValueKind::Char => |row: &dyn RowAccessor, i: usize| row.get_char(i).map(Value::Char),
        ValueKind::Int(IntKind::I8) | ValueKind::Enum(IntKind::I8) => {
            |row: &dyn RowAccessor, i: usize| row.get_i8(i).map(Value::I8)
        }
        ValueKind::Int(IntKind::I16) | ValueKind::Enum(IntKind::I16) => {
            |row: &dyn RowAccessor, i: usize| row.get_i16(i).map(Value::I16)
        }
        ValueKind::Int(IntKind::I32) | ValueKind::Enum(IntKind::I32) => {
            |row: &dyn RowAccessor, i: usize| row.get_i32(i).map(Value::I32)
        }
        ValueKind::Int(IntKind::I64) | ValueKind::Enum(IntKind::I64) => {
            |row: &dyn RowAccessor, i: usize| row.get_i64(i).map(Value::I64)
        }
        ValueKind::Int(IntKind::U8) | ValueKind::Enum(IntKind::U8) => {
            |row: &dyn RowAccessor, i: usize| row.get_u8(i).map(Value::U8)
        }
        ValueKind::Int(IntKind::U16) | ValueKind::Enum(IntKind::U16) => {
            |row: &dyn RowAccessor, i: usize| row.get_u16(i).map(Value::U16)
        }
        ValueKind::Int(IntKind::U32) | ValueKind::Enum(IntKind::U32) => {
            |row: &dyn RowAccessor, i: usize| row.get_u32(i).map(Value::U32)
        }
        ValueKind::Int(IntKind::U64) | ValueKind::Enum(IntKind::U64) => {
            |row: &dyn RowAccessor, i: usize| row.get_u64(i).map(Value::U64)
        }
        ValueKind::Float32 => |row: &dyn RowAccessor, i: usize| row.get_f32(i).map(Value::F32),
        ValueKind::Float64 => |row: &dyn RowAccessor, i: usize| row.get_f64(i).map(Value::F64),
        ValueKind::String => |row: &dyn RowAccessor, i: usize| row.get_string(i).map(Value::String),
        ValueKind::Binary => |row: &dyn RowAccessor, i: usize| row.get_bytes(i, usize::MAX).map(Value::Bytes),
        // Row-version token: always exactly 8 bytes, whatever the declared length
        ValueKind::FixedBinary(_) => |row: &dyn RowAccessor, i: usize| {
            row.get_bytes(i, 8)
                .map(|bytes| Value::RowVersion(row_version_from_slice(&bytes)))
        },
    }
}
