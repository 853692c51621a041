/// Tagged value model shared by row accessors, projectors and parameter binding
///
/// Projectors never inspect Rust types at row time. Each column is read into a
/// `Value`, converted to the member's tag (if the tags differ), and handed to
/// the member's setter, which unpacks it through `FromValue`.
use crate::error::{ProjectionError, ProjectionResult};
use crate::metadata::column::{IntKind, TypeTag, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    RowVersion([u8; 8]),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Kind carried by this value (`None` for `Null`)
    pub fn kind(&self) -> Option<ValueKind> {
        let kind = match self {
            Value::Null => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::I8(_) => ValueKind::Int(IntKind::I8),
            Value::I16(_) => ValueKind::Int(IntKind::I16),
            Value::I32(_) => ValueKind::Int(IntKind::I32),
            Value::I64(_) => ValueKind::Int(IntKind::I64),
            Value::U8(_) => ValueKind::Int(IntKind::U8),
            Value::U16(_) => ValueKind::Int(IntKind::U16),
            Value::U32(_) => ValueKind::Int(IntKind::U32),
            Value::U64(_) => ValueKind::Int(IntKind::U64),
            Value::F32(_) => ValueKind::Float32,
            Value::F64(_) => ValueKind::Float64,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Binary,
            Value::RowVersion(_) => ValueKind::FixedBinary(8),
        };
        Some(kind)
    }

    /// Integer payload widened to i128, for integer variants only
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(v) => Some(v as i128),
            Value::I16(v) => Some(v as i128),
            Value::I32(v) => Some(v as i128),
            Value::I64(v) => Some(v as i128),
            Value::U8(v) => Some(v as i128),
            Value::U16(v) => Some(v as i128),
            Value::U32(v) => Some(v as i128),
            Value::U64(v) => Some(v as i128),
            _ => None,
        }
    }

    pub fn type_name(&self) -> String {
        match self.kind() {
            Some(kind) => kind.to_string(),
            None => "null".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::RowVersion(v) => write!(f, "0x{:016x}", u64::from_be_bytes(*v)),
        }
    }
}

/// Opaque 8-byte row-version token (e.g. a SQL Server `rowversion` column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowVersion(pub [u8; 8]);

impl RowVersion {
    /// Big-endian numeric view, which orders tokens the way the database does
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

/// Conversion from a row `Value` into a member's Rust type.
///
/// `Value::Null` always converts to the type's zero value.
pub trait FromValue: Sized {
    /// Declared type of a member of this Rust type
    fn type_tag() -> TypeTag;

    fn from_value(value: Value) -> ProjectionResult<Self>;
}

/// Conversion from a member's Rust type into a `Value` (outgoing parameters)
pub trait IntoValue {
    fn into_value(self) -> Value;
}

pub(crate) fn mismatch(value: &Value, expected: TypeTag) -> ProjectionError {
    ProjectionError::conversion_between(
        format!("expected a {} value, got {}", expected, value.type_name()),
        value.type_name(),
        expected.to_string(),
    )
}

macro_rules! primitive_value {
    ($ty:ty, $variant:ident, $tag:expr, $zero:expr) => {
        impl FromValue for $ty {
            fn type_tag() -> TypeTag {
                $tag
            }

            fn from_value(value: Value) -> ProjectionResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    Value::Null => Ok($zero),
                    other => Err(mismatch(&other, $tag)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

primitive_value!(bool, Bool, TypeTag::BOOL, false);
primitive_value!(char, Char, TypeTag::CHAR, '\0');
primitive_value!(i8, I8, TypeTag::INT8, 0);
primitive_value!(i16, I16, TypeTag::INT16, 0);
primitive_value!(i32, I32, TypeTag::INT32, 0);
primitive_value!(i64, I64, TypeTag::INT64, 0);
primitive_value!(u8, U8, TypeTag::UINT8, 0);
primitive_value!(u16, U16, TypeTag::UINT16, 0);
primitive_value!(u32, U32, TypeTag::UINT32, 0);
primitive_value!(u64, U64, TypeTag::UINT64, 0);
primitive_value!(f32, F32, TypeTag::FLOAT32, 0.0);
primitive_value!(f64, F64, TypeTag::FLOAT64, 0.0);
primitive_value!(String, String, TypeTag::STRING, String::new());
primitive_value!(Vec<u8>, Bytes, TypeTag::BINARY, Vec::new());

impl FromValue for RowVersion {
    fn type_tag() -> TypeTag {
        TypeTag::ROW_VERSION
    }

    fn from_value(value: Value) -> ProjectionResult<Self> {
        match value {
            Value::RowVersion(bytes) => Ok(RowVersion(bytes)),
            Value::Null => Ok(RowVersion::default()),
            other => Err(mismatch(&other, TypeTag::ROW_VERSION)),
        }
    }
}

impl IntoValue for RowVersion {
    fn into_value(self) -> Value {
        Value::RowVersion(self.0)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_tag() -> TypeTag {
        T::type_tag().nullable()
    }

    fn from_value(value: Value) -> ProjectionResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}
