/// Type compatibility resolution and value conversion
///
/// A column type is compatible with a member type when it is identical,
/// losslessly assignable (Rust `From` widening), an enum/integer pairing in
/// either direction, or compatible once nullable wrappers are removed from
/// either side. Fixed-length byte sequences always pair with each other.
///
/// Enum tags carry only the underlying integer width, not the enum's identity,
/// so an enum column pairs with any enum member, whatever its width. Row
/// sources expose enums as their integer discriminants, which makes the
/// distinction unobservable at match time; the member's `FromValue` rejects
/// unknown discriminants per row.
use crate::error::{ProjectionError, ProjectionResult};
use crate::metadata::column::{IntKind, TypeTag, ValueKind};
use crate::value::{mismatch, Value};

/// Can a value of type `from` be stored into a slot of type `to`?
pub fn is_compatible(from: TypeTag, to: TypeTag) -> bool {
    if from == to {
        return true;
    }
    // Nullability never blocks a pairing: a null simply becomes the zero value
    kinds_compatible(from.kind, to.kind)
}

/// Does storing `from` into `to` need a value conversion at row time?
pub fn needs_conversion(from: TypeTag, to: TypeTag) -> bool {
    from.kind != to.kind
}

fn kinds_compatible(from: ValueKind, to: ValueKind) -> bool {
    use ValueKind::*;
    if from == to {
        return true;
    }
    match (from, to) {
        (FixedBinary(_), FixedBinary(_)) => true,
        (Int(a), Int(b)) => a.widens_to(b),
        (Int(a), Float32) => a.bits() <= 16,
        (Int(a), Float64) => a.bits() <= 32,
        (Float32, Float64) => true,
        (Int(IntKind::U8), Char) => true,
        (Enum(_), Int(_)) | (Int(_), Enum(_)) | (Enum(_), Enum(_)) => true,
        _ => false,
    }
}

/// Convert `value` into the representation of `to`.
///
/// Only called for pairs accepted by `is_compatible`; enum/integer pairings
/// may still fail at row time when the value does not fit the target width.
pub fn convert(value: Value, to: TypeTag) -> ProjectionResult<Value> {
    if value.is_null() || value.kind() == Some(to.kind) {
        return Ok(value);
    }

    match to.kind {
        ValueKind::Int(kind) | ValueKind::Enum(kind) => match value.as_i128() {
            Some(n) => int_value(n, kind).ok_or_else(|| {
                ProjectionError::conversion_between(
                    format!("{} does not fit in {}", n, kind.name()),
                    value.type_name(),
                    to.to_string(),
                )
            }),
            None => Err(mismatch(&value, to)),
        },
        ValueKind::Float32 => match value {
            Value::I8(v) => Ok(Value::F32(v as f32)),
            Value::I16(v) => Ok(Value::F32(v as f32)),
            Value::U8(v) => Ok(Value::F32(v as f32)),
            Value::U16(v) => Ok(Value::F32(v as f32)),
            other => Err(mismatch(&other, to)),
        },
        ValueKind::Float64 => match value {
            Value::F32(v) => Ok(Value::F64(v as f64)),
            other => match other.as_i128() {
                Some(n) if other.kind().map_or(false, |k| kinds_compatible(k, ValueKind::Float64)) => {
                    Ok(Value::F64(n as f64))
                }
                _ => Err(mismatch(&other, to)),
            },
        },
        ValueKind::Char => match value {
            Value::U8(v) => Ok(Value::Char(char::from(v))),
            other => Err(mismatch(&other, to)),
        },
        ValueKind::FixedBinary(_) => match value {
            Value::Bytes(bytes) => Ok(Value::RowVersion(row_version_from_slice(&bytes))),
            // Tokens pair across widths; the row source sizes the outgoing bytes
            token @ Value::RowVersion(_) => Ok(token),
            other => Err(mismatch(&other, to)),
        },
        _ => Err(mismatch(&value, to)),
    }
}

/// First 8 bytes of `bytes`, zero-padded when shorter
pub fn row_version_from_slice(bytes: &[u8]) -> [u8; 8] {
    let mut token = [0u8; 8];
    let n = bytes.len().min(8);
    token[..n].copy_from_slice(&bytes[..n]);
    token
}

fn int_value(n: i128, kind: IntKind) -> Option<Value> {
    match kind {
        IntKind::I8 => i8::try_from(n).ok().map(Value::I8),
        IntKind::I16 => i16::try_from(n).ok().map(Value::I16),
        IntKind::I32 => i32::try_from(n).ok().map(Value::I32),
        IntKind::I64 => i64::try_from(n).ok().map(Value::I64),
        IntKind::U8 => u8::try_from(n).ok().map(Value::U8),
        IntKind::U16 => u16::try_from(n).ok().map(Value::U16),
        IntKind::U32 => u32::try_from(n).ok().map(Value::U32),
        IntKind::U64 => u64::try_from(n).ok().map(Value::U64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_widening() {
        assert!(is_compatible(TypeTag::INT32, TypeTag::INT32));
        assert!(is_compatible(TypeTag::INT32, TypeTag::INT64));
        assert!(is_compatible(TypeTag::FLOAT32, TypeTag::FLOAT64));
        assert!(is_compatible(TypeTag::INT32, TypeTag::FLOAT64));
        assert!(!is_compatible(TypeTag::INT64, TypeTag::INT32));
        assert!(!is_compatible(TypeTag::FLOAT64, TypeTag::FLOAT32));
        assert!(!is_compatible(TypeTag::INT64, TypeTag::FLOAT64));
        assert!(!is_compatible(TypeTag::STRING, TypeTag::INT32));
    }

    #[test]
    fn test_enum_integer_both_ways() {
        assert!(is_compatible(TypeTag::INT64, TypeTag::enumeration()));
        assert!(is_compatible(TypeTag::enumeration(), TypeTag::INT16));
        assert!(is_compatible(TypeTag::UINT8, TypeTag::enumeration().nullable()));
        assert!(is_compatible(
            TypeTag::new(ValueKind::Enum(IntKind::U8)),
            TypeTag::enumeration()
        ));
    }

    #[test]
    fn test_nullable_unwrap() {
        assert!(is_compatible(TypeTag::INT32, TypeTag::INT64.nullable()));
        assert!(is_compatible(TypeTag::INT32.nullable(), TypeTag::INT32));
        assert!(is_compatible(TypeTag::INT32.nullable(), TypeTag::INT64.nullable()));
        assert!(!is_compatible(TypeTag::STRING.nullable(), TypeTag::INT32));
    }

    #[test]
    fn test_fixed_binary_always_pairs() {
        assert!(is_compatible(TypeTag::fixed_binary(16), TypeTag::ROW_VERSION));
        assert!(!is_compatible(TypeTag::BINARY, TypeTag::ROW_VERSION));
    }

    #[test]
    fn test_convert_values() {
        assert_eq!(convert(Value::I32(7), TypeTag::INT64).unwrap(), Value::I64(7));
        assert_eq!(convert(Value::I64(3), TypeTag::enumeration()).unwrap(), Value::I32(3));
        assert_eq!(convert(Value::I32(2), TypeTag::FLOAT64).unwrap(), Value::F64(2.0));
        assert_eq!(convert(Value::F32(1.5), TypeTag::FLOAT64).unwrap(), Value::F64(1.5));
        assert_eq!(convert(Value::Null, TypeTag::INT64).unwrap(), Value::Null);
    }

    #[test]
    fn test_convert_enum_overflow_fails() {
        let err = convert(Value::I64(i64::MAX), TypeTag::enumeration()).unwrap_err();
        assert!(matches!(err, ProjectionError::Conversion { .. }));
    }

    #[test]
    fn test_row_version_from_slice() {
        assert_eq!(row_version_from_slice(&[1, 2, 3]), [1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(row_version_from_slice(&[9; 12]), [9; 8]);
    }

    #[test]
    fn test_row_version_token_into_wider_fixed_binary() {
        let to = TypeTag::fixed_binary(16);
        assert!(is_compatible(TypeTag::ROW_VERSION, to));
        assert!(needs_conversion(TypeTag::ROW_VERSION, to));
        assert_eq!(
            convert(Value::RowVersion([1; 8]), to).unwrap(),
            Value::RowVersion([1; 8])
        );
        assert_eq!(
            convert(Value::Bytes(vec![2; 16]), TypeTag::ROW_VERSION).unwrap(),
            Value::RowVersion([2; 8])
        );
    }
}
