/// Column identity and value type tags
///
/// A Column is the identity of one tabular field as reported by a row source:
/// ordinal position, name and declared value type. It is immutable once read.
///
/// Equality is case-insensitive on the name plus equal declared type; the
/// ordinal is implied by the column's position inside a shape.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer width/signedness, shared by integer columns and enum representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub fn is_signed(&self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    /// Width in bits
    pub fn bits(&self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }

    /// Lossless implicit widening, following Rust's `From` impls between integers
    pub fn widens_to(&self, to: IntKind) -> bool {
        match (self.is_signed(), to.is_signed()) {
            (true, true) | (false, false) => self.bits() <= to.bits(),
            // u8 -> i16, u32 -> i64, ...
            (false, true) => self.bits() < to.bits(),
            (true, false) => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntKind::I8 => "int8",
            IntKind::I16 => "int16",
            IntKind::I32 => "int32",
            IntKind::I64 => "int64",
            IntKind::U8 => "uint8",
            IntKind::U16 => "uint16",
            IntKind::U32 => "uint32",
            IntKind::U64 => "uint64",
        }
    }
}

/// Declared value kind of a column or member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Char,
    Int(IntKind),
    Float32,
    Float64,
    String,
    /// Variable-length binary data
    Binary,
    /// Fixed-length byte sequence (row-version token); the length is informational
    FixedBinary(u32),
    /// Enumeration backed by an integer representation
    Enum(IntKind),
}

impl ValueKind {
    /// Numeric, boolean, char and enum kinds
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueKind::Bool
                | ValueKind::Char
                | ValueKind::Int(_)
                | ValueKind::Float32
                | ValueKind::Float64
                | ValueKind::Enum(_)
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, ValueKind::Int(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, ValueKind::Enum(_))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Char => write!(f, "char"),
            ValueKind::Int(kind) => write!(f, "{}", kind.name()),
            ValueKind::Float32 => write!(f, "float32"),
            ValueKind::Float64 => write!(f, "float64"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Binary => write!(f, "binary"),
            ValueKind::FixedBinary(len) => write!(f, "fixed_binary({})", len),
            ValueKind::Enum(kind) => write!(f, "enum({})", kind.name()),
        }
    }
}

/// Value type of a column or member: a kind plus an optional nullable wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl TypeTag {
    pub const BOOL: TypeTag = TypeTag::new(ValueKind::Bool);
    pub const CHAR: TypeTag = TypeTag::new(ValueKind::Char);
    pub const INT8: TypeTag = TypeTag::new(ValueKind::Int(IntKind::I8));
    pub const INT16: TypeTag = TypeTag::new(ValueKind::Int(IntKind::I16));
    pub const INT32: TypeTag = TypeTag::new(ValueKind::Int(IntKind::I32));
    pub const INT64: TypeTag = TypeTag::new(ValueKind::Int(IntKind::I64));
    pub const UINT8: TypeTag = TypeTag::new(ValueKind::Int(IntKind::U8));
    pub const UINT16: TypeTag = TypeTag::new(ValueKind::Int(IntKind::U16));
    pub const UINT32: TypeTag = TypeTag::new(ValueKind::Int(IntKind::U32));
    pub const UINT64: TypeTag = TypeTag::new(ValueKind::Int(IntKind::U64));
    pub const FLOAT32: TypeTag = TypeTag::new(ValueKind::Float32);
    pub const FLOAT64: TypeTag = TypeTag::new(ValueKind::Float64);
    pub const STRING: TypeTag = TypeTag::new(ValueKind::String);
    pub const BINARY: TypeTag = TypeTag::new(ValueKind::Binary);
    pub const ROW_VERSION: TypeTag = TypeTag::new(ValueKind::FixedBinary(8));

    pub const fn new(kind: ValueKind) -> Self {
        TypeTag { kind, nullable: false }
    }

    /// Enum backed by a 32-bit signed integer (the default representation)
    pub const fn enumeration() -> Self {
        TypeTag::new(ValueKind::Enum(IntKind::I32))
    }

    pub const fn fixed_binary(len: u32) -> Self {
        TypeTag::new(ValueKind::FixedBinary(len))
    }

    /// Nullable wrapper of this type
    pub const fn nullable(self) -> Self {
        TypeTag {
            kind: self.kind,
            nullable: true,
        }
    }

    /// The wrapped type with the nullable flag removed
    pub const fn unwrapped(self) -> Self {
        TypeTag {
            kind: self.kind,
            nullable: false,
        }
    }

    /// Scalar or nullable scalar (drives the "Id" suffix rule and scalar targets)
    pub fn is_scalar(&self) -> bool {
        self.kind.is_scalar()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// One tabular field of a row source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub ordinal: usize,
    pub name: String,
    pub type_tag: TypeTag,
}

impl Column {
    pub fn new(ordinal: usize, name: impl Into<String>, type_tag: TypeTag) -> Self {
        Column {
            ordinal,
            name: name.into(),
            type_tag,
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.type_tag == other.type_tag && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for Column {}
