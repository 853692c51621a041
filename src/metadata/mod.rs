/// Metadata module: column identity, target member description and shape keys
///
/// Columns come from row sources, members from `Projectable` target types;
/// a `Shape` pairs a target type with an ordered column list.

pub mod column;
pub mod member;
pub mod shape;

pub use column::{Column, IntKind, TypeTag, ValueKind};
pub use member::{Member, MemberDef, Projectable, TargetKind, TypeDescriptor};
pub use shape::Shape;
