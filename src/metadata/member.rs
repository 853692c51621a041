/// Target-type description: members ("things") and how to construct/populate them
///
/// Rust has no runtime reflection, so every target type publishes a static
/// `TypeDescriptor` through the `Projectable` trait. The `projectable!` macro
/// writes that descriptor for plain structs; hand-written impls use the
/// builder methods directly.
use crate::error::ProjectionResult;
use crate::metadata::column::TypeTag;
use crate::value::{FromValue, IntoValue, Value};
use std::fmt;
use std::sync::Arc;

/// One assignable slot on a target type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    /// Name with underscores removed
    pub comparison_name: String,
    pub type_tag: TypeTag,
}

impl Member {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        let name = name.into();
        let comparison_name = name.replace('_', "");
        Member {
            name,
            comparison_name,
            type_tag,
        }
    }
}

type Setter<T> = Arc<dyn Fn(&mut T, Value) -> ProjectionResult<()> + Send + Sync>;
type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// A member plus the type-erased accessors the projector calls
pub struct MemberDef<T> {
    member: Member,
    setter: Setter<T>,
    getter: Option<Getter<T>>,
}

impl<T> MemberDef<T> {
    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn type_tag(&self) -> TypeTag {
        self.member.type_tag
    }

    /// Assign a value already converted to this member's type tag
    pub fn assign(&self, target: &mut T, value: Value) -> ProjectionResult<()> {
        (self.setter)(target, value)
    }

    /// Read the member as a `Value`; `None` for set-only members
    pub fn read(&self, target: &T) -> Option<Value> {
        self.getter.as_ref().map(|get| get(target))
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }
}

impl<T> Clone for MemberDef<T> {
    fn clone(&self) -> Self {
        MemberDef {
            member: self.member.clone(),
            setter: Arc::clone(&self.setter),
            getter: self.getter.clone(),
        }
    }
}

impl<T> fmt::Debug for MemberDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDef")
            .field("member", &self.member)
            .field("readable", &self.getter.is_some())
            .finish()
    }
}

/// Whether the whole row maps to one value or to a populated object
pub enum TargetKind<T> {
    /// Row column 0 converts straight into the target
    Scalar {
        type_tag: TypeTag,
        convert: fn(Value) -> ProjectionResult<T>,
    },
    /// Object built by a parameterless constructor, then populated member by member
    Composite {
        constructor: Option<fn() -> T>,
        members: Vec<MemberDef<T>>,
    },
}

/// Static description of a projection target
pub struct TypeDescriptor<T> {
    name: &'static str,
    kind: TargetKind<T>,
}

impl<T: 'static> TypeDescriptor<T> {
    /// Single-value target (primitive, enum, nullable primitive, string, bytes)
    pub fn scalar() -> Self
    where
        T: FromValue,
    {
        TypeDescriptor {
            name: std::any::type_name::<T>(),
            kind: TargetKind::Scalar {
                type_tag: T::type_tag(),
                convert: T::from_value,
            },
        }
    }

    /// Object target with no constructor and no members yet
    pub fn composite(name: &'static str) -> Self {
        TypeDescriptor {
            name,
            kind: TargetKind::Composite {
                constructor: None,
                members: Vec::new(),
            },
        }
    }

    pub fn with_constructor(mut self, ctor: fn() -> T) -> Self {
        if let TargetKind::Composite { constructor, .. } = &mut self.kind {
            *constructor = Some(ctor);
        }
        self
    }

    /// Add a set-only member. Ignored on scalar descriptors.
    pub fn setter<F, W>(self, name: &str, assign: W) -> Self
    where
        F: FromValue + 'static,
        W: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target: &mut T, value: Value| {
            assign(target, F::from_value(value)?);
            Ok(())
        });
        self.push(MemberDef {
            member: Member::new(name, F::type_tag()),
            setter,
            getter: None,
        })
    }

    /// Add a readable and assignable member. Ignored on scalar descriptors.
    pub fn field<F, R, W>(self, name: &str, read: R, assign: W) -> Self
    where
        F: FromValue + IntoValue + 'static,
        R: Fn(&T) -> F + Send + Sync + 'static,
        W: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target: &mut T, value: Value| {
            assign(target, F::from_value(value)?);
            Ok(())
        });
        let getter: Getter<T> = Arc::new(move |target: &T| read(target).into_value());
        self.push(MemberDef {
            member: Member::new(name, F::type_tag()),
            setter,
            getter: Some(getter),
        })
    }

    fn push(mut self, def: MemberDef<T>) -> Self {
        if let TargetKind::Composite { members, .. } = &mut self.kind {
            members.push(def);
        }
        self
    }
}

impl<T> TypeDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &TargetKind<T> {
        &self.kind
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, TargetKind::Scalar { .. })
    }

    /// Members in declaration order (empty for scalar targets)
    pub fn members(&self) -> &[MemberDef<T>] {
        match &self.kind {
            TargetKind::Composite { members, .. } => members,
            TargetKind::Scalar { .. } => &[],
        }
    }
}

/// A type rows can be projected into
pub trait Projectable: Sized + Send + 'static {
    fn descriptor() -> TypeDescriptor<Self>;
}

macro_rules! scalar_projectable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Projectable for $ty {
                fn descriptor() -> TypeDescriptor<Self> {
                    TypeDescriptor::scalar()
                }
            }
        )*
    };
}

scalar_projectable!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    Vec<u8>,
    crate::value::RowVersion,
);

impl<T: FromValue + Send + 'static> Projectable for Option<T> {
    fn descriptor() -> TypeDescriptor<Self> {
        TypeDescriptor::scalar()
    }
}

/// Declare a struct and implement `Projectable` for it.
///
/// Every field becomes a readable, assignable member named after the field.
/// The struct must implement `Default`, which serves as its parameterless
/// constructor.
///
/// ```
/// rowshape::projectable! {
///     #[derive(Debug, Default)]
///     pub struct Order {
///         pub order_id: i64,
///         pub name: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! projectable {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $fty, )*
        }

        impl $crate::Projectable for $name {
            fn descriptor() -> $crate::TypeDescriptor<Self> {
                $crate::TypeDescriptor::composite(stringify!($name))
                    .with_constructor(<$name as ::std::default::Default>::default)
                    $(
                        .field(
                            stringify!($field),
                            |target: &$name| ::std::clone::Clone::clone(&target.$field),
                            |target: &mut $name, value: $fty| target.$field = value,
                        )
                    )*
            }
        }
    };
}

/// Declare an `i32`-backed enum usable as a member or scalar target.
///
/// The enum must derive `Default` (a null column yields the default variant).
/// Do not add a `#[repr]` attribute; `#[repr(i32)]` is emitted here.
#[macro_export]
macro_rules! projectable_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $disc:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i32)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $disc, )*
        }

        impl $name {
            pub fn from_repr(repr: i32) -> ::std::option::Option<Self> {
                $(
                    if repr == ($disc) {
                        return ::std::option::Option::Some($name::$variant);
                    }
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::FromValue for $name {
            fn type_tag() -> $crate::TypeTag {
                $crate::TypeTag::enumeration()
            }

            fn from_value(value: $crate::Value) -> $crate::ProjectionResult<Self> {
                match value {
                    $crate::Value::Null => {
                        ::std::result::Result::Ok(<$name as ::std::default::Default>::default())
                    }
                    $crate::Value::I32(repr) => $name::from_repr(repr).ok_or_else(|| {
                        $crate::ProjectionError::conversion(format!(
                            "{} is not a valid {} discriminant",
                            repr,
                            stringify!($name)
                        ))
                    }),
                    other => ::std::result::Result::Err($crate::ProjectionError::conversion(format!(
                        "expected a {} discriminant, got {}",
                        stringify!($name),
                        other.type_name()
                    ))),
                }
            }
        }

        impl $crate::IntoValue for $name {
            fn into_value(self) -> $crate::Value {
                $crate::Value::I32(self as i32)
            }
        }

        impl $crate::Projectable for $name {
            fn descriptor() -> $crate::TypeDescriptor<Self> {
                $crate::TypeDescriptor::scalar()
            }
        }
    };
}
