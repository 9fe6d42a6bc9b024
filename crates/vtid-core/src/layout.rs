//! Type descriptors published by a host runtime
//!
//! A host runtime describes the private structures it is willing to have
//! read from the outside: the structure's fully-qualified name, its size, and
//! the name, offset and kind of each field. The readers never hard-code an
//! offset; they look the field up by name once and cache the result.
//!
//! Descriptors are normally built at compile time with [`describe_type!`],
//! which takes the offsets from `core::mem::offset_of!`:
//!
//! ```ignore
//! #[repr(C)]
//! pub struct Slot {
//!     pub id: i32,
//!     pub owner: AtomicU32,
//! }
//!
//! pub static SLOT_TYPE: TypeDescriptor = describe_type!(Slot {
//!     id: FieldKind::I32,
//!     owner: FieldKind::U32,
//! });
//! ```

use core::fmt;

/// Primitive shape of a described field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Thin raw pointer (or a `Cell`/`AtomicPtr` around one)
    Ptr,
    I32,
    I64,
    U8,
    U32,
    U64,
    /// Anything else; only the size is known
    Opaque(usize),
}

impl FieldKind {
    /// Size of the field in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            FieldKind::Ptr => core::mem::size_of::<*const u8>(),
            FieldKind::I32 | FieldKind::U32 => 4,
            FieldKind::I64 | FieldKind::U64 => 8,
            FieldKind::U8 => 1,
            FieldKind::Opaque(n) => n,
        }
    }

    /// Required alignment of the field in bytes
    #[inline]
    pub const fn align(self) -> usize {
        match self {
            FieldKind::Ptr => core::mem::align_of::<*const u8>(),
            FieldKind::I32 | FieldKind::U32 => core::mem::align_of::<u32>(),
            FieldKind::I64 | FieldKind::U64 => core::mem::align_of::<u64>(),
            FieldKind::U8 | FieldKind::Opaque(_) => 1,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Ptr => write!(f, "ptr"),
            FieldKind::I32 => write!(f, "i32"),
            FieldKind::I64 => write!(f, "i64"),
            FieldKind::U8 => write!(f, "u8"),
            FieldKind::U32 => write!(f, "u32"),
            FieldKind::U64 => write!(f, "u64"),
            FieldKind::Opaque(n) => write!(f, "opaque[{}]", n),
        }
    }
}

/// One field of a described structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Byte offset from the start of the structure
    pub offset: usize,
    pub kind: FieldKind,
}

/// Layout of a private runtime structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Fully-qualified name, e.g. `vtid_runtime::machine::Machine`
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub fields: &'static [FieldDescriptor],
}

impl TypeDescriptor {
    /// Find a field by name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Build a [`TypeDescriptor`] for a `#[repr(C)]` struct
///
/// Without an explicit name the descriptor is named after the module the
/// macro is invoked in, so `describe_type!(Machine { .. })` inside
/// `vtid_runtime::machine` is published as `vtid_runtime::machine::Machine`.
/// `describe_type!("some::Name" => Ty { .. })` publishes under a given name.
#[macro_export]
macro_rules! describe_type {
    ($ty:ident { $($field:ident : $kind:expr),* $(,)? }) => {
        $crate::describe_type!(
            concat!(module_path!(), "::", stringify!($ty)) => $ty { $($field : $kind),* }
        )
    };
    ($name:expr => $ty:ty { $($field:ident : $kind:expr),* $(,)? }) => {
        $crate::layout::TypeDescriptor {
            name: $name,
            size: ::core::mem::size_of::<$ty>(),
            align: ::core::mem::align_of::<$ty>(),
            fields: &[$(
                $crate::layout::FieldDescriptor {
                    name: stringify!($field),
                    offset: ::core::mem::offset_of!($ty, $field),
                    kind: $kind,
                },
            )*],
        }
    };
}
