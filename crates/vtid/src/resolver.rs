//! OffsetResolver: one-time discovery of control-block field offsets
//!
//! The readers need five offsets:
//!
//! ```text
//! Machine.curtask      (ptr)  thread-control block -> current task
//! TaskHeader.id        (i64)  task id
//! TaskHeader.parent_id (i64)  spawning task's id
//! Machine.slot         (ptr)  thread-control block -> held slot
//! Slot.id              (i32)  slot id
//! ```
//!
//! Each is looked up by structure name and field name in the host's type
//! registry, checked for kind, alignment and bounds, and recorded. All five
//! resolve together or the whole cache is a failure; a failure is kept and
//! handed back to every later caller.

use std::fmt;
use std::sync::OnceLock;

use vtid_core::error::{IdentityError, IdentityResult, LayoutError};
use vtid_core::layout::{FieldKind, TypeDescriptor};
use vtid_core::traits::HostRuntime;
use vtid_core::{kdebug, kerror};

/// Fully-qualified name of the thread-control block
pub const MACHINE_TYPE: &str = "vtid_runtime::machine::Machine";
/// Fully-qualified name of the task-control block
pub const TASK_TYPE: &str = "vtid_runtime::task::TaskHeader";
/// Fully-qualified name of the slot-control block
pub const SLOT_TYPE: &str = "vtid_runtime::slot::Slot";

/// One (structure, field) pair to resolve
#[derive(Debug, Clone, Copy)]
struct FieldRequest {
    type_name: &'static str,
    field: &'static str,
    kind: FieldKind,
}

const CURTASK: FieldRequest = FieldRequest { type_name: MACHINE_TYPE, field: "curtask", kind: FieldKind::Ptr };
const TASK_ID: FieldRequest = FieldRequest { type_name: TASK_TYPE, field: "id", kind: FieldKind::I64 };
const PARENT_ID: FieldRequest = FieldRequest { type_name: TASK_TYPE, field: "parent_id", kind: FieldKind::I64 };
const SLOT_LINK: FieldRequest = FieldRequest { type_name: MACHINE_TYPE, field: "slot", kind: FieldKind::Ptr };
const SLOT_ID: FieldRequest = FieldRequest { type_name: SLOT_TYPE, field: "id", kind: FieldKind::I32 };

/// Resolved byte offsets, immutable once built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCache {
    pub machine_curtask: usize,
    pub task_id: usize,
    pub task_parent_id: usize,
    pub machine_slot: usize,
    pub slot_id: usize,
}

impl fmt::Display for OffsetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Machine.curtask=+{} TaskHeader.id=+{} TaskHeader.parent_id=+{} Machine.slot=+{} Slot.id=+{}",
            self.machine_curtask, self.task_id, self.task_parent_id, self.machine_slot, self.slot_id
        )
    }
}

/// Find exactly one type named `name`
fn lookup_type(types: &'static [TypeDescriptor], name: &'static str) -> Result<&'static TypeDescriptor, LayoutError> {
    let mut found = None;
    let mut count = 0usize;
    for t in types.iter().filter(|t| t.name == name) {
        found.get_or_insert(t);
        count += 1;
    }
    match (found, count) {
        (Some(t), 1) => Ok(t),
        (None, _) => Err(LayoutError::TypeNotFound { type_name: name }),
        (Some(_), count) => Err(LayoutError::AmbiguousType { type_name: name, count }),
    }
}

/// Resolve one field's offset, validating shape and placement
fn resolve_field(types: &'static [TypeDescriptor], req: FieldRequest) -> Result<usize, LayoutError> {
    let ty = lookup_type(types, req.type_name)?;
    let field = ty.field_by_name(req.field).ok_or(LayoutError::FieldNotFound {
        type_name: req.type_name,
        field: req.field,
    })?;

    if field.kind != req.kind {
        return Err(LayoutError::FieldKindMismatch {
            type_name: req.type_name,
            field: req.field,
            expected: req.kind,
            found: field.kind,
        });
    }
    if field.offset % req.kind.align() != 0 {
        return Err(LayoutError::FieldMisaligned {
            type_name: req.type_name,
            field: req.field,
            offset: field.offset,
        });
    }
    let fits = field
        .offset
        .checked_add(req.kind.size())
        .is_some_and(|end| end <= ty.size);
    if !fits {
        return Err(LayoutError::FieldOutOfBounds {
            type_name: req.type_name,
            field: req.field,
            offset: field.offset,
            type_size: ty.size,
        });
    }
    Ok(field.offset)
}

/// Resolve every offset the readers need from a host's type registry
///
/// Deterministic and side-effect free: the same registry always yields the
/// same result.
pub fn resolve_offsets<H: HostRuntime + ?Sized>(host: &H) -> Result<OffsetCache, LayoutError> {
    let types = host.types();
    Ok(OffsetCache {
        machine_curtask: resolve_field(types, CURTASK)?,
        task_id: resolve_field(types, TASK_ID)?,
        task_parent_id: resolve_field(types, PARENT_ID)?,
        machine_slot: resolve_field(types, SLOT_LINK)?,
        slot_id: resolve_field(types, SLOT_ID)?,
    })
}

/// Memoized offset resolution for one host
///
/// The first `resolve()` computes the offsets under a once-only barrier;
/// concurrent first callers wait for it and all see the same outcome.
/// Afterwards `resolve()` is a single atomic load.
pub struct OffsetResolver<H> {
    host: H,
    cache: OnceLock<IdentityResult<OffsetCache>>,
}

impl<H: HostRuntime> OffsetResolver<H> {
    pub const fn new(host: H) -> Self {
        Self {
            host,
            cache: OnceLock::new(),
        }
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Resolved offsets, or the cached failure
    #[inline]
    pub fn resolve(&self) -> IdentityResult<&OffsetCache> {
        match self.cache.get_or_init(|| self.compute()) {
            Ok(cache) => Ok(cache),
            Err(e) => Err(e.clone()),
        }
    }

    /// True once resolution has run (successfully or not)
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.cache.get().is_some()
    }

    #[cold]
    fn compute(&self) -> IdentityResult<OffsetCache> {
        match resolve_offsets(&self.host) {
            Ok(cache) => {
                kdebug!("{}: resolved offsets: {}", self.host.name(), cache);
                Ok(cache)
            }
            Err(e) => {
                kerror!("{}: cannot resolve control-block layout: {}", self.host.name(), e);
                Err(IdentityError::UnsupportedRuntime(e))
            }
        }
    }
}
