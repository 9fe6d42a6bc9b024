//! Error types for identity lookups

use core::fmt;
use crate::layout::FieldKind;

/// Result type for runtime operations
pub type RtResult<T> = Result<T, RtError>;

/// Errors from the host runtime (spawning, joining, lifecycle)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtError {
    /// Configuration rejected by `validate()`
    InvalidConfig(&'static str),

    /// Runtime already started
    AlreadyStarted,

    /// Runtime not started yet
    NotStarted,

    /// Runtime has been shut down
    ShuttingDown,

    /// Free-standing `spawn` called from outside any runtime thread
    NotOnRuntime,

    /// Failed to spawn a machine thread
    SpawnFailed,

    /// Task panicked or was dropped before producing its output
    TaskAborted,
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtError::InvalidConfig(why) => write!(f, "invalid configuration: {}", why),
            RtError::AlreadyStarted => write!(f, "runtime already started"),
            RtError::NotStarted => write!(f, "runtime not started"),
            RtError::ShuttingDown => write!(f, "runtime is shutting down"),
            RtError::NotOnRuntime => write!(f, "not running on a runtime thread"),
            RtError::SpawnFailed => write!(f, "failed to spawn machine thread"),
            RtError::TaskAborted => write!(f, "task aborted before completion"),
        }
    }
}

impl std::error::Error for RtError {}

/// Result type for identity lookups
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors returned by the identity readers
///
/// `UnsupportedRuntime` is decided once, when offsets are first resolved,
/// and is then replayed unchanged to every later caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The host runtime does not publish the expected layout
    UnsupportedRuntime(LayoutError),

    /// Called from a context that has no task or slot to report
    PreconditionViolation(Precondition),
}

impl IdentityError {
    /// True if this error is permanent for the process
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, IdentityError::UnsupportedRuntime(_))
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::UnsupportedRuntime(e) => write!(f, "unsupported runtime: {}", e),
            IdentityError::PreconditionViolation(p) => write!(f, "precondition violated: {}", p),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<LayoutError> for IdentityError {
    fn from(e: LayoutError) -> Self {
        IdentityError::UnsupportedRuntime(e)
    }
}

impl From<Precondition> for IdentityError {
    fn from(p: Precondition) -> Self {
        IdentityError::PreconditionViolation(p)
    }
}

/// Why a (structure, field) pair could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// No type registered under this name
    TypeNotFound { type_name: &'static str },

    /// More than one type registered under this name
    AmbiguousType { type_name: &'static str, count: usize },

    /// Type exists but has no field with this name
    FieldNotFound { type_name: &'static str, field: &'static str },

    /// Field exists but has the wrong shape
    FieldKindMismatch {
        type_name: &'static str,
        field: &'static str,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Field offset is not a multiple of the field's alignment
    FieldMisaligned {
        type_name: &'static str,
        field: &'static str,
        offset: usize,
    },

    /// Field does not fit inside the structure
    FieldOutOfBounds {
        type_name: &'static str,
        field: &'static str,
        offset: usize,
        type_size: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::TypeNotFound { type_name } => {
                write!(f, "type {} not found", type_name)
            }
            LayoutError::AmbiguousType { type_name, count } => {
                write!(f, "type {} registered {} times", type_name, count)
            }
            LayoutError::FieldNotFound { type_name, field } => {
                write!(f, "field {}.{} not found", type_name, field)
            }
            LayoutError::FieldKindMismatch { type_name, field, expected, found } => {
                write!(f, "field {}.{} is {}, expected {}", type_name, field, found, expected)
            }
            LayoutError::FieldMisaligned { type_name, field, offset } => {
                write!(f, "field {}.{} at offset {} is misaligned", type_name, field, offset)
            }
            LayoutError::FieldOutOfBounds { type_name, field, offset, type_size } => {
                write!(
                    f,
                    "field {}.{} at offset {} does not fit in {} bytes",
                    type_name, field, offset, type_size
                )
            }
        }
    }
}

/// Caller-side misuse detected before any memory was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Calling thread has no thread-control block
    NotOnRuntimeThread,

    /// Calling thread is not running a task
    NoCurrentTask,

    /// Calling thread does not hold an execution slot
    NoSlotHeld,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NotOnRuntimeThread => write!(f, "not called from a runtime thread"),
            Precondition::NoCurrentTask => write!(f, "no task running on this thread"),
            Precondition::NoSlotHeld => write!(f, "no execution slot held by this thread"),
        }
    }
}
