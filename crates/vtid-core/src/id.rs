//! Task and execution slot identifiers

use core::fmt;

/// Runtime-assigned identifier of a task
///
/// Assigned once at spawn time and never changed, even when the task is
/// resumed on a different machine. Unique among all live tasks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Id reported as the parent of tasks spawned from outside the runtime
    pub const NONE: TaskId = TaskId(crate::constants::NO_PARENT);

    #[inline]
    pub const fn new(id: i64) -> Self {
        TaskId(id)
    }

    /// Get the raw i64 value
    #[inline]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == crate::constants::NO_PARENT
    }
}

impl From<TaskId> for i64 {
    #[inline]
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "TaskId(NONE)")
        } else {
            write!(f, "TaskId({})", self.0)
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an execution slot
///
/// Only meaningful at the instant it was read: the task may be moved to
/// another slot at its next suspension point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SlotId(i32);

impl SlotId {
    #[inline]
    pub const fn new(id: i32) -> Self {
        SlotId(id)
    }

    /// Get the raw i32 value
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get as usize for indexing
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<SlotId> for i32 {
    #[inline]
    fn from(id: SlotId) -> Self {
        id.0
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_none() {
        assert!(TaskId::NONE.is_none());
        assert!(!TaskId::new(7).is_none());
        assert_eq!(format!("{:?}", TaskId::NONE), "TaskId(NONE)");
        assert_eq!(format!("{:?}", TaskId::new(7)), "TaskId(7)");
    }

    #[test]
    fn test_conversions() {
        let raw: i64 = TaskId::new(1 << 40).into();
        assert_eq!(raw, 1 << 40);

        let slot = SlotId::new(3);
        assert_eq!(slot.as_usize(), 3);
        assert_eq!(i32::from(slot), 3);
        assert_eq!(slot.to_string(), "3");
    }
}
