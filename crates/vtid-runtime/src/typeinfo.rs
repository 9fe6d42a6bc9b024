//! Type registry: the layouts this runtime publishes
//!
//! Readers look structures up here by fully-qualified name. The offsets
//! are whatever the compiler chose for this build; nothing outside this
//! crate should assume them.

use vtid_core::layout::TypeDescriptor;

use crate::machine::MACHINE_LAYOUT;
use crate::slot::SLOT_LAYOUT;
use crate::task::TASK_HEADER_LAYOUT;

/// All published layouts
pub static TYPES: [TypeDescriptor; 3] = [MACHINE_LAYOUT, TASK_HEADER_LAYOUT, SLOT_LAYOUT];

/// Look up published layouts by name
pub fn types_by_name(name: &str) -> impl Iterator<Item = &'static TypeDescriptor> + '_ {
    TYPES.iter().filter(move |t| t.name == name)
}
