//! `HostRuntime` implementation for this runtime

use vtid_core::layout::TypeDescriptor;
use vtid_core::traits::HostRuntime;

use crate::tls;
use crate::typeinfo;

/// Capability handle onto this runtime's control blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeHost;

// Safety: the layouts come from offset_of! on the real structs; the TLS
// pointer is set only while the machine is alive on its thread's stack;
// curtask and slot are null or point at blocks kept alive by that machine.
unsafe impl HostRuntime for RuntimeHost {
    fn types(&self) -> &'static [TypeDescriptor] {
        &typeinfo::TYPES
    }

    #[inline]
    fn current_thread_handle(&self) -> *const u8 {
        tls::current_machine().cast()
    }

    fn name(&self) -> &'static str {
        "vtid-runtime"
    }
}
