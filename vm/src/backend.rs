use crate::event::{AudioEvent, Schedule};
use crate::state::VmState;

/// Receives the musical events produced while the vm walks the program
pub trait Backend {
    fn schedule(&mut self, event: AudioEvent, vm_state: &VmState);
}

/// Discards every event, for dry runs of the control flow
pub struct NoopBackend;

impl Backend for NoopBackend {
    fn schedule(&mut self, _event: AudioEvent, _vm_state: &VmState) {}
}

impl Backend for Schedule {
    fn schedule(&mut self, event: AudioEvent, vm_state: &VmState) {
        tracing::debug!(
            "scheduled at {} ticks: {} {:?} (pc {})",
            event.timestamp,
            event.track,
            event.kind,
            vm_state.pc
        );
        self.push(event);
    }
}
