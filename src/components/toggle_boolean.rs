use crate::component::{Component, ProcessContext};
use crate::network::{ComponentId, PortId};
use crate::packet::Packet;

pub const TOGGLE_BOOLEAN_ID: ComponentId = 3;

/// Emits the inverse of each received boolean on port 0 and remembers it as
/// the current value.
#[derive(Debug)]
pub struct ToggleBoolean {
  value: bool,
}

impl ToggleBoolean {
  pub fn new(initial: bool) -> Self {
    Self { value: initial }
  }

  pub fn value(&self) -> bool {
    self.value
  }
}

impl Component for ToggleBoolean {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, _port: PortId) {
    if !packet.is_data() {
      return;
    }
    self.value = !packet.as_bool();
    ctx.send(Packet::Boolean(self.value));
  }

  fn component_id(&self) -> ComponentId {
    TOGGLE_BOOLEAN_ID
  }
}
