use crate::component::{Component, ProcessContext};
use crate::network::{ComponentId, PortId};
use crate::packet::Packet;

pub const FORWARD_ID: ComponentId = 2;

/// Re-emits every data packet unchanged on port 0. Useful as fan-in glue
/// and as a wire-tap point for port subscriptions.
#[derive(Debug, Default)]
pub struct Forward;

impl Forward {
  pub fn new() -> Self {
    Self
  }
}

impl Component for Forward {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, _port: PortId) {
    if packet.is_data() {
      ctx.send(packet);
    }
  }

  fn component_id(&self) -> ComponentId {
    FORWARD_ID
  }
}
