use crate::component::{Component, ProcessContext};
use crate::network::{ComponentId, PortId};
use crate::packet::Packet;

pub const SERIAL_OUT_ID: ComponentId = 4;

/// Writes the byte value of each data packet to a serial device. The device
/// is opened on Setup.
#[derive(Debug)]
pub struct SerialOut {
  device: u8,
  baud: u32,
}

impl SerialOut {
  pub fn new(device: u8, baud: u32) -> Self {
    Self { device, baud }
  }
}

impl Component for SerialOut {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, _port: PortId) {
    if packet.is_setup() {
      let device = self.device;
      let baud = self.baud;
      ctx.io_op(|io| io.serial_begin(device, baud));
      return;
    }
    if packet.is_data() {
      let device = self.device;
      ctx.io_op(|io| io.serial_write(device, packet.as_byte()));
    }
  }

  fn component_id(&self) -> ComponentId {
    SERIAL_OUT_ID
  }

  fn output_ports(&self) -> usize {
    0
  }
}
