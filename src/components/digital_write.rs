use crate::component::{Component, ProcessContext};
use crate::io::PinMode;
use crate::network::{ComponentId, PortId};
use crate::packet::Packet;

pub const DIGITAL_WRITE_ID: ComponentId = 5;

/// Drives an output pin from boolean packets on port 0. Port 1 reconfigures
/// the pin number. The pin is set to output mode on Setup.
#[derive(Debug)]
pub struct DigitalWrite {
  pin: u8,
}

impl DigitalWrite {
  pub fn new(pin: u8) -> Self {
    Self { pin }
  }
}

impl Component for DigitalWrite {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, port: PortId) {
    if packet.is_setup() {
      let pin = self.pin;
      ctx.io_op(|io| io.pin_set_mode(pin, PinMode::Output));
      return;
    }
    if !packet.is_data() {
      return;
    }
    match port {
      0 => {
        let pin = self.pin;
        ctx.io_op(|io| io.digital_write(pin, packet.as_bool()));
      }
      1 => {
        self.pin = packet.as_integer() as u8;
        let pin = self.pin;
        ctx.io_op(|io| io.pin_set_mode(pin, PinMode::Output));
      }
      _ => {}
    }
  }

  fn component_id(&self) -> ComponentId {
    DIGITAL_WRITE_ID
  }

  fn output_ports(&self) -> usize {
    0
  }
}
