use crate::component::{Component, ProcessContext};
use crate::io::PinMode;
use crate::network::{ComponentId, PortId};
use crate::packet::Packet;

pub const DIGITAL_READ_ID: ComponentId = 6;

/// Polls an input pin on every Tick and emits a boolean on port 0 when the
/// level changes. Port 1 reconfigures the pin number.
#[derive(Debug)]
pub struct DigitalRead {
  pin: u8,
  last: Option<bool>,
}

impl DigitalRead {
  pub fn new(pin: u8) -> Self {
    Self { pin, last: None }
  }
}

impl Component for DigitalRead {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, port: PortId) {
    if packet.is_setup() {
      let pin = self.pin;
      ctx.io_op(|io| io.pin_set_mode(pin, PinMode::Input));
      return;
    }
    if packet.is_tick() {
      let pin = self.pin;
      let level = ctx.io_op(|io| io.digital_read(pin));
      if self.last != Some(level) {
        self.last = Some(level);
        ctx.send(Packet::Boolean(level));
      }
      return;
    }
    if packet.is_data() && port == 1 {
      self.pin = packet.as_integer() as u8;
      self.last = None;
      let pin = self.pin;
      ctx.io_op(|io| io.pin_set_mode(pin, PinMode::Input));
    }
  }

  fn component_id(&self) -> ComponentId {
    DIGITAL_READ_ID
  }
}
