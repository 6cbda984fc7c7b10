//! # Bundled Components
//!
//! A small component library used by the demos and tests. The full library
//! for a firmware build is generated alongside the graph; these are the
//! hand-written staples, one file per component, plus the
//! [`StandardLibrary`] that maps stable component ids to constructors for
//! the host `AddNode` command.

mod digital_read;
mod digital_write;
mod forward;
mod serial_out;
mod toggle_boolean;

pub use digital_read::{DigitalRead, DIGITAL_READ_ID};
pub use digital_write::{DigitalWrite, DIGITAL_WRITE_ID};
pub use forward::{Forward, FORWARD_ID};
pub use serial_out::{SerialOut, SERIAL_OUT_ID};
pub use toggle_boolean::{ToggleBoolean, TOGGLE_BOOLEAN_ID};

use crate::component::Component;
use crate::host::ComponentLibrary;
use crate::network::ComponentId;
use crate::subgraph::{SubGraph, SUBGRAPH_COMPONENT_ID};

/// The component library shipped with the runtime. Hardware-facing
/// components come up with conventional defaults (serial device 0 at 9600
/// baud, pin 13) and are reconfigured through their config ports.
#[derive(Debug, Default)]
pub struct StandardLibrary;

impl StandardLibrary {
  pub fn new() -> Self {
    Self
  }
}

impl ComponentLibrary for StandardLibrary {
  fn create(&self, id: ComponentId) -> Option<Box<dyn Component>> {
    let component: Box<dyn Component> = match id {
      SUBGRAPH_COMPONENT_ID => Box::new(SubGraph::new()),
      FORWARD_ID => Box::new(Forward::new()),
      TOGGLE_BOOLEAN_ID => Box::new(ToggleBoolean::new(false)),
      SERIAL_OUT_ID => Box::new(SerialOut::new(0, 9600)),
      DIGITAL_WRITE_ID => Box::new(DigitalWrite::new(13)),
      DIGITAL_READ_ID => Box::new(DigitalRead::new(13)),
      _ => return None,
    };
    Some(component)
  }

  fn ids(&self) -> Vec<ComponentId> {
    vec![
      SUBGRAPH_COMPONENT_ID,
      FORWARD_ID,
      TOGGLE_BOOLEAN_ID,
      SERIAL_OUT_ID,
      DIGITAL_WRITE_ID,
      DIGITAL_READ_ID,
    ]
  }
}
