//! # Subgraph
//!
//! A composite node whose boundary ports route transparently to child nodes
//! registered inside it. The subgraph performs no data transformation: a
//! packet arriving on external input port `p` is forwarded verbatim to the
//! child wired at that port, and a child wired to a boundary output reaches
//! the outside world through the subgraph's own fan-out table.
//!
//! Port space: external inputs occupy `0..SUBGRAPH_MAX_PORTS`. The internal
//! side of boundary outputs occupies the range directly above it, so a child
//! whose output was rewired by `connect_subgraph(is_output = true, ..)`
//! targets the subgraph node at `SUBGRAPH_MAX_PORTS + p`, and the subgraph
//! re-sends on its external output `p`.

use tracing::trace;

use crate::commands::{DebugId, DebugLevel};
use crate::component::{Component, ProcessContext};
use crate::network::{ComponentId, Connection, Endpoint, PortId};
use crate::packet::Packet;

/// Boundary port capacity, per direction.
pub const SUBGRAPH_MAX_PORTS: usize = 10;

/// Component id of the subgraph component, shared with the host tool.
pub const SUBGRAPH_COMPONENT_ID: ComponentId = 1;

/// The boundary component. Created like any other node (typically via the
/// host `AddNode` command); children name it as their parent and boundary
/// ports are wired with [`crate::network::Network::connect_subgraph`].
#[derive(Debug, Default)]
pub struct SubGraph {
  inputs: [Connection; SUBGRAPH_MAX_PORTS],
}

impl SubGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// The child endpoint wired at external input `port`, if any.
  pub fn input(&self, port: PortId) -> Option<Endpoint> {
    self
      .inputs
      .get(port as usize)
      .and_then(|connection| connection.target)
  }

  pub(crate) fn connect_inport(&mut self, port: PortId, target: Endpoint) {
    if let Some(connection) = self.inputs.get_mut(port as usize) {
      connection.target = Some(target);
    }
  }
}

impl Component for SubGraph {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, port: PortId) {
    // Children are registered nodes and receive their own Setup/Tick;
    // forwarding control packets would deliver them twice.
    if packet.is_special() {
      return;
    }
    let index = port as usize;
    if index < SUBGRAPH_MAX_PORTS {
      match self.inputs[index].target {
        Some(target) => ctx.forward(target, packet),
        None => {
          trace!(port, "packet on unwired subgraph input");
        }
      }
    } else if index < 2 * SUBGRAPH_MAX_PORTS {
      ctx.send_to(packet, (index - SUBGRAPH_MAX_PORTS) as PortId);
    } else {
      ctx.emit_debug(DebugLevel::Error, DebugId::SubgraphPortOutOfRange);
    }
  }

  fn component_id(&self) -> ComponentId {
    SUBGRAPH_COMPONENT_ID
  }

  fn output_ports(&self) -> usize {
    SUBGRAPH_MAX_PORTS
  }

  fn as_subgraph(&self) -> Option<&SubGraph> {
    Some(self)
  }

  fn as_subgraph_mut(&mut self) -> Option<&mut SubGraph> {
    Some(self)
  }
}
