//! Unit tests for subgraph boundary forwarding in both directions.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::{Component, ProcessContext};
use crate::error::GraphError;
use crate::io::{IoHandle, MockIo};
use crate::network::{ComponentId, Network, PortId};
use crate::packet::Packet;
use crate::subgraph::{SubGraph, SUBGRAPH_MAX_PORTS};

struct Probe {
  received: Rc<RefCell<Vec<(PortId, Packet)>>>,
}

impl Probe {
  fn new() -> (Self, Rc<RefCell<Vec<(PortId, Packet)>>>) {
    let received = Rc::new(RefCell::new(Vec::new()));
    (
      Self {
        received: received.clone(),
      },
      received,
    )
  }
}

impl Component for Probe {
  fn process(&mut self, _ctx: &mut ProcessContext<'_>, packet: Packet, port: PortId) {
    self.received.borrow_mut().push((port, packet));
  }

  fn component_id(&self) -> ComponentId {
    201
  }
}

/// Emits a fixed packet on port 0 whenever it receives a data packet.
struct Emitter {
  packet: Packet,
}

impl Component for Emitter {
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, _port: PortId) {
    if packet.is_data() {
      ctx.send(self.packet);
    }
  }

  fn component_id(&self) -> ComponentId {
    202
  }
}

fn mock_io() -> IoHandle {
  Rc::new(RefCell::new(MockIo::new()))
}

fn data_packets(received: &Rc<RefCell<Vec<(PortId, Packet)>>>) -> Vec<(PortId, Packet)> {
  received
    .borrow()
    .iter()
    .copied()
    .filter(|(_, packet)| packet.is_data())
    .collect()
}

#[test]
fn test_input_port_forwards_to_child() {
  let mut network = Network::new(mock_io());
  let boundary = network.add_node(Box::new(SubGraph::new()), 0).unwrap();
  let (probe, received) = Probe::new();
  let child = network.add_node(Box::new(probe), boundary).unwrap();
  network
    .connect_subgraph(false, boundary, 0, child, 2)
    .unwrap();
  network.start();

  network.send_message(boundary, 0, Packet::Integer(42)).unwrap();
  // Tick one: the subgraph node sees the packet and forwards. Tick two:
  // the child receives it.
  network.run_tick();
  assert!(data_packets(&received).is_empty());
  network.run_tick();

  assert_eq!(data_packets(&received), vec![(2, Packet::Integer(42))]);
}

#[test]
fn test_output_port_forwards_from_child() {
  let mut network = Network::new(mock_io());
  let boundary = network.add_node(Box::new(SubGraph::new()), 0).unwrap();
  let child = network
    .add_node(
      Box::new(Emitter {
        packet: Packet::Byte(7),
      }),
      boundary,
    )
    .unwrap();
  let (probe, received) = Probe::new();
  let outside = network.add_node(Box::new(probe), 0).unwrap();

  // Child output 0 becomes boundary output 3; boundary output 3 reaches the
  // outside node.
  network.connect_subgraph(true, boundary, 3, child, 0).unwrap();
  network.connect(boundary, 3, outside, 1).unwrap();
  network.start();

  network.send_message(child, 0, Packet::Void).unwrap();
  network.run_tick(); // child emits toward the boundary
  network.run_tick(); // boundary re-sends on its external output
  network.run_tick(); // outside receives

  assert_eq!(data_packets(&received), vec![(1, Packet::Byte(7))]);
}

#[test]
fn test_boundary_port_out_of_range_is_rejected() {
  let mut network = Network::new(mock_io());
  let boundary = network.add_node(Box::new(SubGraph::new()), 0).unwrap();
  let child = network.add_node(Box::new(SubGraph::new()), 0).unwrap();

  let port = SUBGRAPH_MAX_PORTS as PortId;
  let result = network.connect_subgraph(false, boundary, port, child, 0);
  assert_eq!(result, Err(GraphError::SubgraphPortOutOfRange(port)));
}

#[test]
fn test_wiring_through_non_subgraph_is_rejected() {
  let mut network = Network::new(mock_io());
  let (probe, _) = Probe::new();
  let plain = network.add_node(Box::new(probe), 0).unwrap();
  let (other, _) = Probe::new();
  let child = network.add_node(Box::new(other), 0).unwrap();

  let result = network.connect_subgraph(false, plain, 0, child, 0);
  assert_eq!(result, Err(GraphError::NotASubgraph(plain)));

  // The output direction must refuse too, leaving the child's fan-out
  // untouched.
  let result = network.connect_subgraph(true, plain, 0, child, 0);
  assert_eq!(result, Err(GraphError::NotASubgraph(plain)));
  assert_eq!(network.connection(child, 0).unwrap().target, None);
}

#[test]
fn test_control_packets_are_not_forwarded() {
  let mut network = Network::new(mock_io());
  let boundary = network.add_node(Box::new(SubGraph::new()), 0).unwrap();
  let (probe, received) = Probe::new();
  let child = network.add_node(Box::new(probe), boundary).unwrap();
  network
    .connect_subgraph(false, boundary, 0, child, 0)
    .unwrap();

  // Start and tick: the child sees its own Setup and Ticks, but nothing
  // doubled through the boundary.
  network.start();
  network.run_tick();
  network.run_tick();

  let log = received.borrow();
  let setups = log.iter().filter(|(_, packet)| packet.is_setup()).count();
  let ticks = log.iter().filter(|(_, packet)| packet.is_tick()).count();
  assert_eq!(setups, 1);
  assert_eq!(ticks, 2);
}

#[test]
fn test_unwired_input_drops_packet() {
  let mut network = Network::new(mock_io());
  let boundary = network.add_node(Box::new(SubGraph::new()), 0).unwrap();
  network.start();

  network.send_message(boundary, 5, Packet::Byte(1)).unwrap();
  network.run_tick();
  network.run_tick();

  // Nothing to assert beyond survival: the packet had nowhere to go and
  // the network kept running.
  assert_eq!(network.pending_messages(), 0);
}

#[test]
fn test_subgraph_reports_wired_input() {
  let mut subgraph = SubGraph::new();
  assert!(subgraph.input(0).is_none());
  subgraph.connect_inport(0, crate::network::Endpoint { node: 4, port: 1 });
  assert_eq!(
    subgraph.input(0),
    Some(crate::network::Endpoint { node: 4, port: 1 })
  );
}
