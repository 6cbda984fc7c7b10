//! End-to-end scheduler scenarios driven through the public API: empty
//! ticks, single-edge cascades, ring overflow, subgraph transparency, and
//! port subscriptions, observed through the notification sink's reply
//! frames.

use std::cell::RefCell;
use std::rc::Rc;

use microweave::{
  Component, GraphCmd, HostSink, IoHandle, MockIo, MockTransport, Network, NetworkConfig,
  NetworkState, Packet, PortId, ProcessContext, SerialOut, SubGraph, ToggleBoolean,
  TransportHandle, FRAME_SIZE,
};

/// Records every packet it receives.
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

  fn component_id(&self) -> u8 {
    210
  }
}

struct Harness {
  transport: Rc<RefCell<MockTransport>>,
  io: Rc<RefCell<MockIo>>,
  network: Network,
}

fn harness(config: NetworkConfig) -> Harness {
  let transport = Rc::new(RefCell::new(MockTransport::new()));
  let handle: TransportHandle = transport.clone();
  let io = Rc::new(RefCell::new(MockIo::new()));
  let io_handle: IoHandle = io.clone();
  let mut network = Network::with_config(io_handle, config);
  network.set_notification_handler(Box::new(HostSink::new(handle)));
  Harness {
    transport,
    io,
    network,
  }
}

fn reply_cmds(transport: &Rc<RefCell<MockTransport>>) -> Vec<u8> {
  transport
    .borrow()
    .output_frames()
    .iter()
    .map(|frame| frame[0])
    .collect()
}

fn count_cmd(transport: &Rc<RefCell<MockTransport>>, cmd: GraphCmd) -> usize {
  reply_cmds(transport)
    .iter()
    .filter(|&&byte| byte == cmd as u8)
    .count()
}

#[test]
fn test_empty_tick_emits_only_state_change() {
  let mut h = harness(NetworkConfig::default());

  h.network.start();
  h.network.run_tick();

  assert_eq!(
    reply_cmds(&h.transport),
    vec![GraphCmd::NetworkStateChanged as u8]
  );
  assert_eq!(h.network.queue_indices(), (0, 0));
  assert_eq!(h.network.state(), NetworkState::Running);
}

#[test]
fn test_single_edge_cascade_takes_two_ticks() {
  let mut h = harness(NetworkConfig::default());
  let toggle = h
    .network
    .add_node(Box::new(ToggleBoolean::new(false)), 0)
    .unwrap();
  let serial = h
    .network
    .add_node(Box::new(SerialOut::new(0, 9600)), 0)
    .unwrap();
  h.network.connect(toggle, 0, serial, 0).unwrap();
  h.network.start();

  h.network.send_message(toggle, 0, Packet::Boolean(true)).unwrap();
  h.network.run_tick();

  // The toggle's inbox was delivered; its own send is still queued.
  assert_eq!(count_cmd(&h.transport, GraphCmd::PacketDelivered), 1);
  assert!(h.io.borrow().serial_output(0).is_empty());

  h.network.run_tick();

  // Second tick: the toggled boolean reached SerialOut, which wrote its
  // byte value (false encodes as 0).
  assert_eq!(count_cmd(&h.transport, GraphCmd::PacketDelivered), 2);
  assert_eq!(h.io.borrow().serial_output(0), &[0]);
}

#[test]
fn test_overflow_accepts_capacity_and_drops_the_rest() {
  let mut h = harness(NetworkConfig {
    max_nodes: 8,
    max_messages: 4,
  });
  let (probe, received) = Probe::new();
  let sink = h.network.add_node(Box::new(probe), 0).unwrap();
  h.network.start();
  h.transport.borrow_mut().clear_output();

  for value in 0u8..5 {
    let _ = h.network.send_message(sink, 0, Packet::Byte(value));
  }

  // The fifth enqueue was dropped and reported.
  assert_eq!(count_cmd(&h.transport, GraphCmd::DebugEvent), 1);

  h.network.run_tick();
  assert_eq!(count_cmd(&h.transport, GraphCmd::PacketDelivered), 4);
  let data: Vec<Packet> = received
    .borrow()
    .iter()
    .filter(|(_, packet)| packet.is_data())
    .map(|(_, packet)| *packet)
    .collect();
  assert_eq!(
    data,
    vec![
      Packet::Byte(0),
      Packet::Byte(1),
      Packet::Byte(2),
      Packet::Byte(3),
    ]
  );
}

#[test]
fn test_subgraph_forwards_to_wired_child() {
  let mut h = harness(NetworkConfig::default());
  let boundary = h.network.add_node(Box::new(SubGraph::new()), 0).unwrap();
  let (probe, received) = Probe::new();
  let child = h.network.add_node(Box::new(probe), boundary).unwrap();
  h.network
    .connect_subgraph(false, boundary, 0, child, 0)
    .unwrap();
  h.network.start();

  h.network
    .send_message(boundary, 0, Packet::Integer(42))
    .unwrap();
  h.network.run_tick(); // boundary sees it and forwards
  h.network.run_tick(); // child receives it untransformed

  let data: Vec<(PortId, Packet)> = received
    .borrow()
    .iter()
    .copied()
    .filter(|(_, packet)| packet.is_data())
    .collect();
  assert_eq!(data, vec![(0, Packet::Integer(42))]);
}

#[test]
fn test_subscription_traces_sends_until_disabled() {
  let mut h = harness(NetworkConfig::default());
  let toggle = h
    .network
    .add_node(Box::new(ToggleBoolean::new(false)), 0)
    .unwrap();
  let (probe, _received) = Probe::new();
  let sink = h.network.add_node(Box::new(probe), 0).unwrap();
  h.network.connect(toggle, 0, sink, 0).unwrap();
  h.network.start();

  h.network.subscribe_to_port(toggle, 0, true).unwrap();
  h.transport.borrow_mut().clear_output();

  h.network.send_message(toggle, 0, Packet::Boolean(true)).unwrap();
  h.network.run_tick();

  assert_eq!(count_cmd(&h.transport, GraphCmd::PacketSent), 1);
  // The PacketSent frame carries the sender endpoint and the toggled value.
  let frames = h.transport.borrow().output_frames();
  let sent = frames
    .iter()
    .find(|frame| frame[0] == GraphCmd::PacketSent as u8)
    .copied()
    .unwrap();
  assert_eq!(sent[1], toggle);
  assert_eq!(sent[2], 0);

  h.network.subscribe_to_port(toggle, 0, false).unwrap();
  h.transport.borrow_mut().clear_output();
  h.network.send_message(toggle, 0, Packet::Boolean(true)).unwrap();
  h.network.run_tick();
  h.network.run_tick();

  assert_eq!(count_cmd(&h.transport, GraphCmd::PacketSent), 0);
}

#[test]
fn test_reset_confirms_and_rewinds() {
  let mut h = harness(NetworkConfig::default());
  let node = h
    .network
    .add_node(Box::new(ToggleBoolean::new(false)), 0)
    .unwrap();
  h.network.send_message(node, 0, Packet::Void).unwrap();
  h.network.start();

  h.transport.borrow_mut().clear_output();
  h.network.reset();

  assert_eq!(h.network.state(), NetworkState::Stopped);
  assert_eq!(h.network.node_count(), 0);
  assert_eq!(h.network.queue_indices(), (0, 0));
  let frames = h.transport.borrow().output_frames();
  assert_eq!(frames.len(), 1);
  assert_eq!(frames[0][0], GraphCmd::NetworkStateChanged as u8);
  assert_eq!(frames[0][1], NetworkState::Stopped as u8);

  let fresh = h
    .network
    .add_node(Box::new(ToggleBoolean::new(false)), 0)
    .unwrap();
  assert_eq!(fresh, 1);
}

#[test]
fn test_all_replies_are_whole_frames() {
  let mut h = harness(NetworkConfig::default());
  let toggle = h
    .network
    .add_node(Box::new(ToggleBoolean::new(false)), 0)
    .unwrap();
  let (probe, _received) = Probe::new();
  let sink = h.network.add_node(Box::new(probe), 0).unwrap();
  h.network.connect(toggle, 0, sink, 0).unwrap();
  h.network.subscribe_to_port(toggle, 0, true).unwrap();
  h.network.start();
  h.network.send_message(toggle, 0, Packet::Boolean(false)).unwrap();
  h.network.run_tick();
  h.network.run_tick();
  h.network.reset();

  assert_eq!(h.transport.borrow().output().len() % FRAME_SIZE, 0);
}
