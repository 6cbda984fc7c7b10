//! End-to-end wire sessions: a tool synchronizes over garbage, builds and
//! starts a graph frame-by-frame, and observes the runtime through reply
//! frames, all over an in-memory transport.

use std::cell::RefCell;
use std::rc::Rc;

use microweave::{
  GraphCmd, HostController, HostSink, IoHandle, MockIo, MockTransport, Network, NetworkState,
  StandardLibrary, TransportHandle, FORWARD_ID, FRAME_SIZE, GRAPH_MAGIC, SERIAL_OUT_ID,
  TOGGLE_BOOLEAN_ID,
};

struct Session {
  transport: Rc<RefCell<MockTransport>>,
  io: Rc<RefCell<MockIo>>,
  controller: HostController,
  network: Network,
}

impl Session {
  fn new() -> Self {
    let transport = Rc::new(RefCell::new(MockTransport::new()));
    let handle: TransportHandle = transport.clone();
    let io = Rc::new(RefCell::new(MockIo::new()));
    let io_handle: IoHandle = io.clone();
    let controller = HostController::new(handle.clone(), Box::new(StandardLibrary::new()));
    let mut network = Network::new(io_handle);
    network.set_notification_handler(Box::new(HostSink::new(handle)));
    Self {
      transport,
      io,
      controller,
      network,
    }
  }

  /// Queues bytes from the tool and drains them through the parser, as the
  /// main loop would.
  fn receive(&mut self, bytes: &[u8]) {
    self.transport.borrow_mut().push_input(bytes);
    self.controller.run_tick(&mut self.network);
  }

  fn send_frame(&mut self, cmd: GraphCmd, args: &[u8]) {
    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = cmd as u8;
    frame[1..1 + args.len()].copy_from_slice(args);
    self.receive(&frame);
  }

  fn reply_cmds(&self) -> Vec<u8> {
    self
      .transport
      .borrow()
      .output_frames()
      .iter()
      .map(|frame| frame[0])
      .collect()
  }
}

#[test]
fn test_resync_through_garbage_then_build_and_start() {
  let mut session = Session::new();

  session.receive(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x42]);
  assert!(session.transport.borrow().output().is_empty());

  session.receive(&GRAPH_MAGIC);
  session.send_frame(GraphCmd::AddNode, &[TOGGLE_BOOLEAN_ID, 0]);
  session.send_frame(GraphCmd::StartNetwork, &[]);

  assert_eq!(session.network.node_count(), 1);
  assert_eq!(session.network.state(), NetworkState::Running);
  assert_eq!(
    session.reply_cmds(),
    vec![
      GraphCmd::CommunicationOpen as u8,
      GraphCmd::NodeAdded as u8,
      GraphCmd::NetworkStateChanged as u8,
    ]
  );
}

#[test]
fn test_full_session_drives_hardware_through_the_graph() {
  let mut session = Session::new();
  session.receive(&GRAPH_MAGIC);

  // Toggle -> SerialOut, wired and started entirely over the wire.
  session.send_frame(GraphCmd::AddNode, &[TOGGLE_BOOLEAN_ID, 0]);
  session.send_frame(GraphCmd::AddNode, &[SERIAL_OUT_ID, 0]);
  session.send_frame(GraphCmd::ConnectNodes, &[1, 0, 2, 0]);
  session.send_frame(GraphCmd::StartNetwork, &[]);

  // kind 1 = boolean, value true.
  session.send_frame(GraphCmd::SendPacket, &[1, 0, 1, 1, 0, 0, 0]);
  session.network.run_tick();
  session.network.run_tick();

  // The toggled boolean (false) reached SerialOut as byte 0.
  assert_eq!(session.io.borrow().serial_output(0), &[0]);
}

#[test]
fn test_subscription_over_the_wire_mirrors_packets() {
  let mut session = Session::new();
  session.receive(&GRAPH_MAGIC);
  session.send_frame(GraphCmd::AddNode, &[TOGGLE_BOOLEAN_ID, 0]);
  session.send_frame(GraphCmd::AddNode, &[FORWARD_ID, 0]);
  session.send_frame(GraphCmd::ConnectNodes, &[1, 0, 2, 0]);
  session.send_frame(GraphCmd::SubscribeToPort, &[1, 0, 1]);
  session.send_frame(GraphCmd::StartNetwork, &[]);
  session.transport.borrow_mut().clear_output();

  session.send_frame(GraphCmd::SendPacket, &[1, 0, 1, 1, 0, 0, 0]);
  session.network.run_tick();

  let frames = session.transport.borrow().output_frames();
  let sent = frames
    .iter()
    .find(|frame| frame[0] == GraphCmd::PacketSent as u8)
    .copied()
    .expect("subscribed send should be mirrored");
  // Sender endpoint (node 1, port 0), boolean kind, toggled value false.
  assert_eq!(&sent[1..5], &[1, 0, 1, 0]);
}

#[test]
fn test_list_commands_describe_the_graph() {
  let mut session = Session::new();
  session.receive(&GRAPH_MAGIC);
  session.send_frame(GraphCmd::AddNode, &[FORWARD_ID, 0]);
  session.send_frame(GraphCmd::AddNode, &[FORWARD_ID, 0]);
  session.send_frame(GraphCmd::ConnectNodes, &[1, 0, 2, 3]);
  session.transport.borrow_mut().clear_output();

  session.send_frame(GraphCmd::ListNodes, &[]);
  session.send_frame(GraphCmd::ListEdges, &[]);

  let frames = session.transport.borrow().output_frames();
  let nodes: Vec<_> = frames
    .iter()
    .filter(|frame| frame[0] == GraphCmd::NodeInfo as u8)
    .collect();
  assert_eq!(nodes.len(), 2);
  assert_eq!(&nodes[0][1..4], &[1, FORWARD_ID, 0]);
  assert_eq!(&nodes[1][1..4], &[2, FORWARD_ID, 0]);

  let edges: Vec<_> = frames
    .iter()
    .filter(|frame| frame[0] == GraphCmd::EdgeInfo as u8)
    .collect();
  assert_eq!(edges.len(), 1);
  assert_eq!(&edges[0][1..5], &[1, 0, 2, 3]);

  let terminators = frames
    .iter()
    .filter(|frame| frame[0] == GraphCmd::EndOfList as u8)
    .count();
  assert_eq!(terminators, 2);
}

#[test]
fn test_stop_and_reset_over_the_wire() {
  let mut session = Session::new();
  session.receive(&GRAPH_MAGIC);
  session.send_frame(GraphCmd::AddNode, &[FORWARD_ID, 0]);
  session.send_frame(GraphCmd::StartNetwork, &[]);

  session.send_frame(GraphCmd::StopNetwork, &[]);
  assert_eq!(session.network.state(), NetworkState::Stopped);
  assert_eq!(session.network.node_count(), 1);

  session.send_frame(GraphCmd::ResetNetwork, &[]);
  assert_eq!(session.network.node_count(), 0);
  assert_eq!(session.network.queue_indices(), (0, 0));
}

#[test]
fn test_session_output_is_frame_aligned() {
  let mut session = Session::new();
  session.receive(&[0x01, 0x02]);
  session.receive(&GRAPH_MAGIC);
  session.send_frame(GraphCmd::AddNode, &[TOGGLE_BOOLEAN_ID, 0]);
  session.send_frame(GraphCmd::AddNode, &[99, 0]); // unknown component
  session.send_frame(GraphCmd::ListComponents, &[]);
  session.send_frame(GraphCmd::StartNetwork, &[]);
  session.network.run_tick();

  assert_eq!(session.transport.borrow().output().len() % FRAME_SIZE, 0);
}
