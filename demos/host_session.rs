//! A wire-driven session: the "tool" side of the host protocol scripted
//! against the in-memory transport. It synchronizes with the magic
//! preamble, builds a two-node graph frame-by-frame, starts it, injects a
//! packet, and prints every reply frame the runtime mirrors back.

use std::cell::RefCell;
use std::rc::Rc;

use microweave::{
  GraphCmd, HostController, HostSink, IoHandle, MockIo, MockTransport, Network, StandardLibrary,
  TransportHandle, FRAME_SIZE, GRAPH_MAGIC, SERIAL_OUT_ID, TOGGLE_BOOLEAN_ID,
};

fn frame(cmd: GraphCmd, args: &[u8]) -> [u8; FRAME_SIZE] {
  let mut frame = [0u8; FRAME_SIZE];
  frame[0] = cmd as u8;
  frame[1..1 + args.len()].copy_from_slice(args);
  frame
}

fn main() {
  let transport = Rc::new(RefCell::new(MockTransport::new()));
  let handle: TransportHandle = transport.clone();
  let io: IoHandle = Rc::new(RefCell::new(MockIo::new()));

  let mut controller = HostController::new(handle.clone(), Box::new(StandardLibrary::new()));
  let mut network = Network::new(io);
  network.set_notification_handler(Box::new(HostSink::new(handle)));

  // The tool's opening transmission: preamble, graph construction, start,
  // and one boolean packet into the toggle.
  {
    let mut tx = transport.borrow_mut();
    tx.push_input(&GRAPH_MAGIC);
    tx.push_input(&frame(GraphCmd::AddNode, &[TOGGLE_BOOLEAN_ID, 0]));
    tx.push_input(&frame(GraphCmd::AddNode, &[SERIAL_OUT_ID, 0]));
    tx.push_input(&frame(GraphCmd::ConnectNodes, &[1, 0, 2, 0]));
    tx.push_input(&frame(GraphCmd::SubscribeToPort, &[1, 0, 1]));
    tx.push_input(&frame(GraphCmd::StartNetwork, &[]));
    tx.push_input(&frame(GraphCmd::SendPacket, &[1, 0, 1, 1, 0, 0, 0]));
  }

  // The embedding main loop.
  for _ in 0..3 {
    controller.run_tick(&mut network);
    network.run_tick();
  }

  for reply in transport.borrow().output_frames() {
    let cmd = GraphCmd::try_from(reply[0])
      .map(|cmd| format!("{cmd:?}"))
      .unwrap_or_else(|raw| format!("raw {raw}"));
    println!("{cmd:<24} {:02x?}", &reply[1..]);
  }
}
