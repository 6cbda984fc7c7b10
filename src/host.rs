//! # Host Protocol
//!
//! The byte-level link between the runtime and an external tool. Two halves
//! share one transport:
//!
//! - [`HostController`] parses the inbound stream. It hunts for the
//!   [`crate::commands::GRAPH_MAGIC`] preamble, then consumes contiguous
//!   8-byte command frames and applies them to the network. Node
//!   instantiation goes through an injected [`ComponentLibrary`].
//! - [`HostSink`] is the [`NotificationHandler`] installed into the network;
//!   it encodes every runtime event as one 8-byte reply frame, zero-padded,
//!   pushed byte-by-byte through the transport.
//!
//! The parser only frames; it performs no semantic validation beyond looking
//! the command byte up. Unknown commands and components become debug events
//! and the stream stays synchronized.

use tracing::{trace, warn};

use crate::commands::{
  decode_packet, encode_packet, DebugId, DebugLevel, GraphCmd, FRAME_SIZE, GRAPH_MAGIC,
};
use crate::component::Component;
use crate::network::{
  ComponentId, DebugHandler, Endpoint, Message, Network, NetworkState, NodeId,
  NotificationHandler, PortId,
};
use crate::transport::TransportHandle;

/// Factory contract for the component library: maps component kind ids to
/// fresh instances for the host `AddNode` command.
pub trait ComponentLibrary {
  fn create(&self, id: ComponentId) -> Option<Box<dyn Component>>;

  /// The ids this library can instantiate, for the list-components reply.
  fn ids(&self) -> Vec<ComponentId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
  LookForHeader,
  ParseHeader,
  ParseCmd,
}

/// Byte-driven command parser. Feed it the inbound stream (usually via
/// [`HostController::run_tick`]); it applies framed commands to the network
/// passed per call.
pub struct HostController {
  transport: TransportHandle,
  library: Box<dyn ComponentLibrary>,
  state: ParserState,
  buffer: [u8; FRAME_SIZE],
  cursor: usize,
}

impl HostController {
  pub fn new(transport: TransportHandle, library: Box<dyn ComponentLibrary>) -> Self {
    Self {
      transport,
      library,
      state: ParserState::LookForHeader,
      buffer: [0; FRAME_SIZE],
      cursor: 0,
    }
  }

  /// Drains every pending byte from the transport into the parser.
  pub fn run_tick(&mut self, network: &mut Network) {
    loop {
      let byte = self.transport.borrow_mut().read_byte();
      match byte {
        Some(byte) => self.parse_byte(network, byte),
        None => break,
      }
    }
  }

  /// Advances the state machine by one byte.
  pub fn parse_byte(&mut self, network: &mut Network, byte: u8) {
    match self.state {
      ParserState::LookForHeader => {
        if byte == GRAPH_MAGIC[0] {
          self.cursor = 1;
          self.state = ParserState::ParseHeader;
        }
      }
      ParserState::ParseHeader => {
        if byte == GRAPH_MAGIC[self.cursor] {
          self.cursor += 1;
          if self.cursor == GRAPH_MAGIC.len() {
            trace!("host link synchronized");
            self.state = ParserState::ParseCmd;
            self.cursor = 0;
            self.reply(GraphCmd::CommunicationOpen, &[]);
          }
        } else if byte == GRAPH_MAGIC[0] {
          // The failed byte may itself start the preamble.
          self.cursor = 1;
        } else {
          self.state = ParserState::LookForHeader;
          self.cursor = 0;
        }
      }
      ParserState::ParseCmd => {
        self.buffer[self.cursor] = byte;
        self.cursor += 1;
        if self.cursor == FRAME_SIZE {
          self.cursor = 0;
          self.dispatch(network);
        }
      }
    }
  }

  fn dispatch(&mut self, network: &mut Network) {
    let frame = self.buffer;
    let cmd = match GraphCmd::try_from(frame[0]) {
      Ok(cmd) => cmd,
      Err(raw) => {
        warn!(raw, "unknown command byte");
        network.emit_debug(DebugLevel::Error, DebugId::UnknownCommand);
        return;
      }
    };
    trace!(?cmd, "dispatching host command");
    match cmd {
      GraphCmd::ResetNetwork => network.reset(),
      GraphCmd::StartNetwork => network.start(),
      GraphCmd::StopNetwork => network.stop(),
      GraphCmd::AddNode => {
        let component_id = frame[1];
        let parent = frame[2];
        match self.library.create(component_id) {
          Some(component) => {
            let _ = network.add_node(component, parent);
          }
          None => {
            warn!(component_id, "unknown component in AddNode");
            network.emit_debug(DebugLevel::Error, DebugId::UnknownComponent);
          }
        }
      }
      GraphCmd::ConnectNodes => {
        let _ = network.connect(frame[1], frame[2], frame[3], frame[4]);
      }
      GraphCmd::ConnectSubgraphPort => {
        let _ = network.connect_subgraph(frame[1] != 0, frame[2], frame[3], frame[4], frame[5]);
      }
      GraphCmd::SendPacket => {
        let packet = decode_packet(frame[3], [frame[4], frame[5], frame[6], frame[7]]);
        if packet.is_valid() {
          let _ = network.send_message(frame[1], frame[2], packet);
        } else {
          network.emit_debug(DebugLevel::Error, DebugId::InvalidPacketKind);
        }
      }
      GraphCmd::SubscribeToPort => {
        let _ = network.subscribe_to_port(frame[1], frame[2], frame[3] != 0);
      }
      GraphCmd::SetDebugLevel => match DebugLevel::try_from(frame[1]) {
        Ok(level) => network.set_debug_level(level),
        Err(_) => network.emit_debug(DebugLevel::Error, DebugId::UnknownCommand),
      },
      GraphCmd::ListComponents => {
        for id in self.library.ids() {
          self.reply(GraphCmd::ComponentInfo, &[id]);
        }
        self.reply(GraphCmd::EndOfList, &[GraphCmd::ListComponents as u8]);
      }
      GraphCmd::ListNodes => {
        for info in network.nodes_info() {
          self.reply(GraphCmd::NodeInfo, &[info.id, info.component, info.parent]);
        }
        self.reply(GraphCmd::EndOfList, &[GraphCmd::ListNodes as u8]);
      }
      GraphCmd::ListEdges => {
        for (source, target) in network.edges() {
          self.reply(
            GraphCmd::EdgeInfo,
            &[source.node, source.port, target.node, target.port],
          );
        }
        self.reply(GraphCmd::EndOfList, &[GraphCmd::ListEdges as u8]);
      }
      // Response commands arriving from the tool are a framing error on its
      // side; consume the frame and say so.
      _ => network.emit_debug(DebugLevel::Error, DebugId::UnknownCommand),
    }
  }

  fn reply(&self, cmd: GraphCmd, args: &[u8]) {
    write_frame(&self.transport, cmd, args);
  }
}

/// Writes one reply frame: command byte, arguments, zero padding up to
/// [`FRAME_SIZE`]. Arguments beyond the payload width are truncated.
fn write_frame(transport: &TransportHandle, cmd: GraphCmd, args: &[u8]) {
  let mut transport = transport.borrow_mut();
  transport.send_byte(cmd as u8);
  let payload = &args[..args.len().min(FRAME_SIZE - 1)];
  for &byte in payload {
    transport.send_byte(byte);
  }
  for _ in payload.len()..FRAME_SIZE - 1 {
    transport.send_byte(0);
  }
}

/// Mirrors runtime events onto the transport as reply frames. Install into
/// the network with [`Network::set_notification_handler`].
pub struct HostSink {
  transport: TransportHandle,
}

impl HostSink {
  pub fn new(transport: TransportHandle) -> Self {
    Self { transport }
  }

  fn frame(&mut self, cmd: GraphCmd, args: &[u8]) {
    write_frame(&self.transport, cmd, args);
  }
}

impl DebugHandler for HostSink {
  fn emit_debug(&mut self, level: DebugLevel, id: DebugId) {
    self.frame(GraphCmd::DebugEvent, &[level as u8, id as u8]);
  }

  fn debug_changed(&mut self, level: DebugLevel) {
    self.frame(GraphCmd::DebugChanged, &[level as u8]);
  }
}

impl NotificationHandler for HostSink {
  fn packet_sent(&mut self, _index: usize, message: &Message, sender: Option<Endpoint>) {
    let from = sender.unwrap_or(Endpoint { node: 0, port: 0 });
    let (kind, value) = encode_packet(&message.packet);
    self.frame(
      GraphCmd::PacketSent,
      &[from.node, from.port, kind, value[0], value[1], value[2], value[3]],
    );
  }

  fn packet_delivered(&mut self, _index: usize, message: &Message) {
    let (kind, value) = encode_packet(&message.packet);
    self.frame(
      GraphCmd::PacketDelivered,
      &[
        message.target.node,
        message.target.port,
        kind,
        value[0],
        value[1],
        value[2],
        value[3],
      ],
    );
  }

  fn node_added(&mut self, node: NodeId, component: ComponentId, parent: NodeId) {
    self.frame(GraphCmd::NodeAdded, &[node, component, parent]);
  }

  fn nodes_connected(&mut self, source: Endpoint, target: Endpoint) {
    self.frame(
      GraphCmd::NodesConnected,
      &[source.node, source.port, target.node, target.port],
    );
  }

  fn network_state_changed(&mut self, state: NetworkState) {
    self.frame(GraphCmd::NetworkStateChanged, &[state as u8]);
  }

  fn subgraph_connected(&mut self, is_output: bool, subgraph: Endpoint, child: Endpoint) {
    self.frame(
      GraphCmd::SubgraphConnected,
      &[
        is_output as u8,
        subgraph.node,
        subgraph.port,
        child.node,
        child.port,
      ],
    );
  }

  fn port_subscription_changed(&mut self, node: NodeId, port: PortId, enable: bool) {
    self.frame(GraphCmd::PortSubscriptionChanged, &[node, port, enable as u8]);
  }
}
