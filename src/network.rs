//! # Network
//!
//! The graph runtime: a fixed-capacity node table, a fixed-capacity message
//! ring, a two-state lifecycle, and a notification plane that mirrors every
//! structural change and packet movement to an installed handler.
//!
//! ## Scheduling
//!
//! Delivery is breadth-first, FIFO, at-most-once within a tick. Each
//! [`Network::run_tick`] snapshots the number of pending messages and
//! delivers exactly that many; anything a component sends while processing
//! is appended behind the snapshot and deferred to the next tick. This keeps
//! execution deterministic under live graph mutation from the host protocol:
//! a cascade through N edges takes N ticks, in enqueue order, always.
//!
//! After the batch, every registered node receives one [`Packet::Tick`]
//! control packet, delivered directly rather than through the ring. The same
//! direct path delivers one [`Packet::Setup`] per node when the network
//! transitions to running.
//!
//! ## Capacity
//!
//! Both tables are sized once from [`NetworkConfig`] at construction and
//! never grow. A full node table fails `add_node` deterministically; a full
//! message ring drops the newest message. Both failures surface on the debug
//! plane.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::commands::{DebugId, DebugLevel};
use crate::component::{Component, ProcessContext};
use crate::error::GraphError;
use crate::io::IoHandle;
use crate::packet::Packet;
use crate::subgraph::SUBGRAPH_MAX_PORTS;

/// Node identifier, assigned monotonically from 1. 0 is reserved to mean
/// "no parent".
pub type NodeId = u8;

/// Index of an input or output slot on a node.
pub type PortId = u8;

/// Identifier of a component kind, shared with the host tool.
pub type ComponentId = u8;

/// Parent id of a top-level node.
pub const PARENT_NONE: NodeId = 0;

/// Upper bound on addressable ports per node; ports are `u8`-indexed.
pub const MAX_PORTS: usize = PortId::MAX as usize;

/// The id handed to the first registered node.
pub const FIRST_NODE_ID: NodeId = 1;

/// Default node table capacity.
pub const DEFAULT_MAX_NODES: usize = 50;

/// Default message ring capacity.
pub const DEFAULT_MAX_MESSAGES: usize = 50;

/// A (node, port) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
  pub node: NodeId,
  pub port: PortId,
}

/// Per-output-port fan-out record. Outputs are single-valued: connecting a
/// port overwrites the previous target. The `subscribed` flag enables
/// host-visible packet tracing on this edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Connection {
  pub target: Option<Endpoint>,
  pub subscribed: bool,
}

/// A pending delivery: target address, payload, and the sending endpoint
/// when the packet left a subscribed output port (informational, for
/// tracing only).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Message {
  pub target: Endpoint,
  pub packet: Packet,
  pub sender: Option<Endpoint>,
}

/// Fixed-capacity FIFO ring of pending messages.
///
/// Indices wrap modulo capacity; pushing into a full ring fails and hands
/// the message back, which the network reports as a dropped-newest overflow.
#[derive(Debug)]
pub struct MessageRing {
  slots: Vec<Option<Message>>,
  read: usize,
  write: usize,
  pending: usize,
}

impl MessageRing {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      slots: vec![None; capacity.max(1)],
      read: 0,
      write: 0,
      pending: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  pub fn len(&self) -> usize {
    self.pending
  }

  pub fn is_empty(&self) -> bool {
    self.pending == 0
  }

  pub fn is_full(&self) -> bool {
    self.pending == self.slots.len()
  }

  /// Index the next push will occupy.
  pub fn write_index(&self) -> usize {
    self.write
  }

  /// Index the next pop will come from.
  pub fn read_index(&self) -> usize {
    self.read
  }

  /// Appends a message, returning the slot index it occupies, or the
  /// message back when the ring is full.
  pub fn push(&mut self, message: Message) -> Result<usize, Message> {
    if self.is_full() {
      return Err(message);
    }
    let index = self.write;
    self.slots[index] = Some(message);
    self.write = (self.write + 1) % self.slots.len();
    self.pending += 1;
    Ok(index)
  }

  /// Removes the oldest message, returning it with the slot index it
  /// occupied.
  pub fn pop(&mut self) -> Option<(usize, Message)> {
    if self.is_empty() {
      return None;
    }
    let index = self.read;
    let message = self.slots[index].take()?;
    self.read = (self.read + 1) % self.slots.len();
    self.pending -= 1;
    Some((index, message))
  }

  /// Drops all pending messages and rewinds both indices to 0.
  pub fn clear(&mut self) {
    for slot in &mut self.slots {
      *slot = None;
    }
    self.read = 0;
    self.write = 0;
    self.pending = 0;
  }
}

/// Table capacities, applied once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
  /// Node table capacity. Ids are `u8`, so values above 255 are clamped.
  pub max_nodes: usize,
  /// Message ring capacity.
  pub max_messages: usize,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      max_nodes: DEFAULT_MAX_NODES,
      max_messages: DEFAULT_MAX_MESSAGES,
    }
  }
}

/// Network lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NetworkState {
  #[default]
  Stopped = 0,
  Running = 1,
}

/// Receiver of wire-visible debug events.
pub trait DebugHandler {
  fn emit_debug(&mut self, level: DebugLevel, id: DebugId);
  fn debug_changed(&mut self, level: DebugLevel);
}

/// Receiver of runtime events, installed via
/// [`Network::set_notification_handler`]. The host-protocol sink implements
/// this to mirror events back over the transport.
pub trait NotificationHandler: DebugHandler {
  /// A packet left a subscribed output port and was enqueued at `index`.
  fn packet_sent(&mut self, index: usize, message: &Message, sender: Option<Endpoint>);
  /// The message at `index` was delivered to its target.
  fn packet_delivered(&mut self, index: usize, message: &Message);
  fn node_added(&mut self, node: NodeId, component: ComponentId, parent: NodeId);
  fn nodes_connected(&mut self, source: Endpoint, target: Endpoint);
  fn network_state_changed(&mut self, state: NetworkState);
  fn subgraph_connected(&mut self, is_output: bool, subgraph: Endpoint, child: Endpoint);
  fn port_subscription_changed(&mut self, node: NodeId, port: PortId, enable: bool);
}

/// Read-only description of a registered node, for host introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
  pub id: NodeId,
  pub component: ComponentId,
  pub parent: NodeId,
}

struct NodeEntry {
  component: Box<dyn Component>,
  component_id: ComponentId,
  parent: NodeId,
  connections: Vec<Connection>,
}

/// The graph runtime. See the module documentation for the scheduling and
/// capacity model.
pub struct Network {
  nodes: Vec<NodeEntry>,
  max_nodes: usize,
  queue: MessageRing,
  state: NetworkState,
  debug_level: DebugLevel,
  handler: Option<Box<dyn NotificationHandler>>,
  io: IoHandle,
}

impl Network {
  /// A network with default capacities over the given I/O backend.
  pub fn new(io: IoHandle) -> Self {
    Self::with_config(io, NetworkConfig::default())
  }

  pub fn with_config(io: IoHandle, config: NetworkConfig) -> Self {
    let max_nodes = config.max_nodes.clamp(1, NodeId::MAX as usize);
    Self {
      nodes: Vec::with_capacity(max_nodes),
      max_nodes,
      queue: MessageRing::with_capacity(config.max_messages),
      state: NetworkState::Stopped,
      debug_level: DebugLevel::default(),
      handler: None,
      io,
    }
  }

  pub fn state(&self) -> NetworkState {
    self.state
  }

  pub fn debug_level(&self) -> DebugLevel {
    self.debug_level
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Pending messages in the ring.
  pub fn pending_messages(&self) -> usize {
    self.queue.len()
  }

  /// The ring's read and write indices, mostly useful to assert the
  /// post-`reset` state.
  pub fn queue_indices(&self) -> (usize, usize) {
    (self.queue.read_index(), self.queue.write_index())
  }

  pub fn node_info(&self, node: NodeId) -> Option<NodeInfo> {
    self.entry_index(node).map(|index| NodeInfo {
      id: node,
      component: self.nodes[index].component_id,
      parent: self.nodes[index].parent,
    })
  }

  pub fn nodes_info(&self) -> impl Iterator<Item = NodeInfo> + '_ {
    self.nodes.iter().enumerate().map(|(index, entry)| NodeInfo {
      id: (index + 1) as NodeId,
      component: entry.component_id,
      parent: entry.parent,
    })
  }

  /// Every configured edge, as (source endpoint, target endpoint) pairs.
  pub fn edges(&self) -> impl Iterator<Item = (Endpoint, Endpoint)> + '_ {
    self.nodes.iter().enumerate().flat_map(|(index, entry)| {
      let node = (index + 1) as NodeId;
      entry
        .connections
        .iter()
        .enumerate()
        .filter_map(move |(port, connection)| {
          connection
            .target
            .map(|target| (Endpoint { node, port: port as PortId }, target))
        })
    })
  }

  /// The fan-out record at (node, output port), if both exist.
  pub fn connection(&self, node: NodeId, port: PortId) -> Option<&Connection> {
    self
      .entry_index(node)
      .and_then(|index| self.nodes[index].connections.get(port as usize))
  }

  /// Drops the whole graph: node table and message ring emptied, indices
  /// rewound, state forced to stopped. The state-change notification is
  /// always emitted so the tool sees its reset confirmed.
  pub fn reset(&mut self) {
    debug!(nodes = self.nodes.len(), pending = self.queue.len(), "network reset");
    self.nodes.clear();
    self.queue.clear();
    self.state = NetworkState::Stopped;
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.network_state_changed(NetworkState::Stopped);
    }
  }

  /// Transitions to running and delivers one `Setup` control packet to each
  /// registered node, in ascending node id order, before returning. No-op
  /// when already running.
  pub fn start(&mut self) {
    if self.state == NetworkState::Running {
      return;
    }
    debug!(nodes = self.nodes.len(), "network starting");
    self.state = NetworkState::Running;
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.network_state_changed(NetworkState::Running);
    }
    for index in 0..self.nodes.len() {
      self.process_direct(index, Packet::Setup);
    }
  }

  /// Transitions to stopped, keeping the graph and any pending messages.
  /// No-op when already stopped.
  pub fn stop(&mut self) {
    if self.state == NetworkState::Stopped {
      return;
    }
    debug!("network stopping");
    self.state = NetworkState::Stopped;
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.network_state_changed(NetworkState::Stopped);
    }
  }

  /// Registers a node, assigning the next id. A non-zero `parent` must name
  /// an existing subgraph node.
  pub fn add_node(
    &mut self,
    component: Box<dyn Component>,
    parent: NodeId,
  ) -> Result<NodeId, GraphError> {
    if self.nodes.len() >= self.max_nodes {
      self.emit_debug(DebugLevel::Error, DebugId::NodeTableFull);
      return Err(GraphError::NodeTableFull);
    }
    if parent != PARENT_NONE {
      let parent_entry = match self.entry_index(parent) {
        Some(index) => &self.nodes[index],
        None => {
          self.emit_debug(DebugLevel::Error, DebugId::InvalidParent);
          return Err(GraphError::InvalidParent(parent));
        }
      };
      if parent_entry.component.as_subgraph().is_none() {
        self.emit_debug(DebugLevel::Error, DebugId::InvalidParent);
        return Err(GraphError::InvalidParent(parent));
      }
    }
    let id = (self.nodes.len() + 1) as NodeId;
    let component_id = component.component_id();
    let connections = vec![Connection::default(); component.output_ports()];
    self.nodes.push(NodeEntry {
      component,
      component_id,
      parent,
      connections,
    });
    trace!(node = id, component = component_id, parent, "node added");
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.node_added(id, component_id, parent);
    }
    Ok(id)
  }

  /// Records the edge (source, source_port) → (target, target_port),
  /// overwriting any previous target on that output port.
  pub fn connect(
    &mut self,
    source: NodeId,
    source_port: PortId,
    target: NodeId,
    target_port: PortId,
  ) -> Result<(), GraphError> {
    if self.entry_index(target).is_none() {
      self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
      return Err(GraphError::UnknownNode(target));
    }
    let source_index = match self.entry_index(source) {
      Some(index) => index,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
        return Err(GraphError::UnknownNode(source));
      }
    };
    let connection = match self.nodes[source_index]
      .connections
      .get_mut(source_port as usize)
    {
      Some(connection) => connection,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::PortOutOfRange);
        return Err(GraphError::PortOutOfRange { node: source, port: source_port });
      }
    };
    connection.target = Some(Endpoint { node: target, port: target_port });
    trace!(source, source_port, target, target_port, "nodes connected");
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.nodes_connected(
        Endpoint { node: source, port: source_port },
        Endpoint { node: target, port: target_port },
      );
    }
    Ok(())
  }

  /// Wires a subgraph boundary port.
  ///
  /// Input direction (`is_output == false`): packets arriving at the
  /// subgraph's external input `subgraph_port` are forwarded to
  /// (`child`, `child_port`). Output direction: the child's output
  /// `child_port` is rewired to target the subgraph node itself, which
  /// re-sends on its external output `subgraph_port`.
  pub fn connect_subgraph(
    &mut self,
    is_output: bool,
    subgraph: NodeId,
    subgraph_port: PortId,
    child: NodeId,
    child_port: PortId,
  ) -> Result<(), GraphError> {
    if (subgraph_port as usize) >= SUBGRAPH_MAX_PORTS {
      self.emit_debug(DebugLevel::Error, DebugId::SubgraphPortOutOfRange);
      return Err(GraphError::SubgraphPortOutOfRange(subgraph_port));
    }
    let child_index = match self.entry_index(child) {
      Some(index) => index,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
        return Err(GraphError::UnknownNode(child));
      }
    };
    let subgraph_index = match self.entry_index(subgraph) {
      Some(index) => index,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
        return Err(GraphError::UnknownNode(subgraph));
      }
    };

    if is_output {
      if self.nodes[subgraph_index].component.as_subgraph().is_none() {
        self.emit_debug(DebugLevel::Error, DebugId::NotASubgraph);
        return Err(GraphError::NotASubgraph(subgraph));
      }
      // The child sends to the subgraph's internal side of the boundary
      // output; the subgraph re-sends on its own fan-out table.
      let connection = match self.nodes[child_index]
        .connections
        .get_mut(child_port as usize)
      {
        Some(connection) => connection,
        None => {
          self.emit_debug(DebugLevel::Error, DebugId::PortOutOfRange);
          return Err(GraphError::PortOutOfRange { node: child, port: child_port });
        }
      };
      connection.target = Some(Endpoint {
        node: subgraph,
        port: SUBGRAPH_MAX_PORTS as PortId + subgraph_port,
      });
    } else {
      let entry = &mut self.nodes[subgraph_index];
      let boundary = match entry.component.as_subgraph_mut() {
        Some(boundary) => boundary,
        None => {
          self.emit_debug(DebugLevel::Error, DebugId::NotASubgraph);
          return Err(GraphError::NotASubgraph(subgraph));
        }
      };
      boundary.connect_inport(subgraph_port, Endpoint { node: child, port: child_port });
    }
    trace!(is_output, subgraph, subgraph_port, child, child_port, "subgraph connected");
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.subgraph_connected(
        is_output,
        Endpoint { node: subgraph, port: subgraph_port },
        Endpoint { node: child, port: child_port },
      );
    }
    Ok(())
  }

  /// Enqueues a packet for (target, port). Accepted in any lifecycle state;
  /// messages enqueued while stopped sit in the ring until the network runs.
  /// A full ring drops the message.
  pub fn send_message(
    &mut self,
    target: NodeId,
    port: PortId,
    packet: Packet,
  ) -> Result<(), GraphError> {
    if self.entry_index(target).is_none() {
      self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
      return Err(GraphError::UnknownNode(target));
    }
    let message = Message {
      target: Endpoint { node: target, port },
      packet,
      sender: None,
    };
    match self.queue.push(message) {
      Ok(index) => {
        trace!(target, port, index, "message enqueued");
        Ok(())
      }
      Err(_) => {
        warn!(target, port, "message ring full, dropping newest");
        self.emit_debug(DebugLevel::Error, DebugId::MessageQueueFull);
        Err(GraphError::MessageQueueFull)
      }
    }
  }

  /// Toggles host-visible packet tracing on (node, output port).
  pub fn subscribe_to_port(
    &mut self,
    node: NodeId,
    port: PortId,
    enable: bool,
  ) -> Result<(), GraphError> {
    let index = match self.entry_index(node) {
      Some(index) => index,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
        return Err(GraphError::UnknownNode(node));
      }
    };
    let connection = match self.nodes[index].connections.get_mut(port as usize) {
      Some(connection) => connection,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::PortOutOfRange);
        return Err(GraphError::PortOutOfRange { node, port });
      }
    };
    connection.subscribed = enable;
    trace!(node, port, enable, "port subscription changed");
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.port_subscription_changed(node, port, enable);
    }
    Ok(())
  }

  /// Installs the notification sink. Subsequent runtime events and debug
  /// events are mirrored to it.
  pub fn set_notification_handler(&mut self, handler: Box<dyn NotificationHandler>) {
    self.handler = Some(handler);
  }

  /// Sets the debug plane threshold and notifies the handler.
  pub fn set_debug_level(&mut self, level: DebugLevel) {
    self.debug_level = level;
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.debug_changed(level);
    }
  }

  /// Reports a debug event. Forwarded to the handler when one is installed
  /// and the event's level is within the current threshold.
  pub fn emit_debug(&mut self, level: DebugLevel, id: DebugId) {
    debug!(?level, ?id, "debug event");
    if level <= self.debug_level {
      if let Some(handler) = self.handler.as_deref_mut() {
        handler.emit_debug(level, id);
      }
    }
  }

  /// One scheduler tick: deliver the batch of messages that were pending
  /// when the tick started, then deliver one `Tick` control packet to every
  /// registered node. No-op while stopped.
  pub fn run_tick(&mut self) {
    if self.state != NetworkState::Running {
      return;
    }
    let batch = self.queue.len();
    for _ in 0..batch {
      let (index, message) = match self.queue.pop() {
        Some(entry) => entry,
        None => break,
      };
      self.deliver(index, message);
    }
    for index in 0..self.nodes.len() {
      self.process_direct(index, Packet::Tick);
    }
  }

  fn deliver(&mut self, index: usize, message: Message) {
    let node_index = match self.entry_index(message.target.node) {
      Some(node_index) => node_index,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::UnknownNode);
        return;
      }
    };
    self.process_packet(node_index, message.packet, message.target.port);
    if let Some(handler) = self.handler.as_deref_mut() {
      handler.packet_delivered(index, &message);
    }
  }

  /// Delivers a control packet straight to a node, bypassing the ring.
  fn process_direct(&mut self, node_index: usize, packet: Packet) {
    self.process_packet(node_index, packet, 0);
  }

  fn process_packet(&mut self, node_index: usize, packet: Packet, port: PortId) {
    let node = (node_index + 1) as NodeId;
    let entry = &mut self.nodes[node_index];
    let mut ctx = ProcessContext::new(
      node,
      &entry.connections,
      &mut self.queue,
      &mut self.handler,
      self.debug_level,
      &self.io,
    );
    entry.component.process(&mut ctx, packet, port);
  }

  /// Transient access to the I/O backend, for embedders that share it with
  /// the network.
  pub fn io(&self) -> IoHandle {
    Rc::clone(&self.io)
  }

  fn entry_index(&self, node: NodeId) -> Option<usize> {
    if node == PARENT_NONE {
      return None;
    }
    let index = (node - 1) as usize;
    (index < self.nodes.len()).then_some(index)
  }
}
