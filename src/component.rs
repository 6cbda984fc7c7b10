//! # Component Capability
//!
//! A component is a pure computation responding to packets. The network
//! stores components as trait objects and hands each `process` call a
//! [`ProcessContext`]: the component's only window into the runtime, valid
//! for the duration of that call. Through it a component can send on its
//! output ports, address another node directly, reach the I/O backend, and
//! report debug events.
//!
//! Fan-out tables live in the network's node table rather than inside the
//! component, so sending needs no back-pointer: the context carries a view
//! of the calling node's own connections alongside the message ring.
//!
//! `process` must run to completion. There is no way to suspend, and no
//! component ever blocks on another.

use std::cell::RefMut;

use tracing::{trace, warn};

use crate::commands::{DebugId, DebugLevel};
use crate::io::{Io, IoError, IoHandle};
use crate::network::{
  ComponentId, Connection, Endpoint, Message, MessageRing, NodeId, NotificationHandler, PortId,
};
use crate::packet::Packet;
use crate::subgraph::SubGraph;

/// The capability every node satisfies.
pub trait Component {
  /// Handles one packet arriving on `port`. Control packets (`Setup`,
  /// `Tick`) arrive here too; most components only act on
  /// [`Packet::is_data`] packets.
  fn process(&mut self, ctx: &mut ProcessContext<'_>, packet: Packet, port: PortId);

  /// The component kind id this instance was created from, shared with the
  /// host tool.
  fn component_id(&self) -> ComponentId;

  /// Number of output ports, used to size the node's fan-out table at
  /// registration.
  fn output_ports(&self) -> usize {
    1
  }

  /// Boundary-wiring downcast; only the subgraph component overrides this.
  fn as_subgraph(&self) -> Option<&SubGraph> {
    None
  }

  fn as_subgraph_mut(&mut self) -> Option<&mut SubGraph> {
    None
  }
}

/// A component's view of the network during one `process` call.
pub struct ProcessContext<'a> {
  node: NodeId,
  connections: &'a [Connection],
  queue: &'a mut MessageRing,
  handler: &'a mut Option<Box<dyn NotificationHandler>>,
  debug_level: DebugLevel,
  io: &'a IoHandle,
}

impl<'a> ProcessContext<'a> {
  pub(crate) fn new(
    node: NodeId,
    connections: &'a [Connection],
    queue: &'a mut MessageRing,
    handler: &'a mut Option<Box<dyn NotificationHandler>>,
    debug_level: DebugLevel,
    io: &'a IoHandle,
  ) -> Self {
    Self {
      node,
      connections,
      queue,
      handler,
      debug_level,
      io,
    }
  }

  /// The id of the node currently processing.
  pub fn node_id(&self) -> NodeId {
    self.node
  }

  /// Sends on output port 0.
  pub fn send(&mut self, packet: Packet) {
    self.send_to(packet, 0);
  }

  /// Sends through the node's fan-out entry for `port`. Nothing happens on
  /// an unconnected port; an out-of-range port is a debug event. When the
  /// edge is subscribed, the enqueue is mirrored to the notification
  /// handler with this node's identity attached.
  pub fn send_to(&mut self, packet: Packet, port: PortId) {
    let connection = match self.connections.get(port as usize) {
      Some(connection) => *connection,
      None => {
        self.emit_debug(DebugLevel::Error, DebugId::PortOutOfRange);
        return;
      }
    };
    let target = match connection.target {
      Some(target) => target,
      None => {
        trace!(node = self.node, port, "send on unconnected port");
        return;
      }
    };
    let sender = Endpoint { node: self.node, port };
    let message = Message {
      target,
      packet,
      sender: Some(sender),
    };
    match self.queue.push(message) {
      Ok(index) => {
        if connection.subscribed {
          if let Some(handler) = self.handler.as_deref_mut() {
            handler.packet_sent(index, &message, Some(sender));
          }
        }
      }
      Err(_) => {
        warn!(node = self.node, port, "message ring full, dropping newest");
        self.emit_debug(DebugLevel::Error, DebugId::MessageQueueFull);
      }
    }
  }

  /// Enqueues a packet for an arbitrary endpoint, bypassing the fan-out
  /// table. Used by the subgraph boundary to forward into its children.
  pub fn forward(&mut self, target: Endpoint, packet: Packet) {
    let message = Message {
      target,
      packet,
      sender: None,
    };
    if self.queue.push(message).is_err() {
      warn!(node = self.node, ?target, "message ring full, dropping newest");
      self.emit_debug(DebugLevel::Error, DebugId::MessageQueueFull);
    }
  }

  /// Transient borrow of the I/O backend. Release it before calling
  /// [`ProcessContext::send`]; a delivery notification may write to a
  /// serial transport that shares the backend.
  pub fn io(&self) -> RefMut<'_, dyn Io> {
    self.io.borrow_mut()
  }

  /// Runs an I/O operation, absorbing failure into the debug plane: an
  /// `Err` becomes a [`DebugId::IoOperationNotImplemented`] event and the
  /// defined zero value.
  pub fn io_op<R: Default>(
    &mut self,
    operation: impl FnOnce(&mut dyn Io) -> Result<R, IoError>,
  ) -> R {
    let result = operation(&mut *self.io.borrow_mut());
    match result {
      Ok(value) => value,
      Err(error) => {
        warn!(node = self.node, %error, "io operation failed");
        self.emit_debug(DebugLevel::Error, DebugId::IoOperationNotImplemented);
        R::default()
      }
    }
  }

  /// Reports a debug event through the network's debug plane.
  pub fn emit_debug(&mut self, level: DebugLevel, id: DebugId) {
    if level <= self.debug_level {
      if let Some(handler) = self.handler.as_deref_mut() {
        handler.emit_debug(level, id);
      }
    }
  }
}
