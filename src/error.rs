use thiserror::Error;

use crate::network::{NodeId, PortId};

/// Error type for graph mutation operations.
///
/// Every variant is also reported on the wire-visible debug plane at the
/// point of failure, so callers that discard the `Result` (the host protocol
/// path does) lose nothing observable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
  /// The node table has reached its configured capacity.
  #[error("node table full")]
  NodeTableFull,
  /// No node is registered under this id.
  #[error("unknown node {0}")]
  UnknownNode(NodeId),
  /// The port index exceeds the node's output fan-out table.
  #[error("port {port} out of range for node {node}")]
  PortOutOfRange { node: NodeId, port: PortId },
  /// The parent id does not name an existing subgraph node.
  #[error("invalid parent node {0}")]
  InvalidParent(NodeId),
  /// Subgraph boundary wiring addressed a node that is not a subgraph.
  #[error("node {0} is not a subgraph")]
  NotASubgraph(NodeId),
  /// The boundary port index exceeds the subgraph port capacity.
  #[error("subgraph port {0} out of range")]
  SubgraphPortOutOfRange(PortId),
  /// The message ring is full; the newest message was dropped.
  #[error("message queue full")]
  MessageQueueFull,
}
