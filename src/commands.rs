//! # Wire Vocabulary
//!
//! The command enumeration, frame geometry, debug plane identifiers, and
//! packet payload codec shared by the host protocol parser and the
//! notification sink. The external tool carries a copy of this vocabulary;
//! both directions of the link speak fixed [`FRAME_SIZE`]-byte frames whose
//! first byte is a [`GraphCmd`] discriminant.
//!
//! Multi-byte numeric fields in payloads are little-endian.

use serde::{Deserialize, Serialize};

use crate::packet::Packet;

/// Fixed frame width: one command byte plus seven payload bytes.
pub const FRAME_SIZE: usize = 8;

/// Synchronization preamble sent by the tool before its first command.
///
/// The parser hunts for this sequence while unsynchronized; once it has been
/// seen in full, the stream is consumed as contiguous [`FRAME_SIZE`]-byte
/// frames with no further magic.
pub const GRAPH_MAGIC: [u8; 8] = *b"uWeave01";

/// Command byte shared by requests (tool to runtime) and responses (runtime
/// to tool). Requests occupy the low range, responses start at 40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GraphCmd {
  Invalid = 0,

  // Requests
  ResetNetwork = 10,
  StartNetwork = 11,
  StopNetwork = 12,
  AddNode = 13,
  ConnectNodes = 14,
  ConnectSubgraphPort = 15,
  SendPacket = 16,
  SubscribeToPort = 17,
  SetDebugLevel = 18,
  ListComponents = 19,
  ListNodes = 20,
  ListEdges = 21,

  // Responses
  CommunicationOpen = 40,
  NetworkStateChanged = 41,
  NodeAdded = 42,
  NodesConnected = 43,
  SubgraphConnected = 44,
  PacketSent = 45,
  PacketDelivered = 46,
  PortSubscriptionChanged = 47,
  DebugChanged = 48,
  DebugEvent = 49,
  ComponentInfo = 50,
  NodeInfo = 51,
  EdgeInfo = 52,
  EndOfList = 53,
}

impl TryFrom<u8> for GraphCmd {
  type Error = u8;

  fn try_from(value: u8) -> Result<Self, u8> {
    let cmd = match value {
      0 => GraphCmd::Invalid,
      10 => GraphCmd::ResetNetwork,
      11 => GraphCmd::StartNetwork,
      12 => GraphCmd::StopNetwork,
      13 => GraphCmd::AddNode,
      14 => GraphCmd::ConnectNodes,
      15 => GraphCmd::ConnectSubgraphPort,
      16 => GraphCmd::SendPacket,
      17 => GraphCmd::SubscribeToPort,
      18 => GraphCmd::SetDebugLevel,
      19 => GraphCmd::ListComponents,
      20 => GraphCmd::ListNodes,
      21 => GraphCmd::ListEdges,
      40 => GraphCmd::CommunicationOpen,
      41 => GraphCmd::NetworkStateChanged,
      42 => GraphCmd::NodeAdded,
      43 => GraphCmd::NodesConnected,
      44 => GraphCmd::SubgraphConnected,
      45 => GraphCmd::PacketSent,
      46 => GraphCmd::PacketDelivered,
      47 => GraphCmd::PortSubscriptionChanged,
      48 => GraphCmd::DebugChanged,
      49 => GraphCmd::DebugEvent,
      50 => GraphCmd::ComponentInfo,
      51 => GraphCmd::NodeInfo,
      52 => GraphCmd::EdgeInfo,
      53 => GraphCmd::EndOfList,
      other => return Err(other),
    };
    Ok(cmd)
  }
}

/// Severity threshold for the wire-visible debug plane.
///
/// Events at a level above the network's current threshold are suppressed;
/// the default threshold is [`DebugLevel::Error`], so only errors reach the
/// tool unless it raises the level.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum DebugLevel {
  #[default]
  Error = 0,
  Info = 1,
  Detailed = 2,
}

impl TryFrom<u8> for DebugLevel {
  type Error = u8;

  fn try_from(value: u8) -> Result<Self, u8> {
    match value {
      0 => Ok(DebugLevel::Error),
      1 => Ok(DebugLevel::Info),
      2 => Ok(DebugLevel::Detailed),
      other => Err(other),
    }
  }
}

/// Identifier of a debug event mirrored to the tool.
///
/// The runtime never aborts; every locally absorbed failure surfaces as one
/// of these on the debug plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DebugId {
  UnknownCommand = 1,
  UnknownComponent = 2,
  NodeTableFull = 3,
  UnknownNode = 4,
  PortOutOfRange = 5,
  SubgraphPortOutOfRange = 6,
  NotASubgraph = 7,
  MessageQueueFull = 8,
  IoOperationNotImplemented = 9,
  InvalidParent = 10,
  InvalidPacketKind = 11,
}

// Packet kind codes used in SendPacket / PacketSent / PacketDelivered
// payloads: kind byte followed by a 4-byte little-endian value slot.
const KIND_VOID: u8 = 0;
const KIND_BOOLEAN: u8 = 1;
const KIND_ASCII: u8 = 2;
const KIND_BYTE: u8 = 3;
const KIND_INTEGER: u8 = 4;
const KIND_FLOAT: u8 = 5;
const KIND_BRACKET_START: u8 = 6;
const KIND_BRACKET_END: u8 = 7;
const KIND_SETUP: u8 = 8;
const KIND_TICK: u8 = 9;
const KIND_INVALID: u8 = 255;

/// Encodes a packet into its wire form: kind byte plus a 4-byte
/// little-endian value slot. Integers are truncated to 32 bits on the wire;
/// variants without a payload leave the slot zeroed.
pub fn encode_packet(packet: &Packet) -> (u8, [u8; 4]) {
  match packet {
    Packet::Void => (KIND_VOID, [0; 4]),
    Packet::Boolean(value) => (KIND_BOOLEAN, [*value as u8, 0, 0, 0]),
    Packet::Ascii(value) => (KIND_ASCII, [*value, 0, 0, 0]),
    Packet::Byte(value) => (KIND_BYTE, [*value, 0, 0, 0]),
    Packet::Integer(value) => (KIND_INTEGER, (*value as i32).to_le_bytes()),
    Packet::Float(value) => (KIND_FLOAT, value.to_le_bytes()),
    Packet::BracketStart => (KIND_BRACKET_START, [0; 4]),
    Packet::BracketEnd => (KIND_BRACKET_END, [0; 4]),
    Packet::Setup => (KIND_SETUP, [0; 4]),
    Packet::Tick => (KIND_TICK, [0; 4]),
    Packet::Invalid => (KIND_INVALID, [0; 4]),
  }
}

/// Decodes a wire packet. Unknown kind bytes yield [`Packet::Invalid`];
/// the 32-bit integer slot is sign-extended.
pub fn decode_packet(kind: u8, value: [u8; 4]) -> Packet {
  match kind {
    KIND_VOID => Packet::Void,
    KIND_BOOLEAN => Packet::Boolean(value[0] != 0),
    KIND_ASCII => Packet::Ascii(value[0]),
    KIND_BYTE => Packet::Byte(value[0]),
    KIND_INTEGER => Packet::Integer(i32::from_le_bytes(value) as i64),
    KIND_FLOAT => Packet::Float(f32::from_le_bytes(value)),
    KIND_BRACKET_START => Packet::BracketStart,
    KIND_BRACKET_END => Packet::BracketEnd,
    KIND_SETUP => Packet::Setup,
    KIND_TICK => Packet::Tick,
    _ => Packet::Invalid,
  }
}
