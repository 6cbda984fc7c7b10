//! # Packet
//!
//! The tagged value exchanged across ports. A packet is plain data: copyable,
//! no hidden ownership, cheap to move through the message ring.
//!
//! Two packets are control packets delivered by the runtime itself rather
//! than by components: [`Packet::Setup`] (once, when the network starts) and
//! [`Packet::Tick`] (once per scheduler tick). Everything else is data.
//! Brackets group sub-streams and carry no payload.
//!
//! Accessors never panic: on a variant mismatch they return the defined zero
//! value, except that the two numeric variants coerce into each other.

use serde::{Deserialize, Serialize};

/// A typed value carried along a graph edge.
///
/// Equality compares the variant tag and then the payload; the two numeric
/// variants do not compare equal to each other. Float comparison follows
/// IEEE `==`, so the result of comparing `NaN` payloads is unspecified
/// beyond what IEEE gives you.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Packet {
  /// No value. The default packet.
  #[default]
  Void,
  /// A boolean value.
  Boolean(bool),
  /// A single ASCII character, stored as its byte value.
  Ascii(u8),
  /// An unsigned byte.
  Byte(u8),
  /// A signed integer.
  Integer(i64),
  /// A 32-bit float.
  Float(f32),
  /// Opens a grouped sub-stream.
  BracketStart,
  /// Closes a grouped sub-stream.
  BracketEnd,
  /// Control packet: delivered once to each node when the network starts.
  Setup,
  /// Control packet: delivered once to each node per scheduler tick.
  Tick,
  /// Sentinel for a value that could not be decoded.
  Invalid,
}

impl Packet {
  /// True for every variant except [`Packet::Invalid`].
  pub fn is_valid(&self) -> bool {
    !matches!(self, Packet::Invalid)
  }

  pub fn is_void(&self) -> bool {
    matches!(self, Packet::Void)
  }

  pub fn is_bool(&self) -> bool {
    matches!(self, Packet::Boolean(_))
  }

  pub fn is_ascii(&self) -> bool {
    matches!(self, Packet::Ascii(_))
  }

  pub fn is_byte(&self) -> bool {
    matches!(self, Packet::Byte(_))
  }

  pub fn is_integer(&self) -> bool {
    matches!(self, Packet::Integer(_))
  }

  pub fn is_float(&self) -> bool {
    matches!(self, Packet::Float(_))
  }

  pub fn is_start_bracket(&self) -> bool {
    matches!(self, Packet::BracketStart)
  }

  pub fn is_end_bracket(&self) -> bool {
    matches!(self, Packet::BracketEnd)
  }

  pub fn is_setup(&self) -> bool {
    matches!(self, Packet::Setup)
  }

  pub fn is_tick(&self) -> bool {
    matches!(self, Packet::Tick)
  }

  /// True for the runtime's control packets (`Setup` and `Tick`).
  pub fn is_special(&self) -> bool {
    self.is_setup() || self.is_tick()
  }

  /// True for valid packets that are not control packets.
  pub fn is_data(&self) -> bool {
    self.is_valid() && !self.is_special()
  }

  pub fn is_number(&self) -> bool {
    self.is_integer() || self.is_float()
  }

  /// The boolean payload, or `false` on any other variant.
  pub fn as_bool(&self) -> bool {
    match self {
      Packet::Boolean(value) => *value,
      _ => false,
    }
  }

  /// The byte payload, or `0` on any other variant.
  pub fn as_byte(&self) -> u8 {
    match self {
      Packet::Byte(value) => *value,
      _ => 0,
    }
  }

  /// The ASCII payload, or `0` (NUL) on any other variant.
  pub fn as_ascii(&self) -> u8 {
    match self {
      Packet::Ascii(value) => *value,
      _ => 0,
    }
  }

  /// The integer payload. Floats are truncated toward zero; every
  /// non-numeric variant yields `0`.
  pub fn as_integer(&self) -> i64 {
    match self {
      Packet::Integer(value) => *value,
      Packet::Float(value) => *value as i64,
      _ => 0,
    }
  }

  /// The float payload. Integers are converted; every non-numeric variant
  /// yields `0.0`.
  pub fn as_float(&self) -> f32 {
    match self {
      Packet::Float(value) => *value,
      Packet::Integer(value) => *value as f32,
      _ => 0.0,
    }
  }
}

impl From<bool> for Packet {
  fn from(value: bool) -> Self {
    Packet::Boolean(value)
  }
}

impl From<u8> for Packet {
  fn from(value: u8) -> Self {
    Packet::Byte(value)
  }
}

impl From<i64> for Packet {
  fn from(value: i64) -> Self {
    Packet::Integer(value)
  }
}

impl From<f32> for Packet {
  fn from(value: f32) -> Self {
    Packet::Float(value)
  }
}
