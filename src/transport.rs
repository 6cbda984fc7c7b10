//! # Host Transport
//!
//! The byte-stream contract between the runtime and the external tool. The
//! protocol assumes a reliable, in-order stream; framing above it is the
//! host protocol's 8-byte command frames, and there are no checksums or
//! retransmits at this layer.
//!
//! The transport handle is shared between the [`crate::host::HostController`]
//! (which drains received bytes) and the [`crate::host::HostSink`] (which
//! writes reply frames from inside network notifications).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::warn;

use crate::commands::FRAME_SIZE;
use crate::io::IoHandle;

/// A reliable, in-order byte stream to the host tool.
pub trait HostTransport {
  /// Opens the underlying device. Called once before the main loop.
  fn begin(&mut self) {}

  /// The next received byte, or `None` when nothing is pending.
  fn read_byte(&mut self) -> Option<u8>;

  /// Queues one byte toward the tool.
  fn send_byte(&mut self, byte: u8);
}

/// Shared handle to the transport.
pub type TransportHandle = Rc<RefCell<dyn HostTransport>>;

/// Transport over a serial device reached through the injected I/O backend.
pub struct SerialHostTransport {
  io: IoHandle,
  device: u8,
  baud: u32,
}

impl SerialHostTransport {
  pub fn new(io: IoHandle, device: u8, baud: u32) -> Self {
    Self { io, device, baud }
  }
}

impl HostTransport for SerialHostTransport {
  fn begin(&mut self) {
    if let Err(error) = self.io.borrow_mut().serial_begin(self.device, self.baud) {
      warn!(device = self.device, %error, "serial transport unavailable");
    }
  }

  fn read_byte(&mut self) -> Option<u8> {
    let mut io = self.io.borrow_mut();
    let available = io.serial_data_available(self.device).unwrap_or(0);
    if available == 0 {
      return None;
    }
    io.serial_read(self.device).ok()
  }

  fn send_byte(&mut self, byte: u8) {
    if self.io.borrow_mut().serial_write(self.device, byte).is_err() {
      warn!(device = self.device, "serial write failed, reply byte dropped");
    }
  }
}

/// Transport that discards everything, for networks running without a host.
#[derive(Debug, Default)]
pub struct NullHostTransport;

impl HostTransport for NullHostTransport {
  fn read_byte(&mut self) -> Option<u8> {
    None
  }

  fn send_byte(&mut self, _byte: u8) {}
}

/// In-memory transport for tests and host-side simulation: received bytes
/// are scripted, sent bytes are recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
  rx: VecDeque<u8>,
  tx: Vec<u8>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queues bytes as if they arrived from the tool.
  pub fn push_input(&mut self, bytes: &[u8]) {
    self.rx.extend(bytes);
  }

  /// Every byte sent toward the tool so far.
  pub fn output(&self) -> &[u8] {
    &self.tx
  }

  /// The sent bytes chunked into reply frames. Bytes beyond the last whole
  /// frame (there should be none) are ignored.
  pub fn output_frames(&self) -> Vec<[u8; FRAME_SIZE]> {
    self
      .tx
      .chunks_exact(FRAME_SIZE)
      .map(|chunk| {
        let mut frame = [0u8; FRAME_SIZE];
        frame.copy_from_slice(chunk);
        frame
      })
      .collect()
  }

  /// Clears the record of sent bytes.
  pub fn clear_output(&mut self) {
    self.tx.clear();
  }
}

impl HostTransport for MockTransport {
  fn read_byte(&mut self) -> Option<u8> {
    self.rx.pop_front()
  }

  fn send_byte(&mut self, byte: u8) {
    self.tx.push(byte);
  }
}
