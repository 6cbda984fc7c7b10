//! # I/O Interface
//!
//! The abstract hardware interface behind which all side effects happen.
//! Components never touch pins, serial devices, or timers directly; they go
//! through an [`Io`] implementation injected into the network. This keeps
//! component logic portable across MCU families and lets tests inject mocks.
//!
//! Every operation has a default body returning [`IoError::Unsupported`], so
//! a backend implements only what its hardware actually has. The
//! [`crate::component::ProcessContext::io_op`] helper converts an unsupported
//! operation into a wire-visible debug event and the defined zero value,
//! which is the contract components rely on.
//!
//! ## Interrupt safety
//!
//! Callbacks installed via [`Io::attach_external_interrupt`] may fire at
//! arbitrary moments on real hardware. They must not call into the network;
//! the supported pattern is to flip a flag or record a timestamp that a
//! component reads during its next `process`. Memory shared between an
//! interrupt and the main loop is the backend's responsibility.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use thiserror::Error;

/// Hardware pin identifier.
pub type PinId = u8;

/// Shared handle to the injected I/O backend.
///
/// The runtime is single-threaded and cooperative; the handle is shared
/// between the network and the serial transport the same way the firmware
/// shares one backend instance. Borrow it transiently; holding a borrow
/// across a `send` can collide with the notification sink writing to serial.
pub type IoHandle = Rc<RefCell<dyn Io>>;

/// Error type for backend capability gaps and bad arguments.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
  /// The backend does not implement this operation.
  #[error("io operation not implemented: {0}")]
  Unsupported(&'static str),
  /// The operation was refused, e.g. an out-of-range duty cycle.
  #[error("bad io argument: {0}")]
  BadArgument(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
  Input,
  Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullupMode {
  None,
  Up,
}

/// Trigger condition for an external interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptMode {
  OnLow,
  OnHigh,
  OnChange,
  OnRisingEdge,
  OnFallingEdge,
}

/// Callback installed for an external interrupt. Installed once at setup
/// time; must only flip flags read by components on their next `process`.
pub type InterruptCallback = Box<dyn FnMut()>;

/// Abstract hardware operations: serial, pins, analog, PWM, timers, and
/// external interrupts.
///
/// The mapping from pin numbers to interrupt numbers is the caller's
/// responsibility, as it differs per MCU family.
pub trait Io {
  // Serial
  fn serial_begin(&mut self, device: u8, baud: u32) -> Result<(), IoError> {
    let _ = (device, baud);
    Err(IoError::Unsupported("serial_begin"))
  }

  fn serial_data_available(&mut self, device: u8) -> Result<usize, IoError> {
    let _ = device;
    Err(IoError::Unsupported("serial_data_available"))
  }

  fn serial_read(&mut self, device: u8) -> Result<u8, IoError> {
    let _ = device;
    Err(IoError::Unsupported("serial_read"))
  }

  fn serial_write(&mut self, device: u8, byte: u8) -> Result<(), IoError> {
    let _ = (device, byte);
    Err(IoError::Unsupported("serial_write"))
  }

  // Pin configuration
  fn pin_set_mode(&mut self, pin: PinId, mode: PinMode) -> Result<(), IoError> {
    let _ = (pin, mode);
    Err(IoError::Unsupported("pin_set_mode"))
  }

  fn pin_set_pullup(&mut self, pin: PinId, mode: PullupMode) -> Result<(), IoError> {
    let _ = (pin, mode);
    Err(IoError::Unsupported("pin_set_pullup"))
  }

  fn spi_set_mode(&mut self) -> Result<(), IoError> {
    Err(IoError::Unsupported("spi_set_mode"))
  }

  // Digital
  fn digital_write(&mut self, pin: PinId, value: bool) -> Result<(), IoError> {
    let _ = (pin, value);
    Err(IoError::Unsupported("digital_write"))
  }

  fn digital_read(&mut self, pin: PinId) -> Result<bool, IoError> {
    let _ = pin;
    Err(IoError::Unsupported("digital_read"))
  }

  // Analog, values in [0, 1023]
  fn analog_read(&mut self, pin: PinId) -> Result<i64, IoError> {
    let _ = pin;
    Err(IoError::Unsupported("analog_read"))
  }

  // PWM, duty cycle in [0, 100]
  fn pwm_write(&mut self, pin: PinId, duty_percent: u8) -> Result<(), IoError> {
    let _ = (pin, duty_percent);
    Err(IoError::Unsupported("pwm_write"))
  }

  // Timers
  fn timer_current_ms(&mut self) -> Result<i64, IoError> {
    Err(IoError::Unsupported("timer_current_ms"))
  }

  fn timer_current_micros(&mut self) -> Result<i64, IoError> {
    Ok(self.timer_current_ms()? * 1000)
  }

  // Interrupts
  fn attach_external_interrupt(
    &mut self,
    interrupt: u8,
    mode: InterruptMode,
    callback: InterruptCallback,
  ) -> Result<(), IoError> {
    let _ = (interrupt, mode, callback);
    Err(IoError::Unsupported("attach_external_interrupt"))
  }
}

/// Backend with no capabilities at all, for graphs that are pure logic.
#[derive(Debug, Default)]
pub struct NullIo;

impl Io for NullIo {}

/// In-memory backend for tests and host-side simulation.
///
/// Reads are scripted, writes are recorded, and the clock is advanced
/// manually. Serial devices are independent byte queues.
#[derive(Default)]
pub struct MockIo {
  now_ms: i64,
  pin_modes: HashMap<PinId, PinMode>,
  pullups: HashMap<PinId, PullupMode>,
  digital_in: HashMap<PinId, bool>,
  analog_in: HashMap<PinId, i64>,
  digital_out: Vec<(PinId, bool)>,
  pwm_out: Vec<(PinId, u8)>,
  serial_rx: HashMap<u8, VecDeque<u8>>,
  serial_tx: HashMap<u8, Vec<u8>>,
  serial_baud: HashMap<u8, u32>,
  interrupts: HashMap<u8, (InterruptMode, InterruptCallback)>,
}

impl MockIo {
  pub fn new() -> Self {
    Self::default()
  }

  /// Scripts the level read by subsequent `digital_read` calls on `pin`.
  pub fn set_digital_in(&mut self, pin: PinId, value: bool) {
    self.digital_in.insert(pin, value);
  }

  /// Scripts the value read by subsequent `analog_read` calls on `pin`.
  pub fn set_analog_in(&mut self, pin: PinId, value: i64) {
    self.analog_in.insert(pin, value);
  }

  /// Queues bytes to be returned by `serial_read` on `device`.
  pub fn push_serial_input(&mut self, device: u8, bytes: &[u8]) {
    self.serial_rx.entry(device).or_default().extend(bytes);
  }

  /// Everything written to `device` so far.
  pub fn serial_output(&self, device: u8) -> &[u8] {
    self.serial_tx.get(&device).map(Vec::as_slice).unwrap_or(&[])
  }

  /// The log of `digital_write` calls, in order.
  pub fn digital_writes(&self) -> &[(PinId, bool)] {
    &self.digital_out
  }

  /// The log of `pwm_write` calls, in order.
  pub fn pwm_writes(&self) -> &[(PinId, u8)] {
    &self.pwm_out
  }

  /// The mode last configured for `pin`, if any.
  pub fn pin_mode(&self, pin: PinId) -> Option<PinMode> {
    self.pin_modes.get(&pin).copied()
  }

  /// The pullup last configured for `pin`, if any.
  pub fn pullup(&self, pin: PinId) -> Option<PullupMode> {
    self.pullups.get(&pin).copied()
  }

  /// The baud rate `serial_begin` was called with for `device`, if any.
  pub fn serial_baud(&self, device: u8) -> Option<u32> {
    self.serial_baud.get(&device).copied()
  }

  /// Advances the mock clock.
  pub fn advance_ms(&mut self, delta: i64) {
    self.now_ms += delta;
  }

  /// Fires the callback installed for `interrupt`, as the hardware would.
  pub fn trigger_interrupt(&mut self, interrupt: u8) {
    if let Some((_, callback)) = self.interrupts.get_mut(&interrupt) {
      callback();
    }
  }
}

impl Io for MockIo {
  fn serial_begin(&mut self, device: u8, baud: u32) -> Result<(), IoError> {
    self.serial_baud.insert(device, baud);
    self.serial_rx.entry(device).or_default();
    self.serial_tx.entry(device).or_default();
    Ok(())
  }

  fn serial_data_available(&mut self, device: u8) -> Result<usize, IoError> {
    Ok(self.serial_rx.get(&device).map_or(0, VecDeque::len))
  }

  fn serial_read(&mut self, device: u8) -> Result<u8, IoError> {
    Ok(
      self
        .serial_rx
        .get_mut(&device)
        .and_then(VecDeque::pop_front)
        .unwrap_or(0),
    )
  }

  fn serial_write(&mut self, device: u8, byte: u8) -> Result<(), IoError> {
    self.serial_tx.entry(device).or_default().push(byte);
    Ok(())
  }

  fn pin_set_mode(&mut self, pin: PinId, mode: PinMode) -> Result<(), IoError> {
    self.pin_modes.insert(pin, mode);
    Ok(())
  }

  fn pin_set_pullup(&mut self, pin: PinId, mode: PullupMode) -> Result<(), IoError> {
    self.pullups.insert(pin, mode);
    Ok(())
  }

  fn digital_write(&mut self, pin: PinId, value: bool) -> Result<(), IoError> {
    self.digital_out.push((pin, value));
    Ok(())
  }

  fn digital_read(&mut self, pin: PinId) -> Result<bool, IoError> {
    Ok(self.digital_in.get(&pin).copied().unwrap_or(false))
  }

  fn analog_read(&mut self, pin: PinId) -> Result<i64, IoError> {
    Ok(self.analog_in.get(&pin).copied().unwrap_or(0))
  }

  fn pwm_write(&mut self, pin: PinId, duty_percent: u8) -> Result<(), IoError> {
    if duty_percent > 100 {
      return Err(IoError::BadArgument("duty cycle above 100"));
    }
    self.pwm_out.push((pin, duty_percent));
    Ok(())
  }

  fn timer_current_ms(&mut self) -> Result<i64, IoError> {
    Ok(self.now_ms)
  }

  fn attach_external_interrupt(
    &mut self,
    interrupt: u8,
    mode: InterruptMode,
    callback: InterruptCallback,
  ) -> Result<(), IoError> {
    self.interrupts.insert(interrupt, (mode, callback));
    Ok(())
  }
}
