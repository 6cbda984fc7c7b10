//! A scripted main loop: a button on pin 2 drives an LED on pin 13 through
//! the graph `DigitalRead -> ToggleBoolean -> DigitalWrite`, all against the
//! in-memory I/O backend so it runs anywhere.

use std::cell::RefCell;
use std::rc::Rc;

use microweave::{
  DigitalRead, DigitalWrite, IoHandle, MockIo, Network, ToggleBoolean,
};

fn main() {
  let mock = Rc::new(RefCell::new(MockIo::new()));
  let io: IoHandle = mock.clone();
  let mut network = Network::new(io);

  let button = network
    .add_node(Box::new(DigitalRead::new(2)), 0)
    .expect("node table has room");
  let toggle = network
    .add_node(Box::new(ToggleBoolean::new(false)), 0)
    .expect("node table has room");
  let led = network
    .add_node(Box::new(DigitalWrite::new(13)), 0)
    .expect("node table has room");
  network.connect(button, 0, toggle, 0).expect("valid edge");
  network.connect(toggle, 0, led, 0).expect("valid edge");

  network.start();

  // Press and release the button a few times; each edge ripples through
  // the graph over the following ticks.
  let presses = [true, true, false, true, false, false, true, false];
  for (step, level) in presses.into_iter().enumerate() {
    mock.borrow_mut().set_digital_in(2, level);
    network.run_tick();
    println!(
      "tick {step}: button={} led_writes={:?}",
      level,
      mock.borrow().digital_writes()
    );
  }
}
