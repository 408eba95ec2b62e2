//! Stage Runtime - Frame loop building blocks
//!
//! - `Clock` / `TimeSource`: frame deltas and millisecond timestamps
//! - `Channel`: the closed set of script event channels
//! - `InputEvent` / `InputRelay`: raw input gated on the playing state

mod channel;
mod clock;
mod input;

pub use channel::{Channel, UpdateEvent};
pub use clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use input::{InputEvent, InputRelay, KeyEvent, PointerEvent};
