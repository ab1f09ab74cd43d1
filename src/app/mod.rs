//! Application core: pure domain logic, zero I/O.
//!
//! Boot-time record recovery, schedule rebuilding and next-feeding
//! arithmetic.  All interaction with flash and the outside world happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
