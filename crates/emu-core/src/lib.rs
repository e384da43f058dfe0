//! Core traits and types shared by the chip emulators.
//!
//! Chips never own memory. They reach it through [`Bus`], which reports
//! faults as values so a chip can fold them into its own register state.
//! Every chip exposes its internals through [`Observable`].

mod bus;
mod observable;

pub use bus::{Bus, BusError, SimpleBus};
pub use observable::{Observable, Value};
