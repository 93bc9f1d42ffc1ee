//! Register-level driver for the FCH SPI controller's FIFO command engine.
//!
//! The controller stages a whole SPI command in a 70-byte FIFO inside its
//! register window: one opcode byte, the outbound bytes, then room for the
//! response. A message is turned into that layout, the command is fired and
//! BUSY is polled until the hardware is done. Two revisions exist and differ
//! only in where the opcode, trigger and BUSY live (see `version`).
//!
//! Mapping the window and discovering the device are left to the caller:
//! hand a `Registers` implementation (usually `regs::Mmio`) and a
//! `DelayNs` to `Controller::new`, then either call `Controller::transfer`
//! directly or use `Controller::device` to get an
//! `embedded_hal::spi::SpiDevice` for one chip select.

#![cfg_attr(not(test), no_std)]

pub mod busy;
pub mod chip_select;
pub mod controller;
pub mod error;
pub mod fifo;
pub mod regs;
pub mod sim;
pub mod version;

pub use controller::{CAPABILITIES, Capabilities, Completion, Controller, Message, SpiChip};
pub use error::Error;
pub use regs::{Mmio, Registers};
pub use version::VersionPolicy;
