//! The FIFO transfer engine.
//!
//! One message at a time goes through
//!
//!   Idle -> Loaded -> Executing -> Draining -> Finalized
//!
//! Load packs the outbound bytes and programs TX_COUNT/RX_COUNT, Execute
//! sets the opcode, fires the command and waits for BUSY to drop, Drain
//! (only when data is expected back) waits for BUSY a second time and copies
//! the response out. Finalize runs on every path: it drops chip select on
//! revisions that need it and hands back status and byte count.
//!
//! Serialising callers is the caller's job; the `&mut self` receivers make a
//! second concurrent message impossible anyway.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

use crate::busy;
use crate::chip_select::{self, NUM_CHIP_SELECT};
use crate::error::Error;
use crate::fifo;
use crate::regs::{self, Registers, FIFO_SIZE};
use crate::version::VersionPolicy;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// What the controller offers to a bus framework.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Send and receive never overlap.
    pub half_duplex: bool,
    pub num_chip_select: u8,
    /// Upper bound for a whole message, and thus for any single transfer.
    pub max_transfer_size: usize,
    /// Supported clock polarity/phase bits. None.
    pub mode_bits: u8,
}

pub const CAPABILITIES: Capabilities = Capabilities {
    half_duplex: true,
    num_chip_select: NUM_CHIP_SELECT,
    max_transfer_size: FIFO_SIZE,
    mode_bits: 0,
};

// ---------------------------------------------------------------------------
// Message and result
// ---------------------------------------------------------------------------

/// A bus transaction: segments to run back to back against one target.
///
/// `Operation::Write` segments are sent and `Operation::Read` segments are
/// filled, in order. The first byte sent is the opcode.
pub struct Message<'m, 'b> {
    pub chip_select: u8,
    pub segments: &'m mut [Operation<'b, u8>],
}

/// Terminal state of one message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: Result<(), Error>,
    /// Bytes on the wire, opcode included. Only known on success.
    pub actual_length: Option<usize>,
}

impl From<Result<usize, Error>> for Completion {
    fn from(result: Result<usize, Error>) -> Self {
        match result {
            Ok(len) => Completion {
                status: Ok(()),
                actual_length: Some(len),
            },
            Err(e) => Completion {
                status: Err(e),
                actual_length: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the register window and the delay source for one controller.
pub struct Controller<R, D> {
    win: R,
    delay: D,
    version: VersionPolicy,
}

impl<R: Registers, D: DelayNs> Controller<R, D> {
    /// `version` is fixed for the lifetime of the controller.
    pub fn new(win: R, delay: D, version: VersionPolicy) -> Self {
        if !version.is_supported() {
            log::error!("unsupported SPI controller version {}", version.tag());
        }
        Self {
            win,
            delay,
            version,
        }
    }

    pub fn version(&self) -> VersionPolicy {
        self.version
    }

    pub fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    pub fn max_transfer_size(&self) -> usize {
        CAPABILITIES.max_transfer_size
    }

    /// Reset the FIFO pointer. Done once when the controller is claimed,
    /// not per message.
    pub fn setup(&mut self) {
        log::debug!("clearing FIFO pointer");
        self.win
            .set_clear32(regs::CTRL0, regs::CTRL0_FIFO_CLEAR, regs::CTRL0_FIFO_CLEAR);
    }

    /// Run one message to completion. Never returns without finalizing.
    pub fn transfer(&mut self, message: Message<'_, '_>) -> Completion {
        chip_select::select_chip(&mut self.win, message.chip_select);

        let result = self.run(message.segments);
        if let Err(e) = result {
            log::trace!("message on CS{} failed: {}", message.chip_select & 0x3, e);
        }

        if self.version.deasserts_chip_select() {
            chip_select::deselect_chip(&mut self.win);
        }

        Completion::from(result)
    }

    fn run(&mut self, segments: &mut [Operation<'_, u8>]) -> Result<usize, Error> {
        let layout = fifo::layout(segments)?;
        let busy = self.version.busy_status()?;

        // Loaded
        let cursor = fifo::load(&mut self.win, segments);
        self.win.write8(regs::TX_COUNT, layout.tx_len as u8);
        self.win.write8(regs::RX_COUNT, layout.rx_len as u8);
        log::trace!(
            "opcode {:#04x}: {} bytes out, {} bytes in",
            layout.opcode,
            layout.tx_len,
            layout.rx_len
        );

        // Executing
        self.version.set_opcode(&mut self.win, layout.opcode)?;
        self.version.trigger_execute(&mut self.win)?;
        busy::wait_idle(&mut self.win, &mut self.delay, busy)?;

        // Draining
        if layout.rx_len > 0 {
            busy::wait_idle(&mut self.win, &mut self.delay, busy)?;
            fifo::drain(&mut self.win, segments, cursor);
        }

        log::trace!("opcode {:#04x} done", layout.opcode);
        Ok(layout.actual_length())
    }

    /// An `SpiDevice` bound to one chip-select line.
    pub fn device(&mut self, chip_select: u8) -> Result<SpiChip<'_, R, D>, Error> {
        if chip_select >= NUM_CHIP_SELECT {
            return Err(Error::InvalidArgument);
        }
        Ok(SpiChip {
            controller: self,
            chip_select,
        })
    }

    /// Give back the window and delay source.
    pub fn release(self) -> (R, D) {
        (self.win, self.delay)
    }
}

// ---------------------------------------------------------------------------
// SpiDevice impl
// ---------------------------------------------------------------------------

/// One target on the controller. Each `transaction` is one message.
pub struct SpiChip<'c, R, D> {
    controller: &'c mut Controller<R, D>,
    chip_select: u8,
}

impl<R, D> SpiChip<'_, R, D> {
    pub fn chip_select(&self) -> u8 {
        self.chip_select
    }
}

impl<R, D> ErrorType for SpiChip<'_, R, D> {
    type Error = Error;
}

impl<R: Registers, D: DelayNs> SpiDevice<u8> for SpiChip<'_, R, D> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Error> {
        self.controller
            .transfer(Message {
                chip_select: self.chip_select,
                segments: operations,
            })
            .status
    }
}
