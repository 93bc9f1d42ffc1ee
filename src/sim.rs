//! Host-side model of the controller, for tests and bring-up without
//! hardware.
//!
//! `SimWindow` is a plain 256-byte register file with just enough behaviour
//! to drive the engine:
//!
//!   * CTRL0.EXEC (v1) and CMD_TRIGGER.EXECUTE (v2) self-clear and start a
//!     command, snapshotting the register file first;
//!   * on start the canned response is placed in the FIFO right after the
//!     TX_COUNT bytes of outbound data;
//!   * BUSY (CTRL0[31] and STATUS[31]) reads back set for a scripted number
//!     of polls, once for the command phase and once more for the response
//!     phase when RX_COUNT is non-zero;
//!   * CTRL0.FIFO_CLEAR self-clears and is counted.
//!
//! `SimDelay` only adds up the time it was asked to wait.

use embedded_hal::delay::DelayNs;

use crate::regs::{self, Registers, FIFO_BASE, FIFO_SIZE, WINDOW_LEN};

pub struct SimWindow {
    mem: [u8; WINDOW_LEN],
    written: [bool; WINDOW_LEN],
    busy_polls: [u32; 2],
    phase: usize,
    remaining: u32,
    running: bool,
    triggers: usize,
    fifo_clears: usize,
    fifo_reads: usize,
    response: [u8; FIFO_SIZE],
    response_len: usize,
    at_trigger: Option<[u8; WINDOW_LEN]>,
}

impl Default for SimWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWindow {
    /// An idle controller: BUSY is never seen set.
    pub fn new() -> Self {
        Self {
            mem: [0; WINDOW_LEN],
            written: [false; WINDOW_LEN],
            busy_polls: [0; 2],
            phase: 0,
            remaining: 0,
            running: false,
            triggers: 0,
            fifo_clears: 0,
            fifo_reads: 0,
            response: [0; FIFO_SIZE],
            response_len: 0,
            at_trigger: None,
        }
    }

    /// Report BUSY for `command` polls after a trigger, then for `response`
    /// more polls if the command expects data back.
    pub fn with_busy_polls(mut self, command: u32, response: u32) -> Self {
        self.busy_polls = [command, response];
        self
    }

    /// BUSY never drops after a trigger.
    pub fn never_idle(self) -> Self {
        self.with_busy_polls(u32::MAX, u32::MAX)
    }

    /// The command phase ends at once; the response phase never does.
    pub fn stalls_on_response(self) -> Self {
        self.with_busy_polls(0, u32::MAX)
    }

    /// Bytes the "device" answers with. Truncated to the FIFO size.
    pub fn with_response(mut self, data: &[u8]) -> Self {
        let len = data.len().min(FIFO_SIZE);
        self.response[..len].copy_from_slice(&data[..len]);
        self.response_len = len;
        self
    }

    pub fn peek8(&self, offset: usize) -> u8 {
        self.mem[offset]
    }

    pub fn peek32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.mem[offset],
            self.mem[offset + 1],
            self.mem[offset + 2],
            self.mem[offset + 3],
        ])
    }

    /// Whether any write has hit the byte at `offset` since the last
    /// `clear_write_log`.
    pub fn was_written(&self, offset: usize) -> bool {
        self.written[offset]
    }

    /// Whether any byte of the FIFO window has been written.
    pub fn fifo_written(&self) -> bool {
        self.written[FIFO_BASE..FIFO_BASE + FIFO_SIZE].iter().any(|&w| w)
    }

    pub fn clear_write_log(&mut self) {
        self.written = [false; WINDOW_LEN];
    }

    pub fn triggers(&self) -> usize {
        self.triggers
    }

    pub fn fifo_clears(&self) -> usize {
        self.fifo_clears
    }

    /// Byte reads that landed in the FIFO window.
    pub fn fifo_reads(&self) -> usize {
        self.fifo_reads
    }

    /// Register file as it was at the most recent trigger.
    pub fn at_trigger(&self) -> Option<&[u8; WINDOW_LEN]> {
        self.at_trigger.as_ref()
    }

    fn start(&mut self) {
        self.at_trigger = Some(self.mem);
        self.triggers += 1;

        let at = FIFO_BASE + usize::from(self.mem[regs::TX_COUNT]);
        let end = (at + self.response_len).min(FIFO_BASE + FIFO_SIZE);
        if at < end {
            self.mem[at..end].copy_from_slice(&self.response[..end - at]);
        }

        self.running = true;
        self.phase = 0;
        self.remaining = self.busy_polls[0];
    }

    /// One read of the busy flag.
    fn poll_busy(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            return true;
        }

        self.phase += 1;
        if self.phase == 1 && self.mem[regs::RX_COUNT] != 0 {
            self.remaining = self.busy_polls[1];
        } else {
            self.running = false;
        }
        false
    }

    fn in_fifo(offset: usize) -> bool {
        (FIFO_BASE..FIFO_BASE + FIFO_SIZE).contains(&offset)
    }
}

impl Registers for SimWindow {
    fn read8(&mut self, offset: usize) -> u8 {
        if Self::in_fifo(offset) {
            self.fifo_reads += 1;
        }
        self.mem[offset]
    }

    fn write8(&mut self, offset: usize, value: u8) {
        self.written[offset] = true;
        self.mem[offset] = value;

        if offset == regs::CMD_TRIGGER && value & regs::CMD_TRIGGER_EXECUTE != 0 {
            self.mem[offset] &= !regs::CMD_TRIGGER_EXECUTE;
            self.start();
        }
    }

    fn read32(&mut self, offset: usize) -> u32 {
        let mut value = self.peek32(offset);
        if (offset == regs::CTRL0 || offset == regs::STATUS) && self.poll_busy() {
            value |= 1 << 31;
        }
        value
    }

    fn write32(&mut self, offset: usize, value: u32) {
        let mut value = value;
        if offset == regs::CTRL0 || offset == regs::STATUS {
            // BUSY is read-only.
            value &= !(1 << 31);
        }

        let start = offset == regs::CTRL0 && value & regs::CTRL0_EXEC != 0;
        if offset == regs::CTRL0 {
            if value & regs::CTRL0_FIFO_CLEAR != 0 {
                self.fifo_clears += 1;
            }
            value &= !(regs::CTRL0_EXEC | regs::CTRL0_FIFO_CLEAR);
        }

        self.written[offset..offset + 4].fill(true);
        self.mem[offset..offset + 4].copy_from_slice(&value.to_le_bytes());

        if start {
            self.start();
        }
    }
}

/// A `DelayNs` that never sleeps and just records the total requested.
#[derive(Debug, Default)]
pub struct SimDelay {
    elapsed_ns: u64,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_lands_after_outbound_bytes() {
        let mut win = SimWindow::new().with_response(&[0xC2, 0x20]);
        win.write8(regs::TX_COUNT, 3);
        win.write8(regs::CMD_TRIGGER, regs::CMD_TRIGGER_EXECUTE);

        assert_eq!(win.peek8(FIFO_BASE + 3), 0xC2);
        assert_eq!(win.peek8(FIFO_BASE + 4), 0x20);
        assert_eq!(win.peek8(regs::CMD_TRIGGER), 0);
        assert_eq!(win.triggers(), 1);
    }

    #[test]
    fn busy_phases_follow_the_script() {
        let mut win = SimWindow::new().with_busy_polls(2, 1);
        win.write8(regs::RX_COUNT, 1);
        win.write8(regs::CMD_TRIGGER, regs::CMD_TRIGGER_EXECUTE);

        let busy: [bool; 6] = core::array::from_fn(|_| win.read32(regs::STATUS) & (1 << 31) != 0);
        assert_eq!(busy, [true, true, false, true, false, false]);
    }

    #[test]
    fn fifo_clear_self_clears() {
        let mut win = SimWindow::new();
        win.set_clear32(regs::CTRL0, regs::CTRL0_FIFO_CLEAR, regs::CTRL0_FIFO_CLEAR);
        assert_eq!(win.fifo_clears(), 1);
        assert_eq!(win.peek32(regs::CTRL0), 0);
    }
}
