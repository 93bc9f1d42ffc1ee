//! Register map and raw access to the controller's MMIO window.
//!
//! Register map (byte offsets from the mapped base):
//!   +0x00  CTRL0        – control 0 (opcode[7:0] on v1, EXEC bit 16,
//!                         FIFO_CLEAR bit 20, BUSY bit 31 on v1)
//!   +0x1D  ALT_CS       – alternate chip select, bits [1:0]
//!   +0x45  OPCODE       – command code (v2)
//!   +0x47  CMD_TRIGGER  – EXECUTE bit 7 (v2)
//!   +0x48  TX_COUNT     – bytes to shift out after the opcode
//!   +0x4B  RX_COUNT     – bytes to shift in
//!   +0x4C  STATUS       – BUSY bit 31 (v2)
//!   +0x80  FIFO         – 70-byte staging window
//!
//! Nothing here locks: whoever holds `&mut` to the window is the only
//! actor touching the hardware.

use core::ptr::NonNull;

// ---------------------------------------------------------------------------
// Offsets
// ---------------------------------------------------------------------------

pub const CTRL0: usize = 0x00;
pub const ALT_CS: usize = 0x1D;
pub const OPCODE: usize = 0x45;
pub const CMD_TRIGGER: usize = 0x47;
pub const TX_COUNT: usize = 0x48;
pub const RX_COUNT: usize = 0x4B;
pub const STATUS: usize = 0x4C;
pub const FIFO_BASE: usize = 0x80;

/// FIFO capacity in bytes, shared by outbound and inbound data.
pub const FIFO_SIZE: usize = 70;

/// Span of the mapped window; the FIFO ends at 0xC6.
pub const WINDOW_LEN: usize = 0x100;

// CTRL0 bits
pub const CTRL0_OPCODE_MASK: u32 = 0xFF;
pub const CTRL0_EXEC: u32 = 1 << 16;
pub const CTRL0_FIFO_CLEAR: u32 = 1 << 20;
pub const CTRL0_BUSY: u32 = 1 << 31;

// ALT_CS bits
pub const ALT_CS_MASK: u8 = 0b11;

// CMD_TRIGGER bits
pub const CMD_TRIGGER_EXECUTE: u8 = 1 << 7;

// STATUS bits
pub const STATUS_BUSY: u32 = 1 << 31;

// ---------------------------------------------------------------------------
// Access trait
// ---------------------------------------------------------------------------

/// Byte and word access to the controller's register window.
pub trait Registers {
    fn read8(&mut self, offset: usize) -> u8;
    fn write8(&mut self, offset: usize, value: u8);
    fn read32(&mut self, offset: usize) -> u32;
    fn write32(&mut self, offset: usize, value: u32);

    /// Read-modify-write: `(current & !clear) | set`.
    fn set_clear8(&mut self, offset: usize, set: u8, clear: u8) {
        let value = (self.read8(offset) & !clear) | set;
        self.write8(offset, value);
    }

    /// Read-modify-write: `(current & !clear) | set`.
    fn set_clear32(&mut self, offset: usize, set: u32, clear: u32) {
        let value = (self.read32(offset) & !clear) | set;
        self.write32(offset, value);
    }
}

// ---------------------------------------------------------------------------
// Volatile MMIO window
// ---------------------------------------------------------------------------

/// A mapped register window accessed with volatile loads and stores.
pub struct Mmio {
    base: NonNull<u8>,
}

impl Mmio {
    /// Wrap an already-mapped window. Returns `None` for a null base.
    ///
    /// # Safety
    ///
    /// `base` must point to `WINDOW_LEN` bytes of device memory that stay
    /// mapped, and exclusively owned by the returned value, for its whole
    /// lifetime. The base must be 4-byte aligned.
    pub unsafe fn new(base: *mut u8) -> Option<Self> {
        NonNull::new(base).map(|base| Self { base })
    }

    #[inline(always)]
    fn at(&self, offset: usize) -> *mut u8 {
        debug_assert!(offset < WINDOW_LEN);
        // SAFETY: offset stays within the window promised to `new`.
        unsafe { self.base.as_ptr().add(offset) }
    }
}

impl Registers for Mmio {
    #[inline(always)]
    fn read8(&mut self, offset: usize) -> u8 {
        // SAFETY: see `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.at(offset)) }
    }

    #[inline(always)]
    fn write8(&mut self, offset: usize, value: u8) {
        // SAFETY: see `Mmio::new`.
        unsafe { core::ptr::write_volatile(self.at(offset), value) }
    }

    #[inline(always)]
    fn read32(&mut self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0);
        // SAFETY: see `Mmio::new`; 32-bit registers are word aligned.
        unsafe { core::ptr::read_volatile(self.at(offset).cast::<u32>()) }
    }

    #[inline(always)]
    fn write32(&mut self, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0);
        // SAFETY: see `Mmio::new`; 32-bit registers are word aligned.
        unsafe { core::ptr::write_volatile(self.at(offset).cast::<u32>(), value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmio_over_plain_memory() {
        let mut backing = [0u32; WINDOW_LEN / 4];
        let mut mmio = unsafe { Mmio::new(backing.as_mut_ptr().cast::<u8>()) }.unwrap();

        mmio.write32(CTRL0, 0x1234_5678);
        mmio.write8(ALT_CS, 0xA5);
        assert_eq!(mmio.read32(CTRL0), 0x1234_5678);
        assert_eq!(mmio.read8(ALT_CS), 0xA5);

        mmio.set_clear32(CTRL0, CTRL0_EXEC, CTRL0_OPCODE_MASK);
        assert_eq!(mmio.read32(CTRL0), 0x1235_5600);

        mmio.set_clear8(ALT_CS, 0x02, ALT_CS_MASK);
        assert_eq!(mmio.read8(ALT_CS), 0xA6);
    }

    #[test]
    fn null_base_is_rejected() {
        assert!(unsafe { Mmio::new(core::ptr::null_mut()) }.is_none());
    }
}
