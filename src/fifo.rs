//! Packing a message into the FIFO window and unpacking the answer.
//!
//! The first byte of the first non-empty `Write` is the opcode. It goes to
//! the opcode register, never into the FIFO, and is not part of the
//! transmit count. Every other outbound byte is stored in order from
//! `FIFO_BASE`; the response is read back starting right where the last
//! outbound byte went.

use embedded_hal::spi::Operation;

use crate::error::Error;
use crate::regs::{Registers, FIFO_BASE, FIFO_SIZE};

/// Byte accounting for one message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Layout {
    pub opcode: u8,
    /// Outbound bytes after the opcode.
    pub tx_len: usize,
    pub rx_len: usize,
}

impl Layout {
    /// Bytes on the wire, opcode included.
    pub fn actual_length(&self) -> usize {
        self.tx_len + self.rx_len + 1
    }
}

/// Position inside the FIFO window, counted from `FIFO_BASE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FifoCursor(usize);

impl FifoCursor {
    pub const START: FifoCursor = FifoCursor(0);

    pub fn position(self) -> usize {
        self.0
    }

    pub fn offset(self) -> usize {
        FIFO_BASE + self.0
    }

    fn advance(self) -> FifoCursor {
        FifoCursor(self.0 + 1)
    }
}

/// Peel the opcode off the first non-empty send buffer.
fn strip_opcode<'a>(buf: &'a [u8], opcode: &mut Option<u8>) -> &'a [u8] {
    if opcode.is_some() {
        return buf;
    }
    match buf.split_first() {
        Some((&first, rest)) => {
            *opcode = Some(first);
            rest
        }
        None => buf,
    }
}

/// Work out opcode and byte counts without touching hardware.
///
/// Fails with `InvalidArgument` when there is no send data, when an
/// operation needs full duplex or an inline delay, or when the data does
/// not fit the FIFO.
pub fn layout(segments: &[Operation<'_, u8>]) -> Result<Layout, Error> {
    let mut opcode = None;
    let mut tx_len = 0;
    let mut rx_len = 0;

    for op in segments {
        match op {
            Operation::Write(buf) => tx_len += strip_opcode(buf, &mut opcode).len(),
            Operation::Read(buf) => rx_len += buf.len(),
            Operation::Transfer(..) | Operation::TransferInPlace(_) | Operation::DelayNs(_) => {
                return Err(Error::InvalidArgument);
            }
        }
    }

    let opcode = opcode.ok_or(Error::InvalidArgument)?;
    if tx_len + rx_len > FIFO_SIZE {
        return Err(Error::InvalidArgument);
    }

    Ok(Layout {
        opcode,
        tx_len,
        rx_len,
    })
}

/// Write every outbound byte but the opcode into the FIFO. Returns the
/// cursor just past the last byte written.
pub fn load<R: Registers>(win: &mut R, segments: &[Operation<'_, u8>]) -> FifoCursor {
    let mut opcode = None;

    segments.iter().fold(FifoCursor::START, |cursor, op| match op {
        Operation::Write(buf) => strip_opcode(buf, &mut opcode)
            .iter()
            .fold(cursor, |cursor, &byte| {
                win.write8(cursor.offset(), byte);
                cursor.advance()
            }),
        _ => cursor,
    })
}

/// Fill the `Read` buffers, in order, from the FIFO starting at `cursor`.
pub fn drain<R: Registers>(
    win: &mut R,
    segments: &mut [Operation<'_, u8>],
    cursor: FifoCursor,
) -> FifoCursor {
    segments.iter_mut().fold(cursor, |cursor, op| match op {
        Operation::Read(buf) => buf.iter_mut().fold(cursor, |cursor, slot| {
            *slot = win.read8(cursor.offset());
            cursor.advance()
        }),
        _ => cursor,
    })
}
