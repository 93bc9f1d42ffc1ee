//! Bounded busy-flag poll.
//!
//! Both call sites in the engine use the same pair of constants. There is
//! no way to abort a wait once started; the timeout is the only bound.

use embedded_hal::delay::DelayNs;

use crate::error::Error;
use crate::regs::Registers;
use crate::version::BusyStatus;

/// Delay between two reads of the busy flag, in microseconds.
pub const POLL_INTERVAL_US: u32 = 20;

/// Give up once this much time has been spent waiting, in microseconds.
pub const TIMEOUT_US: u32 = 2_000_000;

/// Spin until `busy.mask` clears in `busy.offset`, sleeping
/// `POLL_INTERVAL_US` between reads.
pub fn wait_idle<R, D>(win: &mut R, delay: &mut D, busy: BusyStatus) -> Result<(), Error>
where
    R: Registers,
    D: DelayNs,
{
    let mut elapsed_us: u32 = 0;

    loop {
        let status = win.read32(busy.offset);
        if status & busy.mask == 0 {
            return Ok(());
        }

        if elapsed_us >= TIMEOUT_US {
            log::error!(
                "SPI controller busy timeout (reg {:#04x} = {:#010x})",
                busy.offset,
                status
            );
            return Err(Error::Timeout);
        }

        delay.delay_us(POLL_INTERVAL_US);
        elapsed_us += POLL_INTERVAL_US;
    }
}
