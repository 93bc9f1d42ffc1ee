//! Bare-metal Renode harness for the FIFO SPI controller driver.
//!
//! This file is deliberately kept thin.  It contains only the entry point,
//! a minimal UART writer and `log` backend (so you can see results in
//! Renode's analyzer), and the test sequence.  The controller itself is the
//! Renode peripheral model mapped at `SPI_BASE`, with a SPI NOR flash behind
//! chip select 0.
//!
//! ## Building
//!
//!   cargo +nightly build --target thumbv7em-none-eabihf --release \
//!       --features rt
//!
//! ## What you'll see in Renode
//!
//! The UART2 analyzer will print lines like:
//!
//!   [PASS] read id: [EF 40 18]
//!   [PASS] read: 8 bytes, actual length 12
//!   All tests finished.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};
use fch_spi_fifo::{Controller, Message, Mmio, VersionPolicy};
use log::{LevelFilter, Log, Metadata, Record};

// ---------------------------------------------------------------------------
// Tiny UART2 writer – enough to print ASCII to the Renode analyzer.
// USART2 base on STM32F4 = 0x4000_4400.
//   +0x00  SR   – status register   (TXE is bit 7)
//   +0x04  DR   – data register
//   +0x08  BRR  – baud-rate register
//   +0x0C  CR1  – control register 1
// ---------------------------------------------------------------------------

const USART2_BASE: u32 = 0x4000_4400;
const USART2_SR: *const u32 = USART2_BASE as *const u32;
const USART2_DR: *mut u32 = (USART2_BASE + 0x04) as *mut u32;

/// Where the platform file maps the controller's register window.
const SPI_BASE: usize = 0x4001_3000;

/// Version tag the platform reports for the modelled controller.
const SPI_VERSION_TAG: u32 = 2;

fn uart_write_byte(b: u8) {
    unsafe {
        // Wait for TXE (bit 7)
        while core::ptr::read_volatile(USART2_SR) & (1 << 7) == 0 {}
        core::ptr::write_volatile(USART2_DR, b as u32);
    }
}

struct Uart;

impl core::fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                uart_write_byte(b'\r');
            }
            uart_write_byte(b);
        }
        Ok(())
    }
}

macro_rules! println {
    ($($arg:tt)*) => {{
        let _ = core::fmt::Write::write_fmt(&mut Uart, format_args!($($arg)*));
        uart_write_byte(b'\r');
        uart_write_byte(b'\n');
    }};
}

// ---------------------------------------------------------------------------
// log backend
// ---------------------------------------------------------------------------

struct UartLogger;

impl Log for UartLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: UartLogger = UartLogger;

// ---------------------------------------------------------------------------
// Delay – calibrated spin, Renode runs the core at 16 MHz by default
// ---------------------------------------------------------------------------

const CPU_HZ: u32 = 16_000_000;

struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        // roughly 4 cycles per iteration
        let iterations = (u64::from(ns) * u64::from(CPU_HZ / 4)) / 1_000_000_000;
        for _ in 0..iterations {
            core::hint::spin_loop();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    // ---------------------------------------------------------------
    // Configure USART2.  Renode's STM32 USART model sets TXE as soon as
    // TE is enabled, regardless of baud-rate divider, so we just need a
    // non-zero BRR and TE + UE set.
    // ---------------------------------------------------------------
    unsafe {
        let usart2_brr = 0x4000_4408u32 as *mut u32;
        let usart2_cr1 = 0x4000_440Cu32 as *mut u32;

        core::ptr::write_volatile(usart2_brr, 0x36);
        // CR1: TE (bit 3) | UE (bit 13)
        core::ptr::write_volatile(usart2_cr1, (1 << 3) | (1 << 13));
    }

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
    println!("USART2 initialised.");

    let Some(win) = (unsafe { Mmio::new(SPI_BASE as *mut u8) }) else {
        println!("[FAIL] no register window");
        loop {}
    };

    let mut ctrl = Controller::new(win, SpinDelay, VersionPolicy::from_tag(SPI_VERSION_TAG));
    ctrl.setup();
    println!("SPI controller v{} ready.", ctrl.version().tag());

    // --- Test 1: JEDEC read ID through the SpiDevice handle --------------
    let mut id = [0u8; 3];
    match ctrl.device(0) {
        Ok(mut flash) => {
            match flash.transaction(&mut [Operation::Write(&[0x9F]), Operation::Read(&mut id)]) {
                Ok(()) if id != [0x00; 3] && id != [0xFF; 3] => {
                    println!("[PASS] read id: {:02X?}", id)
                }
                Ok(()) => println!("[FAIL] read id: got {:02X?}", id),
                Err(e) => println!("[FAIL] read id: {}", e),
            }
        }
        Err(e) => println!("[FAIL] chip select 0: {}", e),
    }

    // --- Test 2: READ 8 bytes at 0x000000 ---------------------------------
    let mut data = [0u8; 8];
    let done = ctrl.transfer(Message {
        chip_select: 0,
        segments: &mut [Operation::Write(&[0x03, 0x00, 0x00, 0x00]), Operation::Read(&mut data)],
    });
    match (done.status, done.actual_length) {
        (Ok(()), Some(12)) => println!("[PASS] read: 8 bytes, actual length 12"),
        (Ok(()), len) => println!("[FAIL] read: actual length {:?}", len),
        (Err(e), _) => println!("[FAIL] read: {}", e),
    }

    // --- Test 3: a receive-only message must be refused ------------------
    let mut junk = [0u8; 4];
    let done = ctrl.transfer(Message {
        chip_select: 0,
        segments: &mut [Operation::Read(&mut junk)],
    });
    match done.status {
        Err(fch_spi_fifo::Error::InvalidArgument) => println!("[PASS] missing opcode rejected"),
        other => println!("[FAIL] missing opcode: {:?}", other),
    }

    println!("All tests finished.");

    // Halt – spin forever so Renode doesn't fly off into unmapped memory.
    loop {}
}

// ---------------------------------------------------------------------------
// Panic handler (required by #![no_std])
// ---------------------------------------------------------------------------

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    println!("[PANIC]");
    loop {}
}
