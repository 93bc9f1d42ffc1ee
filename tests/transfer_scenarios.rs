//! End-to-end message runs against the simulated register window.

use embedded_hal::spi::Operation;
use fch_spi_fifo::busy::{POLL_INTERVAL_US, TIMEOUT_US};
use fch_spi_fifo::regs::{self, FIFO_BASE, FIFO_SIZE};
use fch_spi_fifo::sim::{SimDelay, SimWindow};
use fch_spi_fifo::{Controller, Error, Message, VersionPolicy};

fn run(
    win: SimWindow,
    version: VersionPolicy,
    chip_select: u8,
    ops: &mut [Operation<'_, u8>],
) -> (fch_spi_fifo::Completion, SimWindow, SimDelay) {
    let mut ctrl = Controller::new(win, SimDelay::new(), version);
    let done = ctrl.transfer(Message {
        chip_select,
        segments: ops,
    });
    let (win, delay) = ctrl.release();
    (done, win, delay)
}

#[test]
fn read_command_on_v2() {
    let win = SimWindow::new().with_busy_polls(1, 1).with_response(&[0x12, 0x34]);
    let mut rx = [0u8; 2];
    let (done, win, _) = run(
        win,
        VersionPolicy::V2,
        1,
        &mut [Operation::Write(&[0x03, 0xAA, 0xBB]), Operation::Read(&mut rx)],
    );

    assert_eq!(done.status, Ok(()));
    assert_eq!(done.actual_length, Some(5));
    assert_eq!(rx, [0x12, 0x34]);

    let snap = win.at_trigger().expect("command was triggered");
    assert_eq!(snap[regs::OPCODE], 0x03);
    assert_eq!(snap[regs::TX_COUNT], 2);
    assert_eq!(snap[regs::RX_COUNT], 2);
    assert_eq!(snap[0x80], 0xAA);
    assert_eq!(snap[0x81], 0xBB);
    assert_eq!(snap[regs::ALT_CS] & 0b11, 1);
    assert_eq!(win.peek8(regs::ALT_CS) & 0b11, 0);
}

#[test]
fn receive_only_message_is_invalid() {
    for chip_select in 0..4 {
        let mut rx = [0u8; 4];
        let (done, win, _) = run(
            SimWindow::new(),
            VersionPolicy::V2,
            chip_select,
            &mut [Operation::Read(&mut rx)],
        );

        assert_eq!(done.status, Err(Error::InvalidArgument));
        assert!(!win.was_written(regs::TX_COUNT));
        assert!(!win.was_written(regs::RX_COUNT));
        assert!(!win.fifo_written());
    }
}

#[test]
fn v1_busy_clears_after_three_polls() {
    let (done, _, delay) = run(
        SimWindow::new().with_busy_polls(3, 0),
        VersionPolicy::V1,
        0,
        &mut [Operation::Write(&[0x05])],
    );

    assert_eq!(done.status, Ok(()));
    assert!(delay.elapsed_us() >= 3 * u64::from(POLL_INTERVAL_US));
    assert!(delay.elapsed_us() < u64::from(TIMEOUT_US));
}

#[test]
fn actual_length_counts_opcode_once() {
    for version in [VersionPolicy::V1, VersionPolicy::V2] {
        for tx in [0usize, 1, 7, 35] {
            for rx in [0usize, 1, 20, FIFO_SIZE - tx] {
                let mut out = [0x5Au8; 1 + FIFO_SIZE];
                out[0] = 0x0B;
                let mut inp = [0u8; FIFO_SIZE];

                let (done, win, _) = run(
                    SimWindow::new(),
                    version,
                    2,
                    &mut [
                        Operation::Write(&out[..1 + tx]),
                        Operation::Read(&mut inp[..rx]),
                    ],
                );

                assert_eq!(done.status, Ok(()), "tx {tx} rx {rx}");
                assert_eq!(done.actual_length, Some(tx + rx + 1));

                let snap = win.at_trigger().unwrap();
                assert_eq!(usize::from(snap[regs::TX_COUNT]), tx);
                assert_eq!(usize::from(snap[regs::RX_COUNT]), rx);
                // the opcode never lands in the FIFO
                assert!(snap[FIFO_BASE..FIFO_BASE + tx].iter().all(|&b| b == 0x5A));
            }
        }
    }
}

#[test]
fn oversized_message_is_rejected_up_front() {
    let out = [0x02u8; 1 + 40];
    let mut inp = [0u8; 31];
    let (done, win, _) = run(
        SimWindow::new(),
        VersionPolicy::V1,
        0,
        &mut [Operation::Write(&out), Operation::Read(&mut inp)],
    );

    assert_eq!(done.status, Err(Error::InvalidArgument));
    assert!(!win.fifo_written());
    assert_eq!(win.triggers(), 0);
}

#[test]
fn timeout_reads_no_fifo_bytes() {
    for version in [VersionPolicy::V1, VersionPolicy::V2] {
        let mut rx = [0xEEu8; 6];
        let (done, win, delay) = run(
            SimWindow::new().never_idle().with_response(&[1, 2, 3, 4, 5, 6]),
            version,
            3,
            &mut [Operation::Write(&[0x0B, 0x00, 0x10, 0x00]), Operation::Read(&mut rx)],
        );

        assert_eq!(done.status, Err(Error::Timeout));
        assert_eq!(done.actual_length, None);
        assert_eq!(rx, [0xEE; 6]);
        assert_eq!(win.fifo_reads(), 0);
        assert!(delay.elapsed_us() >= u64::from(TIMEOUT_US));
    }
}

#[test]
fn segments_are_filled_in_order() {
    let win = SimWindow::new().with_response(&[0xA0, 0xA1, 0xA2, 0xA3, 0xA4]);
    let mut status = [0u8; 1];
    let mut data = [0u8; 4];
    let (done, _, _) = run(
        win,
        VersionPolicy::V2,
        0,
        &mut [
            Operation::Write(&[0x0B]),
            Operation::Write(&[0x00, 0x01]),
            Operation::Read(&mut status),
            Operation::Write(&[0x02]),
            Operation::Read(&mut data),
        ],
    );

    assert_eq!(done.status, Ok(()));
    assert_eq!(done.actual_length, Some(1 + 3 + 5));
    assert_eq!(status, [0xA0]);
    assert_eq!(data, [0xA1, 0xA2, 0xA3, 0xA4]);
}

#[test]
fn back_to_back_messages_share_one_controller() {
    let mut ctrl = Controller::new(
        SimWindow::new().with_busy_polls(2, 2).with_response(&[0x77]),
        SimDelay::new(),
        VersionPolicy::V1,
    );
    ctrl.setup();

    for chip_select in [0u8, 1, 2, 3] {
        let mut rx = [0u8; 1];
        let done = ctrl.transfer(Message {
            chip_select,
            segments: &mut [Operation::Write(&[0x05]), Operation::Read(&mut rx)],
        });
        assert_eq!(done.status, Ok(()));
        assert_eq!(rx, [0x77]);
    }

    let (win, _) = ctrl.release();
    assert_eq!(win.triggers(), 4);
    assert_eq!(win.fifo_clears(), 1);
    // v1 leaves the last target selected
    assert_eq!(win.peek8(regs::ALT_CS) & 0b11, 3);
}
