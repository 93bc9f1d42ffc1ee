//! Alternate chip-select field, ALT_CS[1:0].

use crate::regs::{self, Registers};

/// Number of chip-select lines the field can address.
pub const NUM_CHIP_SELECT: u8 = 4;

/// Route the next command to target `index`. Only the low two bits of
/// `index` are used; the rest of ALT_CS is preserved.
pub fn select_chip<R: Registers>(win: &mut R, index: u8) {
    win.set_clear8(regs::ALT_CS, index & regs::ALT_CS_MASK, regs::ALT_CS_MASK);
}

/// Clear the chip-select field.
pub fn deselect_chip<R: Registers>(win: &mut R) {
    let cs = win.read8(regs::ALT_CS);
    win.write8(regs::ALT_CS, cs & !regs::ALT_CS_MASK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWindow;

    #[test]
    fn select_masks_to_two_bits() {
        for index in [0u8, 1, 2, 3, 7] {
            let mut win = SimWindow::new();
            select_chip(&mut win, index);
            assert_eq!(win.peek8(regs::ALT_CS) & 0b11, index % 4, "index {index}");
        }
    }

    #[test]
    fn select_keeps_other_bits() {
        let mut win = SimWindow::new();
        win.write8(regs::ALT_CS, 0b1010_0011);

        select_chip(&mut win, 2);
        assert_eq!(win.peek8(regs::ALT_CS), 0b1010_0010);

        select_chip(&mut win, 0);
        assert_eq!(win.peek8(regs::ALT_CS), 0b1010_0000);
    }

    #[test]
    fn deselect_clears_the_field() {
        let mut win = SimWindow::new();
        win.write8(regs::ALT_CS, 0b0100_0000);

        select_chip(&mut win, 3);
        deselect_chip(&mut win);
        assert_eq!(win.peek8(regs::ALT_CS), 0b0100_0000);
    }
}
