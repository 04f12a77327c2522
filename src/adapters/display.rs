//! HD44780 16×2 character panel behind a PCF8574 I²C backpack.
//!
//! Implements [`DisplayPort`]. The controller is driven in 4-bit mode
//! through the expander's upper nibble; RS/EN/backlight sit on the lower
//! bits. Generic over the `embedded-hal` `I2c` and `DelayNs` traits, so
//! the byte-banging half is exercised on the host with a recording mock
//! bus — only the bus construction is platform code.
//!
//! Rendering is best-effort: a failed bus write drops the frame with a
//! warning and the meter keeps running.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::DisplayPort;
use crate::display::{DisplayFrame, LINE_WIDTH};

/// Usual PCF8574 backpack address.
pub const DEFAULT_ADDR: u8 = 0x27;

// PCF8574 bit assignments
const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

// HD44780 commands
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8
const CMD_SET_DDRAM: u8 = 0x80;

pub struct Lcd1602<I, D> {
    i2c: I,
    delay: D,
    addr: u8,
}

impl<I: I2c, D: DelayNs> Lcd1602<I, D> {
    pub fn new(i2c: I, delay: D, addr: u8) -> Self {
        Self { i2c, delay, addr }
    }

    /// HD44780 4-bit initialisation sequence. Call once after power-up.
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.delay.delay_ms(50);
        // Three times 8-bit function set wakes the controller regardless
        // of its current mode, then the switch to 4-bit
        self.write_nibble(0x30)?;
        self.delay.delay_ms(5);
        self.write_nibble(0x30)?;
        self.delay.delay_us(150);
        self.write_nibble(0x30)?;
        self.delay.delay_us(150);
        self.write_nibble(0x20)?;
        self.delay.delay_us(150);

        self.command(CMD_FUNCTION_SET)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        self.command(CMD_ENTRY_MODE)?;
        Ok(())
    }

    fn try_render(&mut self, frame: &DisplayFrame) -> Result<(), I::Error> {
        for (row, text) in [&frame.line1, &frame.line2].into_iter().enumerate() {
            self.command(CMD_SET_DDRAM | (row as u8 * 0x40))?;
            let mut written = 0;
            for ch in text.chars().take(LINE_WIDTH) {
                // The panel is ASCII-only; anything else renders as a blank
                let byte = if ch.is_ascii() { ch as u8 } else { b' ' };
                self.data(byte)?;
                written += 1;
            }
            for _ in written..LINE_WIDTH {
                self.data(b' ')?;
            }
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.send(cmd, 0)
    }

    fn data(&mut self, byte: u8) -> Result<(), I::Error> {
        self.send(byte, RS)
    }

    fn send(&mut self, byte: u8, flags: u8) -> Result<(), I::Error> {
        self.write_nibble((byte & 0xF0) | flags)?;
        self.write_nibble((byte << 4) | flags)
    }

    /// Clock one expander byte out with an EN pulse.
    fn write_nibble(&mut self, bits: u8) -> Result<(), I::Error> {
        let byte = bits | BACKLIGHT;
        self.i2c.write(self.addr, &[byte | EN])?;
        self.delay.delay_us(1);
        self.i2c.write(self.addr, &[byte & !EN])?;
        self.delay.delay_us(50);
        Ok(())
    }
}

impl<I: I2c, D: DelayNs> DisplayPort for Lcd1602<I, D> {
    fn render(&mut self, frame: &DisplayFrame) {
        if self.try_render(frame).is_err() {
            warn!("lcd: i2c write failed, frame dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::i2c::{ErrorType, Operation, SevenBitAddress};

    /// Records every byte clocked onto the bus.
    struct MockBus {
        bytes: Vec<u8>,
    }

    impl ErrorType for MockBus {
        type Error = Infallible;
    }

    impl I2c<SevenBitAddress> for MockBus {
        fn transaction(
            &mut self,
            _address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Write(data) = op {
                    self.bytes.extend_from_slice(data);
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn make_lcd() -> Lcd1602<MockBus, NoDelay> {
        Lcd1602::new(MockBus { bytes: Vec::new() }, NoDelay, DEFAULT_ADDR)
    }

    #[test]
    fn init_starts_with_the_wake_up_nibbles() {
        let mut lcd = make_lcd();
        lcd.init().unwrap();
        // First EN-high byte carries the 8-bit function-set nibble
        assert_eq!(lcd.i2c.bytes[0], 0x30 | BACKLIGHT | EN);
        assert_eq!(lcd.i2c.bytes[1], 0x30 | BACKLIGHT);
    }

    #[test]
    fn render_pads_both_lines_to_full_width() {
        let mut lcd = make_lcd();
        let mut frame = DisplayFrame::default();
        let _ = frame.line1.push_str("hi");
        lcd.render(&frame);
        // 2 address commands + 32 padded cells, each 2 nibbles à 2 bus bytes
        assert_eq!(lcd.i2c.bytes.len(), (2 + 32) * 4);
    }

    #[test]
    fn data_bytes_carry_the_rs_flag() {
        let mut lcd = make_lcd();
        let mut frame = DisplayFrame::default();
        let _ = frame.line1.push_str("A");
        lcd.render(&frame);
        // 'A' = 0x41: high nibble 0x40 with RS set must appear on the bus
        assert!(lcd
            .i2c
            .bytes
            .iter()
            .any(|&b| b & 0xF0 == 0x40 && b & RS != 0));
    }
}
