//! I²C EEPROM storage adapter (AT24C32-class part).
//!
//! Implements [`StoragePort`] for the meter's durable byte range.
//!
//! On ESP-IDF the part sits on its own I²C bus: reads use the two-byte
//! address pointer followed by a sequential read; writes are chunked to
//! the 32-byte page size with the datasheet's 5 ms write-cycle pause.
//! The host backend is a plain byte image initialised to `0xFF` — the
//! erased state of a factory-fresh part, which is what makes the
//! first-boot path (`0xFF != INIT_MAGIC`, floats read back NaN) realistic
//! in tests.

use crate::app::ports::{StorageError, StoragePort};

#[cfg(target_os = "espidf")]
use esp_idf_hal::delay::{FreeRtos, BLOCK};

/// Addressable bytes of the AT24C32.
pub const EEPROM_CAPACITY: usize = 4096;

/// EEPROM page size — writes must not cross a page boundary.
#[cfg(target_os = "espidf")]
const PAGE_LEN: usize = 32;

/// Write-cycle time after each page write (datasheet: 5 ms max).
#[cfg(target_os = "espidf")]
const WRITE_CYCLE_MS: u32 = 5;

#[cfg_attr(not(target_os = "espidf"), derive(Debug))]
pub struct EepromAdapter {
    #[cfg(target_os = "espidf")]
    i2c: esp_idf_hal::i2c::I2cDriver<'static>,
    #[cfg(target_os = "espidf")]
    dev_addr: u8,

    #[cfg(not(target_os = "espidf"))]
    image: Vec<u8>,
}

#[cfg(target_os = "espidf")]
impl EepromAdapter {
    /// Wrap the I²C bus the EEPROM hangs off (7-bit device address,
    /// usually `0x50`).
    pub fn new(i2c: esp_idf_hal::i2c::I2cDriver<'static>, dev_addr: u8) -> Self {
        Self { i2c, dev_addr }
    }
}

#[cfg(not(target_os = "espidf"))]
impl EepromAdapter {
    /// Factory-fresh simulated part (all bytes erased to `0xFF`).
    pub fn new() -> Self {
        Self {
            image: vec![0xFF; EEPROM_CAPACITY],
        }
    }

    /// Simulated part with a caller-supplied image (corruption tests).
    pub fn with_image(image: Vec<u8>) -> Self {
        Self { image }
    }

    /// Borrow the raw image (layout assertions in tests).
    pub fn image(&self) -> &[u8] {
        &self.image
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for EepromAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for EepromAdapter {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let end = addr.checked_add(buf.len()).ok_or(StorageError::OutOfBounds)?;
        if end > self.capacity() {
            return Err(StorageError::OutOfBounds);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            buf.copy_from_slice(&self.image[addr..end]);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let pointer = [(addr >> 8) as u8, addr as u8];
            self.i2c
                .write_read(self.dev_addr, &pointer, buf, BLOCK)
                .map_err(|_| StorageError::IoError)
        }
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = addr.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        if end > self.capacity() {
            return Err(StorageError::OutOfBounds);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.image[addr..end].copy_from_slice(data);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut at = addr;
            let mut rest = data;
            while !rest.is_empty() {
                // Stay inside the current page
                let room = PAGE_LEN - (at % PAGE_LEN);
                let chunk_len = rest.len().min(room);
                let (chunk, tail) = rest.split_at(chunk_len);

                let mut frame = [0u8; 2 + PAGE_LEN];
                frame[0] = (at >> 8) as u8;
                frame[1] = at as u8;
                frame[2..2 + chunk_len].copy_from_slice(chunk);
                self.i2c
                    .write(self.dev_addr, &frame[..2 + chunk_len], BLOCK)
                    .map_err(|_| StorageError::IoError)?;
                FreeRtos::delay_ms(WRITE_CYCLE_MS);

                at += chunk_len;
                rest = tail;
            }
            Ok(())
        }
    }

    fn capacity(&self) -> usize {
        #[cfg(not(target_os = "espidf"))]
        {
            self.image.len()
        }

        #[cfg(target_os = "espidf")]
        {
            EEPROM_CAPACITY
        }
    }
}
