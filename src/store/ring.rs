//! Wear-leveled circular log for the energy total.
//!
//! The energy value is rewritten far more often than anything else in the
//! image (once a minute, for years), so its writes rotate through a
//! dedicated slot region instead of hammering one cell:
//!
//! ```text
//!   128        132                                            256
//!    ┌──────────┬───────┬───────┬───────┬─── ··· ───┬───────┐
//!    │ cursor   │ slot0 │ slot1 │ slot2 │           │ slot30│
//!    │ (u32 LE) │ f32   │ f32   │ f32   │           │ f32   │
//!    └──────────┴───────┴───────┴───────┴─── ··· ───┴───────┘
//! ```
//!
//! Each save writes the total into the slot the in-memory cursor points
//! at, records that slot's address in the cursor cell, then advances the
//! cursor one slot (wrapping). Only the most recent record matters — no
//! history is ever read back. On load the cursor cell is validated and
//! clamped (out-of-range or misaligned ⇒ region start) and the value it
//! points at is validated and clamped (NaN or negative ⇒ 0).

use log::warn;

use crate::app::ports::{StorageError, StoragePort};

/// Fixed cell holding the address of the most recently written slot.
pub const CURSOR_ADDR: usize = 128;
/// First value slot.
pub const SLOTS_START: usize = 132;
/// End of the slot region (exclusive).
pub const SLOTS_END: usize = 256;
/// Bytes per slot (one `f32`).
pub const SLOT_LEN: usize = 4;

/// Rotating writer over the energy slot region.
#[derive(Debug)]
pub struct EnergyRing {
    /// Address the next save will write to.
    cursor: usize,
}

impl EnergyRing {
    pub fn new() -> Self {
        Self {
            cursor: SLOTS_START,
        }
    }

    /// Read back the persisted total and reposition the write cursor one
    /// slot past the last record.
    pub fn load(&mut self, store: &mut impl StoragePort) -> Result<f32, StorageError> {
        let mut word = [0u8; SLOT_LEN];
        store.read(CURSOR_ADDR, &mut word)?;
        let stored = u32::from_le_bytes(word) as usize;

        let slot = if Self::is_valid_slot(stored) {
            stored
        } else {
            warn!("energy ring: cursor {stored:#x} outside slot region, rewinding");
            SLOTS_START
        };

        store.read(slot, &mut word)?;
        let value = f32::from_le_bytes(word);
        self.cursor = Self::next_slot(slot);

        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            warn!("energy ring: stored total invalid ({value}), using 0");
            Ok(0.0)
        }
    }

    /// Write one record: the total at the cursor, then the cursor's own
    /// position into the cursor cell; advance with wraparound.
    pub fn append(
        &mut self,
        store: &mut impl StoragePort,
        total_kwh: f32,
    ) -> Result<(), StorageError> {
        store.write(self.cursor, &total_kwh.to_le_bytes())?;
        store.write(CURSOR_ADDR, &(self.cursor as u32).to_le_bytes())?;
        self.cursor = Self::next_slot(self.cursor);
        Ok(())
    }

    /// Reposition the write cursor at the start of the slot region
    /// (energy reset).
    pub fn rewind(&mut self) {
        self.cursor = SLOTS_START;
    }

    /// Address the next `append` will write to.
    pub fn write_pos(&self) -> usize {
        self.cursor
    }

    fn next_slot(slot: usize) -> usize {
        let next = slot + SLOT_LEN;
        if next >= SLOTS_END { SLOTS_START } else { next }
    }

    fn is_valid_slot(addr: usize) -> bool {
        (SLOTS_START..SLOTS_END).contains(&addr) && (addr - SLOTS_START) % SLOT_LEN == 0
    }
}

impl Default for EnergyRing {
    fn default() -> Self {
        Self::new()
    }
}
