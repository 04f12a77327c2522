//! Persistent meter state: fixed byte schema over a raw storage port.
//!
//! ```text
//!   0     1                 109   128            256
//!   ┌─────┬───────────────────┬───┬───────────────┐
//!   │flag │ tariff table      │...│ energy ring   │
//!   │=123 │ 9 × 12-byte bands │   │ (see ring.rs) │
//!   └─────┴───────────────────┴───┴───────────────┘
//! ```
//!
//! The init flag distinguishes a factory-fresh part from a programmed one:
//! absent ⇒ first boot, write compiled-in defaults. The tariff table is
//! one contiguous little-endian record rewritten whole on every save. The
//! energy total lives in the wear-leveled ring.
//!
//! Saves are not transactional across the two records; a power cut in
//! between leaves independently valid halves.

pub mod ring;

use log::info;

use crate::app::ports::{StorageError, StoragePort};
use crate::tariff::{TariffBand, TariffTable, DOMESTIC_BANDS, INDUSTRIAL_BANDS};
use ring::EnergyRing;

/// Address of the one-byte initialisation flag.
pub const INIT_FLAG_ADDR: usize = 0;
/// Magic value marking a programmed image.
pub const INIT_MAGIC: u8 = 123;
/// Start of the tariff table record.
pub const TARIFF_ADDR: usize = 1;
/// Bytes per band record: `u32` cap + `f32` rate + `f32` fixed charge.
pub const BAND_RECORD_LEN: usize = 12;
/// Bytes of the whole tariff record (domestic then industrial).
pub const TARIFF_RECORD_LEN: usize = BAND_RECORD_LEN * (DOMESTIC_BANDS + INDUSTRIAL_BANDS);
/// Smallest storage part the schema fits in.
pub const MIN_CAPACITY: usize = ring::SLOTS_END;

/// Typed access to the persistent meter state.
#[derive(Debug)]
pub struct MeterStore<S: StoragePort> {
    port: S,
    ring: EnergyRing,
}

impl<S: StoragePort> MeterStore<S> {
    /// Wrap a storage port. Fails if the part is too small for the schema.
    pub fn new(port: S) -> Result<Self, StorageError> {
        if port.capacity() < MIN_CAPACITY {
            return Err(StorageError::OutOfBounds);
        }
        Ok(Self {
            port,
            ring: EnergyRing::new(),
        })
    }

    /// Whether the image carries the init flag.
    pub fn is_initialised(&mut self) -> Result<bool, StorageError> {
        let mut flag = [0u8; 1];
        self.port.read(INIT_FLAG_ADDR, &mut flag)?;
        Ok(flag[0] == INIT_MAGIC)
    }

    /// Boot-time load. First boot (no flag) writes factory defaults and a
    /// zero total; otherwise the stored table and energy offset come back,
    /// each clamped to its valid domain.
    pub fn load_or_init(&mut self) -> Result<(TariffTable, f32), StorageError> {
        if !self.is_initialised()? {
            info!("storage: no init marker, programming factory defaults");
            let table = TariffTable::default();
            self.save(&table, 0.0)?;
            return Ok((table, 0.0));
        }

        let mut buf = [0u8; TARIFF_RECORD_LEN];
        self.port.read(TARIFF_ADDR, &mut buf)?;
        let table = decode_table(&buf);
        let offset = self.ring.load(&mut self.port)?;
        info!("storage: tariff table loaded, energy offset {offset:.3} kWh");
        Ok((table, offset))
    }

    /// Full save: flag, whole tariff block, one energy-ring record.
    pub fn save(&mut self, table: &TariffTable, total_kwh: f32) -> Result<(), StorageError> {
        self.port.write(INIT_FLAG_ADDR, &[INIT_MAGIC])?;
        let mut buf = [0u8; TARIFF_RECORD_LEN];
        encode_table(table, &mut buf);
        self.port.write(TARIFF_ADDR, &buf)?;
        self.ring.append(&mut self.port, total_kwh)
    }

    /// Energy reset: rewind the ring to its start and persist a zero total
    /// (together with the current table) immediately.
    pub fn reset_energy(&mut self, table: &TariffTable) -> Result<(), StorageError> {
        self.ring.rewind();
        self.save(table, 0.0)
    }

    /// Address the next energy record will be written to.
    pub fn write_pos(&self) -> usize {
        self.ring.write_pos()
    }

    /// Give the underlying port back (tests re-open stores over it).
    pub fn into_inner(self) -> S {
        self.port
    }
}

// ---------------------------------------------------------------------------
// Fixed-size record codec
// ---------------------------------------------------------------------------

/// Encode the whole table into its contiguous record.
pub fn encode_table(table: &TariffTable, out: &mut [u8; TARIFF_RECORD_LEN]) {
    for (i, band) in table
        .domestic
        .iter()
        .chain(table.industrial.iter())
        .enumerate()
    {
        encode_band(band, &mut out[i * BAND_RECORD_LEN..(i + 1) * BAND_RECORD_LEN]);
    }
}

/// Decode a contiguous record back into a table.
pub fn decode_table(buf: &[u8; TARIFF_RECORD_LEN]) -> TariffTable {
    let mut table = TariffTable::default();
    for (i, band) in table
        .domestic
        .iter_mut()
        .chain(table.industrial.iter_mut())
        .enumerate()
    {
        *band = decode_band(&buf[i * BAND_RECORD_LEN..(i + 1) * BAND_RECORD_LEN]);
    }
    table
}

fn encode_band(band: &TariffBand, out: &mut [u8]) {
    out[0..4].copy_from_slice(&band.max_kwh.to_le_bytes());
    out[4..8].copy_from_slice(&band.rate.to_le_bytes());
    out[8..12].copy_from_slice(&band.fixed_charge.to_le_bytes());
}

fn decode_band(buf: &[u8]) -> TariffBand {
    TariffBand {
        max_kwh: u32::from_le_bytes(word(buf, 0)),
        rate: f32::from_le_bytes(word(buf, 4)),
        fixed_charge: f32::from_le_bytes(word(buf, 8)),
    }
}

fn word(buf: &[u8], at: usize) -> [u8; 4] {
    let mut w = [0u8; 4];
    w.copy_from_slice(&buf[at..at + 4]);
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::eeprom::EepromAdapter;
    use crate::tariff::EditField;

    fn fresh_store() -> MeterStore<EepromAdapter> {
        MeterStore::new(EepromAdapter::new()).unwrap()
    }

    #[test]
    fn first_boot_programs_defaults_and_flag() {
        let mut store = fresh_store();
        assert!(!store.is_initialised().unwrap());
        let (table, offset) = store.load_or_init().unwrap();
        assert_eq!(table, TariffTable::default());
        assert_eq!(offset, 0.0);
        assert!(store.is_initialised().unwrap());
    }

    #[test]
    fn second_boot_loads_programmed_state() {
        let mut store = fresh_store();
        let mut table = store.load_or_init().unwrap().0;
        table.edit_digit(true, 2, EditField::Rate, 0, 9);
        store.save(&table, 321.25).unwrap();

        let mut reopened = MeterStore::new(store.into_inner()).unwrap();
        let (loaded, offset) = reopened.load_or_init().unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.domestic[2].rate, 92.75);
        assert!((offset - 321.25).abs() < 1e-6);
    }

    #[test]
    fn energy_survives_a_ring_wraparound() {
        let mut store = fresh_store();
        store.load_or_init().unwrap();
        let table = TariffTable::default();
        let slots = (ring::SLOTS_END - ring::SLOTS_START) / ring::SLOT_LEN;
        for i in 0..(slots + 5) {
            store.save(&table, i as f32 * 0.5).unwrap();
        }
        let last = (slots + 4) as f32 * 0.5;

        let mut reopened = MeterStore::new(store.into_inner()).unwrap();
        let (_, offset) = reopened.load_or_init().unwrap();
        assert!((offset - last).abs() < 1e-6);
    }

    #[test]
    fn reset_rewinds_the_ring_and_zeroes_the_total() {
        let mut store = fresh_store();
        store.load_or_init().unwrap();
        let table = TariffTable::default();
        for i in 0..9 {
            store.save(&table, i as f32).unwrap();
        }
        store.reset_energy(&table).unwrap();
        // The reset record landed in slot 0
        assert_eq!(store.write_pos(), ring::SLOTS_START + ring::SLOT_LEN);

        let mut reopened = MeterStore::new(store.into_inner()).unwrap();
        let (_, offset) = reopened.load_or_init().unwrap();
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn undersized_part_is_rejected() {
        let image = vec![0xFF; MIN_CAPACITY / 2];
        let err = MeterStore::new(EepromAdapter::with_image(image)).unwrap_err();
        assert_eq!(err, StorageError::OutOfBounds);
    }

    #[test]
    fn band_record_codec_round_trips() {
        let table = TariffTable::default();
        let mut buf = [0u8; TARIFF_RECORD_LEN];
        encode_table(&table, &mut buf);
        assert_eq!(decode_table(&buf), table);
    }

    #[test]
    fn tariff_record_has_the_documented_layout() {
        // Offsets are part of the storage contract, not an implementation
        // detail — a layout change silently orphans fielded meters.
        assert_eq!(TARIFF_RECORD_LEN, 108);
        assert_eq!(TARIFF_ADDR + TARIFF_RECORD_LEN, 109);
        assert!(TARIFF_ADDR + TARIFF_RECORD_LEN <= ring::CURSOR_ADDR);

        let mut store = fresh_store();
        store.load_or_init().unwrap();
        let image = store.into_inner();
        assert_eq!(image.image()[INIT_FLAG_ADDR], INIT_MAGIC);
        // First domestic cap (30) sits right after the flag, little-endian
        assert_eq!(&image.image()[TARIFF_ADDR..TARIFF_ADDR + 4], &[30, 0, 0, 0]);
    }
}
