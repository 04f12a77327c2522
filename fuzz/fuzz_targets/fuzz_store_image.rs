//! Fuzz target: storage image load
//!
//! Hands the boot-time loader arbitrary EEPROM images and asserts it
//! never panics and always recovers a usable state: a finite,
//! non-negative energy offset and an in-range ring cursor.
//!
//! cargo fuzz run fuzz_store_image

#![no_main]

use emeter::adapters::eeprom::EepromAdapter;
use emeter::store::{ring, MeterStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Pad to the schema's minimum footprint
    let mut image = data.to_vec();
    if image.len() < ring::SLOTS_END {
        image.resize(ring::SLOTS_END, 0xFF);
    }

    let Ok(mut store) = MeterStore::new(EepromAdapter::with_image(image)) else {
        return;
    };
    let (_, offset) = store.load_or_init().expect("in-memory image cannot fail I/O");

    assert!(offset.is_finite());
    assert!(offset >= 0.0);
    let pos = store.write_pos();
    assert!((ring::SLOTS_START..ring::SLOTS_END).contains(&pos));
    assert_eq!((pos - ring::SLOTS_START) % ring::SLOT_LEN, 0);
});
