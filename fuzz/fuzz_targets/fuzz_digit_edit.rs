//! Fuzz target: `tariff::set_digit`
//!
//! Drives arbitrary float bit patterns, cursors, and digits through the
//! in-place digit editor and asserts it never panics and that sane
//! inputs land the requested digit at the requested position.
//!
//! cargo fuzz run fuzz_digit_edit

#![no_main]

use emeter::tariff::{digit_at, set_digit, EditField};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (u32, u8, u8, bool)| {
    let (bits, cursor_raw, digit_raw, fixed) = data;
    let field = if fixed {
        EditField::FixedCharge
    } else {
        EditField::Rate
    };
    let cursor = cursor_raw % field.digit_width();
    let digit = digit_raw % 10;
    let value = f32::from_bits(bits);

    // Must never panic, whatever the bit pattern
    let edited = set_digit(value, field, cursor, digit);

    // For representable in-range values the edited position must read
    // back the requested digit, and a second edit must change nothing.
    if value.is_finite() && (0.0..10_000.0).contains(&value) {
        assert_eq!(digit_at(edited, field, cursor), digit);
        let again = set_digit(edited, field, cursor, digit);
        assert_eq!(edited.to_bits(), again.to_bits());
    }
});
