//! Fuzz target: menu FSM key handling
//!
//! Feeds arbitrary key sequences into the menu state machine and asserts
//! the selection invariants hold after every key: valid screen, cursor
//! inside its field, band inside its schedule.
//!
//! cargo fuzz run fuzz_key_sequence

#![no_main]

use emeter::config::SystemConfig;
use emeter::menu::context::MenuContext;
use emeter::menu::screens::build_screen_table;
use emeter::menu::{Key, MenuFsm, ScreenId};
use emeter::tariff::TariffTable;
use libfuzzer_sys::fuzz_target;

const LEGENDS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', '*', '#',
];

fuzz_target!(|data: &[u8]| {
    let mut fsm = MenuFsm::new(build_screen_table(), ScreenId::BasicReadings);
    let mut ctx = MenuContext::new(SystemConfig::default(), TariffTable::default());
    fsm.start(&mut ctx);

    for &byte in data {
        let legend = LEGENDS[usize::from(byte) % LEGENDS.len()];
        let key = Key::from_char(legend).expect("legend table is exhaustive");
        fsm.handle_key(key, &mut ctx);

        assert!((fsm.current_screen() as usize) < ScreenId::COUNT);
        assert!(ctx.selection.cursor < ctx.selection.field.digit_width());
        assert!(ctx.selection.band < ctx.selection.band_count());
    }
});
