//! End-to-end menu flows: keys in → screens, bills, and frames out.
//!
//! These run the real AppService over the mock adapters, so every path
//! from a key press down to a rendered frame is the production one.

use crate::mock_hw::{MockMeter, MockPanel, RecordingSink};

use emeter::adapters::eeprom::EepromAdapter;
use emeter::app::events::AppEvent;
use emeter::app::service::AppService;
use emeter::config::SystemConfig;
use emeter::menu::{Key, ScreenId};
use emeter::store::MeterStore;

/// Ticks per display refresh with the default 20 ms poll / 500 ms refresh.
const REFRESH_TICKS: u32 = 25;

struct Rig {
    app: AppService,
    meter: MockMeter,
    panel: MockPanel,
    store: MeterStore<EepromAdapter>,
    sink: RecordingSink,
}

fn make_rig() -> Rig {
    let mut store = MeterStore::new(EepromAdapter::new()).unwrap();
    let (tariff, offset) = store.load_or_init().unwrap();
    let mut app = AppService::new(SystemConfig::default(), tariff, offset);
    let mut sink = RecordingSink::default();
    app.start(&mut sink);
    Rig {
        app,
        meter: MockMeter::default(),
        panel: MockPanel::default(),
        store,
        sink,
    }
}

impl Rig {
    fn press(&mut self, keys: &[Key]) {
        for &key in keys {
            self.app.handle_key(key, &mut self.store, &mut self.sink);
        }
    }

    fn run_one_refresh(&mut self) {
        for _ in 0..REFRESH_TICKS {
            self.app
                .tick(&mut self.meter, &mut self.panel, &mut self.store, &mut self.sink);
        }
    }
}

#[test]
fn boot_renders_basic_readings_immediately() {
    let mut rig = make_rig();
    rig.app
        .tick(&mut rig.meter, &mut rig.panel, &mut rig.store, &mut rig.sink);
    assert_eq!(rig.panel.frames.len(), 1, "first tick must render");
    let frame = rig.panel.last().unwrap();
    assert!(frame.line1.contains('V'), "basic screen shows voltage");
    assert!(frame.line2.contains("kWh"));
}

#[test]
fn domestic_bill_flow_computes_the_documented_example() {
    let mut rig = make_rig();
    rig.meter.energy_kwh = 75.0;
    // A refresh pulls 75 kWh into the accumulator
    rig.run_one_refresh();
    rig.press(&[Key::B, Key::Digit(1)]);
    assert_eq!(rig.app.screen(), ScreenId::DomesticBill);
    // 60·12.75 + 15·18.50 + 400.00
    assert!((rig.app.bill() - 1442.5).abs() < 1e-3);

    rig.run_one_refresh();
    let frame = rig.panel.last().unwrap();
    assert_eq!(frame.line2.as_str(), "Rs    1442.50");
}

#[test]
fn industrial_bill_flow_uses_the_two_tier_schedule() {
    let mut rig = make_rig();
    rig.meter.energy_kwh = 150.0;
    rig.run_one_refresh();
    rig.press(&[Key::B, Key::Digit(2)]);
    assert_eq!(rig.app.screen(), ScreenId::IndustrialBill);
    // 100·9.50 + 50·12.00 + 1000.00
    assert!((rig.app.bill() - 2550.0).abs() < 1e-3);
}

#[test]
fn bill_tracks_energy_while_the_screen_is_shown() {
    let mut rig = make_rig();
    rig.meter.energy_kwh = 10.0;
    rig.run_one_refresh();
    rig.press(&[Key::B, Key::Digit(1)]);
    let first = rig.app.bill();

    rig.meter.energy_kwh = 20.0;
    rig.run_one_refresh();
    assert!(rig.app.bill() > first, "refresh must recompute the bill");
}

#[test]
fn tariff_edit_reprices_the_next_bill() {
    let mut rig = make_rig();
    rig.meter.energy_kwh = 10.0;
    rig.run_one_refresh();
    // Edit domestic band 1 rate 4.50 -> 9.50 (cursor 1 is the units digit)
    rig.press(&[Key::B, Key::Digit(1), Key::A, Key::Digit(1), Key::D, Key::Digit(9)]);
    assert_eq!(rig.app.tariff().domestic[0].rate, 9.50);

    // Back on the bill screen the new rate applies
    rig.press(&[Key::Hash]);
    assert_eq!(rig.app.screen(), ScreenId::DomesticBill);
    assert!((rig.app.bill() - (10.0 * 9.50 + 75.0)).abs() < 1e-3);
}

#[test]
fn edit_caret_is_rendered_on_the_second_line() {
    let mut rig = make_rig();
    rig.press(&[Key::B, Key::Digit(1), Key::A, Key::Digit(3)]);
    assert_eq!(rig.app.screen(), ScreenId::TariffEdit);
    rig.run_one_refresh();
    let frame = rig.panel.last().unwrap();
    assert_eq!(frame.line1.as_str(), "D3 rate  12.75");
    assert_eq!(frame.line2.as_str(), "         ^");
}

#[test]
fn screen_changes_are_announced() {
    let mut rig = make_rig();
    rig.press(&[Key::B, Key::Digit(1), Key::Hash]);
    let changes: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ScreenChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (ScreenId::BasicReadings, ScreenId::ApplianceMenu),
            (ScreenId::ApplianceMenu, ScreenId::DomesticBill),
            (ScreenId::DomesticBill, ScreenId::BasicReadings),
        ]
    );
}

#[test]
fn dead_sensor_renders_zeros_not_garbage() {
    let mut rig = make_rig();
    rig.meter.voltage = f32::NAN;
    rig.meter.current = f32::NAN;
    rig.meter.energy_kwh = f32::NAN;
    rig.run_one_refresh();
    let frame = rig.panel.last().unwrap();
    assert_eq!(frame.line1.as_str(), "  0.0V   0.000A");
    assert_eq!(frame.line2.as_str(), "    0.00 kWh");
}

#[test]
fn low_supply_is_reported_once_until_recovery() {
    let mut rig = make_rig();
    rig.meter.supply_v = 4.2;
    rig.run_one_refresh();
    rig.run_one_refresh();
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SupplyLow(_))),
        1,
        "warning must latch, not repeat"
    );

    // Recovery above the hysteresis band re-arms the warning
    rig.meter.supply_v = 5.0;
    rig.run_one_refresh();
    rig.meter.supply_v = 4.2;
    rig.run_one_refresh();
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SupplyLow(_))), 2);
}
