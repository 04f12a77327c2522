//! Mock hardware adapters for integration tests.
//!
//! Every port gets a scriptable implementation so tests can drive the
//! full control path — keys in, frames and storage writes out — without
//! touching GPIO, UART, or I²C.

use emeter::app::events::AppEvent;
use emeter::app::ports::{DisplayPort, EventSink, MeterPort, SupplyMonitorPort};
use emeter::display::DisplayFrame;

// ── MockMeter ─────────────────────────────────────────────────

/// Scriptable metering IC: tests poke the public fields.
pub struct MockMeter {
    pub voltage: f32,
    pub current: f32,
    pub active_power: f32,
    pub power_factor: f32,
    pub frequency: f32,
    pub energy_kwh: f32,
    pub supply_v: f32,
    /// Number of `reset_energy_counter` calls observed.
    pub counter_resets: u32,
}

impl Default for MockMeter {
    fn default() -> Self {
        Self {
            voltage: 230.0,
            current: 0.5,
            active_power: 115.0,
            power_factor: 1.0,
            frequency: 50.0,
            energy_kwh: 0.0,
            supply_v: 5.0,
            counter_resets: 0,
        }
    }
}

impl MeterPort for MockMeter {
    fn read_voltage(&mut self) -> f32 {
        self.voltage
    }
    fn read_current(&mut self) -> f32 {
        self.current
    }
    fn read_active_power(&mut self) -> f32 {
        self.active_power
    }
    fn read_power_factor(&mut self) -> f32 {
        self.power_factor
    }
    fn read_frequency(&mut self) -> f32 {
        self.frequency
    }
    fn read_energy(&mut self) -> f32 {
        self.energy_kwh
    }
    fn reset_energy_counter(&mut self) {
        self.counter_resets += 1;
        self.energy_kwh = 0.0;
    }
}

impl SupplyMonitorPort for MockMeter {
    fn read_supply_voltage(&mut self) -> f32 {
        self.supply_v
    }
}

// ── MockPanel ─────────────────────────────────────────────────

/// Records every rendered frame.
#[derive(Default)]
pub struct MockPanel {
    pub frames: Vec<DisplayFrame>,
}

#[allow(dead_code)]
impl MockPanel {
    pub fn last(&self) -> Option<&DisplayFrame> {
        self.frames.last()
    }
}

impl DisplayPort for MockPanel {
    fn render(&mut self, frame: &DisplayFrame) {
        self.frames.push(frame.clone());
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Captures emitted events for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
