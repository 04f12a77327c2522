//! Shared mutable context threaded through every screen handler.
//!
//! `MenuContext` is the single struct the key handlers read from and write
//! to: the latest electrical snapshot, the live tariff table, the edit
//! selection, the derived bill, and a persistence request flag that the
//! service drains after each key. Think of it as the blackboard between
//! the menu state machine and the rest of the application.

use crate::config::SystemConfig;
use crate::tariff::{EditField, TariffTable, DOMESTIC_BANDS, INDUSTRIAL_BANDS};

// ---------------------------------------------------------------------------
// Electrical snapshot (read-only to screen handlers; written by the service)
// ---------------------------------------------------------------------------

/// A sanitised point-in-time snapshot of the metering IC's readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterSnapshot {
    /// Line voltage (V).
    pub voltage: f32,
    /// Load current (A).
    pub current: f32,
    /// Active power (W).
    pub active_power: f32,
    /// Apparent power (VA), derived as `voltage × current`.
    pub apparent_power: f32,
    /// Power factor (0–1).
    pub power_factor: f32,
    /// Line frequency (Hz).
    pub frequency: f32,
}

impl MeterSnapshot {
    /// Build a snapshot from raw sensor reads, applying the no-load rule:
    /// a NaN or sub-threshold voltage forces every load quantity to zero
    /// for this tick (disconnected / faulted sensor). Frequency is
    /// sanitised independently — the line reference may still be present
    /// with no load attached.
    pub fn from_raw(
        voltage: f32,
        current: f32,
        active_power: f32,
        power_factor: f32,
        frequency: f32,
        min_live_voltage: f32,
    ) -> Self {
        let frequency = sane(frequency);

        if !voltage.is_finite() || voltage < min_live_voltage {
            return Self {
                frequency,
                ..Self::default()
            };
        }

        let current = sane(current);
        Self {
            voltage,
            current,
            active_power: sane(active_power),
            apparent_power: voltage * current,
            power_factor: sane(power_factor),
            frequency,
        }
    }
}

fn sane(x: f32) -> f32 {
    if x.is_finite() { x } else { 0.0 }
}

// ---------------------------------------------------------------------------
// Edit selection
// ---------------------------------------------------------------------------

/// Which band/field/digit the tariff editor is pointed at.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    /// `true` = domestic schedule, `false` = industrial.
    pub domestic: bool,
    /// Band index within the selected schedule.
    pub band: usize,
    /// Field under edit (rate or fixed charge).
    pub field: EditField,
    /// Digit cursor, counted from the left of the displayed digit string.
    pub cursor: u8,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            domestic: true,
            band: 0,
            field: EditField::Rate,
            cursor: 0,
        }
    }
}

impl Selection {
    /// Point at a freshly chosen band: field and cursor restart.
    pub fn select_band(&mut self, band: usize) {
        self.band = band;
        self.field = EditField::Rate;
        self.cursor = 0;
    }

    /// Step the cursor right, wrapping modulo the field's digit width.
    pub fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % self.field.digit_width();
    }

    /// Switch between rate and fixed charge; the cursor restarts.
    pub fn toggle_field(&mut self) {
        self.field = self.field.toggled();
        self.cursor = 0;
    }

    /// Bands available in the currently selected schedule.
    pub fn band_count(&self) -> usize {
        if self.domestic {
            DOMESTIC_BANDS
        } else {
            INDUSTRIAL_BANDS
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence request (written by handlers; drained by the service)
// ---------------------------------------------------------------------------

/// One-shot save request raised by the `*` key in the tariff editor.
#[derive(Debug, Default)]
pub struct PersistRequest {
    pending: bool,
}

impl PersistRequest {
    pub fn raise(&mut self) {
        self.pending = true;
    }

    /// Consume the request, returning whether one was pending.
    pub fn take(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

// ---------------------------------------------------------------------------
// MenuContext
// ---------------------------------------------------------------------------

/// The shared context passed to every screen handler function.
pub struct MenuContext {
    /// Latest sanitised electrical readings. Updated before each refresh.
    pub snapshot: MeterSnapshot,
    /// Live tariff schedule (RAM copy; durable only after a save).
    pub tariff: TariffTable,
    /// Tariff editor selection.
    pub selection: Selection,
    /// Lifetime energy total (kWh), mirrored from the accumulator.
    pub energy_kwh: f32,
    /// Derived bill for the active billing screen.
    pub bill: f32,
    /// System configuration (tunable parameters).
    pub config: SystemConfig,
    /// Save request raised by the editor's confirm key.
    pub persist: PersistRequest,
}

impl MenuContext {
    pub fn new(config: SystemConfig, tariff: TariffTable) -> Self {
        Self {
            snapshot: MeterSnapshot::default(),
            tariff,
            selection: Selection::default(),
            energy_kwh: 0.0,
            bill: 0.0,
            config,
            persist: PersistRequest::default(),
        }
    }
}
