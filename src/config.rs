//! System configuration parameters
//!
//! All tunable timing and threshold parameters for the meter.
//! Values can be overridden via NVS; the tariff schedule itself lives in
//! the EEPROM image (see `store`), not here.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Main loop / keypad poll period (milliseconds)
    pub key_poll_interval_ms: u32,
    /// Display refresh and billing recompute period (milliseconds)
    pub display_refresh_interval_ms: u32,
    /// Low-priority energy persistence period (seconds)
    pub energy_persist_interval_secs: u32,
    /// Hold-off after a manual energy reset fires (milliseconds)
    pub reset_holdoff_ms: u32,

    // --- Thresholds ---
    /// Below this measured voltage the load is treated as disconnected
    /// and every electrical reading is forced to zero for the tick
    pub min_live_voltage: f32,
    /// Supply/battery voltage below which a low-supply warning is raised
    pub low_supply_threshold_v: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            key_poll_interval_ms: 20,         // 50 Hz key scan
            display_refresh_interval_ms: 500, // 2 Hz display
            energy_persist_interval_secs: 60, // 1/min wear-leveled save
            reset_holdoff_ms: 750,

            // Thresholds
            min_live_voltage: 0.1,
            low_supply_threshold_v: 4.6,
        }
    }
}
