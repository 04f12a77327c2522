//! 4×4 matrix keypad driver with debounce.
//!
//! ## Hardware
//!
//! Row lines are driven low one at a time; column lines idle high on
//! pull-ups. A pressed key pulls its column low while its row is driven.
//! Scanning happens inside `poll()`, called from the main loop at
//! key-poll rate.
//!
//! ## Debounce state machine
//!
//! ```text
//!  Idle ──contact──▶ Debounce ──stable ≥ 30ms──▶ Held (emit once)
//!    ▲                  │  ▲                       │
//!    └────released──────┘  └──different contact────┘
//! ```
//!
//! One [`Key`] is emitted per stable press; auto-repeat is deliberately
//! absent (a tariff digit must not repeat while held).

use crate::menu::Key;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(target_os = "espidf")]
use crate::pins;

const DEBOUNCE_MS: u32 = 30;

/// Key legend, row-major, matching the membrane pad silkscreen.
pub const KEYMAP: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Simulated raw contact (ASCII legend; 0 = none). Written by tests,
/// read by the host scan path.
#[cfg(not(target_os = "espidf"))]
static SIM_KEY: AtomicU8 = AtomicU8::new(0);

/// Inject a held-down key into the host scan path.
#[cfg(not(target_os = "espidf"))]
pub fn sim_press_key(legend: char) {
    SIM_KEY.store(legend as u8, Ordering::Relaxed);
}

/// Release the simulated key.
#[cfg(not(target_os = "espidf"))]
pub fn sim_release_key() {
    SIM_KEY.store(0, Ordering::Relaxed);
}

/// Internal debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Debounce { legend: char, since_ms: u32 },
    Held { legend: char },
}

pub struct KeypadDriver {
    state: ScanState,
}

impl KeypadDriver {
    /// Construct the driver and (on target) claim the matrix GPIOs.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        Self::init_pins();
        Self {
            state: ScanState::Idle,
        }
    }

    /// Call from the main loop every key-poll tick.
    /// `now_ms` is the current monotonic time in milliseconds.
    /// Returns one debounced key per stable press.
    pub fn poll(&mut self, now_ms: u32) -> Option<Key> {
        let raw = Self::scan_raw();

        match self.state {
            ScanState::Idle => {
                if let Some(legend) = raw {
                    self.state = ScanState::Debounce {
                        legend,
                        since_ms: now_ms,
                    };
                }
                None
            }

            ScanState::Debounce { legend, since_ms } => match raw {
                Some(current) if current == legend => {
                    if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                        self.state = ScanState::Held { legend };
                        Key::from_char(legend)
                    } else {
                        None
                    }
                }
                Some(current) => {
                    // Bounced onto a different contact: restart
                    self.state = ScanState::Debounce {
                        legend: current,
                        since_ms: now_ms,
                    };
                    None
                }
                None => {
                    self.state = ScanState::Idle;
                    None
                }
            },

            ScanState::Held { legend } => match raw {
                Some(current) if current == legend => None,
                Some(current) => {
                    self.state = ScanState::Debounce {
                        legend: current,
                        since_ms: now_ms,
                    };
                    None
                }
                None => {
                    self.state = ScanState::Idle;
                    None
                }
            },
        }
    }

    // ── Raw matrix scan ───────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn init_pins() {
        // SAFETY: single-threaded bring-up before the control loop starts.
        unsafe {
            use esp_idf_sys::*;
            for &row in &pins::KEYPAD_ROW_GPIOS {
                gpio_set_direction(row, gpio_mode_t_GPIO_MODE_OUTPUT);
                gpio_set_level(row, 1);
            }
            for &col in &pins::KEYPAD_COL_GPIOS {
                gpio_set_direction(col, gpio_mode_t_GPIO_MODE_INPUT);
                gpio_set_pull_mode(col, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn scan_raw() -> Option<char> {
        // SAFETY: plain GPIO pokes on pins claimed in init_pins.
        unsafe {
            use esp_idf_sys::*;
            let mut hit = None;
            for (r, &row) in pins::KEYPAD_ROW_GPIOS.iter().enumerate() {
                gpio_set_level(row, 0);
                esp_rom_delay_us(5);
                for (c, &col) in pins::KEYPAD_COL_GPIOS.iter().enumerate() {
                    if gpio_get_level(col) == 0 {
                        hit = Some(KEYMAP[r][c]);
                    }
                }
                gpio_set_level(row, 1);
                if hit.is_some() {
                    break;
                }
            }
            hit
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn scan_raw() -> Option<char> {
        match SIM_KEY.load(Ordering::Relaxed) {
            0 => None,
            b => Some(b as char),
        }
    }
}

impl Default for KeypadDriver {
    fn default() -> Self {
        Self::new()
    }
}
