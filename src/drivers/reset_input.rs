//! Manual energy-reset input.
//!
//! A level-triggered, active-low pin sampled once per loop iteration.
//! While the level is active the driver fires at most once per hold-off
//! window, so a finger on the button resets exactly once instead of once
//! per loop tick.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use crate::pins;

/// Simulated pin level (host backend). `true` = asserted.
#[cfg(not(target_os = "espidf"))]
static SIM_RESET: AtomicBool = AtomicBool::new(false);

/// Drive the simulated reset input.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_reset(asserted: bool) {
    SIM_RESET.store(asserted, Ordering::Relaxed);
}

pub struct ResetInput {
    holdoff_ms: u32,
    last_fire_ms: Option<u32>,
}

impl ResetInput {
    /// Construct the driver and (on target) claim the pin.
    pub fn new(holdoff_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        // SAFETY: single-threaded bring-up before the control loop starts.
        unsafe {
            use esp_idf_sys::*;
            gpio_set_direction(pins::RESET_GPIO, gpio_mode_t_GPIO_MODE_INPUT);
            gpio_set_pull_mode(pins::RESET_GPIO, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
        }
        Self {
            holdoff_ms,
            last_fire_ms: None,
        }
    }

    /// Sample the pin. Returns `true` when a reset should fire now.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if !Self::is_asserted() {
            return false;
        }
        if let Some(last) = self.last_fire_ms {
            if now_ms.wrapping_sub(last) < self.holdoff_ms {
                return false;
            }
        }
        self.last_fire_ms = Some(now_ms);
        true
    }

    #[cfg(target_os = "espidf")]
    fn is_asserted() -> bool {
        // SAFETY: plain GPIO read on the pin claimed in new.
        unsafe { esp_idf_sys::gpio_get_level(pins::RESET_GPIO) == 0 }
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_asserted() -> bool {
        SIM_RESET.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the sim level is a process global shared between
    // concurrent tests.
    #[test]
    fn fires_once_per_holdoff_window() {
        sim_set_reset(false);
        let mut input = ResetInput::new(500);
        assert!(!input.poll(0));

        sim_set_reset(true);
        assert!(input.poll(100), "first assertion fires");
        assert!(!input.poll(150), "held level suppressed inside hold-off");
        assert!(!input.poll(590));
        assert!(input.poll(700), "re-fires after the hold-off");

        sim_set_reset(false);
        assert!(!input.poll(1300));
        sim_set_reset(false);
    }
}
