//! Task Watchdog Timer (TWDT) wrapper.
//!
//! Resets the device if the control loop stalls. The main loop must call
//! `feed()` on every iteration.

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

/// Loop stall budget before the device resets.
#[cfg(target_os = "espidf")]
const TIMEOUT_MS: u32 = 10_000;

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::*;
            // SAFETY: TWDT configuration from the single main task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                if esp_task_wdt_reconfigure(&cfg) != ESP_OK {
                    log::warn!("watchdog: reconfigure failed (may already be armed)");
                }
                let subscribed = esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK;
                if subscribed {
                    log::info!("watchdog: armed, {TIMEOUT_MS} ms budget");
                } else {
                    log::warn!("watchdog: task subscription failed");
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        Self {}
    }

    /// Feed the watchdog. Must be called at least once per budget window.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: reset of the current subscribed task.
            unsafe {
                esp_idf_svc::sys::esp_task_wdt_reset();
            }
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
