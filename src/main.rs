//! EMeter Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  MeterAdapter      Lcd1602        EepromAdapter   NvsAdapter   │
//! │  (Meter+Supply)    (DisplayPort)  (StoragePort)   (ConfigPort) │
//! │  KeypadDriver      ResetInput     LogEventSink                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Menu FSM · Billing · Energy · Persistence cadence     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop polls one key, samples the reset pin, runs one service tick,
//! then sleeps for the poll period. Every step runs to completion — the
//! shared state is touched by exactly one logical actor at a time.

#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use log::{info, warn};

use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::i2c::{config::Config as I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;

use emeter::adapters::display::{Lcd1602, DEFAULT_ADDR};
use emeter::adapters::eeprom::EepromAdapter;
use emeter::adapters::log_sink::LogEventSink;
use emeter::adapters::meter::MeterAdapter;
use emeter::adapters::nvs::NvsAdapter;
use emeter::app::ports::{ConfigPort, MeterPort};
use emeter::app::service::AppService;
use emeter::config::SystemConfig;
use emeter::drivers::keypad::KeypadDriver;
use emeter::drivers::reset_input::ResetInput;
use emeter::drivers::watchdog::Watchdog;
use emeter::pins;
use emeter::store::MeterStore;

/// EEPROM device address on I2C0.
const EEPROM_ADDR: u8 = 0x50;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("EMeter v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    let p = Peripherals::take().map_err(|e| anyhow!("peripherals: {e}"))?;

    // Pin choices mirror `pins.rs`
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(100_000));
    let eeprom_bus = I2cDriver::new(p.i2c0, p.pins.gpio13, p.pins.gpio14, &i2c_cfg)?;
    let lcd_bus = I2cDriver::new(p.i2c1, p.pins.gpio15, p.pins.gpio16, &i2c_cfg)?;

    let uart_cfg = UartConfig::new().baudrate(Hertz(pins::METER_UART_BAUD));
    let meter_uart = UartDriver::new(
        p.uart1,
        p.pins.gpio17,
        p.pins.gpio18,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        &uart_cfg,
    )?;

    let watchdog = Watchdog::new();

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({e}), running with defaults and no persistence");
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({e}), using defaults");
            SystemConfig::default()
        }
    };
    let poll_ms = config.key_poll_interval_ms;

    // ── 4. Durable meter state ────────────────────────────────
    let mut store = MeterStore::new(EepromAdapter::new(eeprom_bus, EEPROM_ADDR))
        .map_err(|e| anyhow!("storage: {e}"))?;
    let (tariff, offset) = store
        .load_or_init()
        .map_err(|e| anyhow!("storage load: {e}"))?;

    // ── 5. Remaining adapters and drivers ─────────────────────
    let mut meter = MeterAdapter::new(meter_uart);
    let mut panel = Lcd1602::new(lcd_bus, Delay::new_default(), DEFAULT_ADDR);
    if panel.init().is_err() {
        // Best-effort display: a dead panel must not stop metering
        warn!("lcd init failed, continuing headless");
    }
    let mut keypad = KeypadDriver::new();
    let mut reset_pin = ResetInput::new(config.reset_holdoff_ms);
    let mut sink = LogEventSink::new();

    // ── 6. Service bring-up ───────────────────────────────────
    let mut service = AppService::new(config, tariff, offset);
    // liveDelta starts at zero against the loaded offset
    meter.reset_energy_counter();
    service.start(&mut sink);

    // ── 7. Cooperative control loop ───────────────────────────
    loop {
        watchdog.feed();
        let now = now_ms();

        if let Some(key) = keypad.poll(now) {
            service.handle_key(key, &mut store, &mut sink);
        }
        if reset_pin.poll(now) {
            service.reset_energy(&mut meter, &mut store, &mut sink);
        }
        service.tick(&mut meter, &mut panel, &mut store, &mut sink);

        FreeRtos::delay_ms(poll_ms);
    }
}

/// Monotonic milliseconds since boot (wraps after ~49 days).
fn now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is callable from any task after boot.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32
}
