//! Energy-monitor adapter: PZEM-004T v3 over UART (Modbus RTU), plus the
//! board's supply-rail ADC.
//!
//! Implements [`MeterPort`] and [`SupplyMonitorPort`].
//!
//! Every electrical quantity is one small Modbus input-register read; a
//! failed or garbled transaction returns NaN and the domain substitutes
//! zero. The energy register counts Wh since the IC's internal counter
//! was last reset (command `0x42`), which is exactly the live-delta
//! contract the accumulator expects.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: UART transactions against the real IC and a raw ADC read
//! for the supply rail. On host/test: every quantity is injected through
//! a static atomic (`sim_set_*`), mirroring the IC's register file.

use crate::app::ports::{MeterPort, SupplyMonitorPort};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Modbus framing ────────────────────────────────────────────

/// Default single-device address of the PZEM-004T.
#[cfg(target_os = "espidf")]
const DEVICE_ADDR: u8 = 0xF8;
#[cfg(target_os = "espidf")]
const FN_READ_INPUT: u8 = 0x04;
#[cfg(target_os = "espidf")]
const FN_RESET_ENERGY: u8 = 0x42;
/// Response timeout in FreeRTOS ticks (default tick = 10 ms).
#[cfg(target_os = "espidf")]
const RESPONSE_TIMEOUT_TICKS: u32 = 10;

// Input register map (16-bit registers, 32-bit quantities low-word first)
#[cfg(target_os = "espidf")]
const REG_VOLTAGE: u16 = 0x0000; // 0.1 V
#[cfg(target_os = "espidf")]
const REG_CURRENT: u16 = 0x0001; // 0.001 A, 32-bit
#[cfg(target_os = "espidf")]
const REG_POWER: u16 = 0x0003; // 0.1 W, 32-bit
#[cfg(target_os = "espidf")]
const REG_ENERGY: u16 = 0x0005; // 1 Wh, 32-bit
#[cfg(target_os = "espidf")]
const REG_FREQUENCY: u16 = 0x0007; // 0.1 Hz
#[cfg(target_os = "espidf")]
const REG_POWER_FACTOR: u16 = 0x0008; // 0.01

/// CRC-16/MODBUS over a frame (poly 0xA001 reflected, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

// ── Host simulation backend ───────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::{AtomicU32, Ordering};

    pub static VOLTAGE: AtomicU32 = AtomicU32::new(0);
    pub static CURRENT: AtomicU32 = AtomicU32::new(0);
    pub static POWER: AtomicU32 = AtomicU32::new(0);
    pub static POWER_FACTOR: AtomicU32 = AtomicU32::new(0);
    pub static FREQUENCY: AtomicU32 = AtomicU32::new(0);
    pub static ENERGY: AtomicU32 = AtomicU32::new(0);
    pub static SUPPLY: AtomicU32 = AtomicU32::new(0);

    pub fn set(cell: &AtomicU32, value: f32) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(cell: &AtomicU32) -> f32 {
        f32::from_bits(cell.load(Ordering::Relaxed))
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_voltage(v: f32) {
    sim::set(&sim::VOLTAGE, v);
}
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_current(a: f32) {
    sim::set(&sim::CURRENT, a);
}
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_active_power(w: f32) {
    sim::set(&sim::POWER, w);
}
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_power_factor(pf: f32) {
    sim::set(&sim::POWER_FACTOR, pf);
}
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_frequency(hz: f32) {
    sim::set(&sim::FREQUENCY, hz);
}
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_energy(kwh: f32) {
    sim::set(&sim::ENERGY, kwh);
}
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_supply_voltage(v: f32) {
    sim::set(&sim::SUPPLY, v);
}

// ── Adapter ───────────────────────────────────────────────────

pub struct MeterAdapter {
    #[cfg(target_os = "espidf")]
    uart: esp_idf_hal::uart::UartDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl MeterAdapter {
    /// Wrap the UART the metering IC is wired to and configure the
    /// supply-rail ADC channel.
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        // SAFETY: legacy oneshot ADC configuration, called once from the
        // single main-task context before any reads.
        unsafe {
            use esp_idf_sys::*;
            adc1_config_width(adc_bits_width_t_ADC_WIDTH_BIT_12);
            adc1_config_channel_atten(pins::SUPPLY_ADC_CHANNEL, adc_atten_t_ADC_ATTEN_DB_11);
        }
        Self { uart }
    }

    /// One Modbus input-register read. Returns `false` (leaving `out`
    /// unspecified) on timeout, short response, or CRC mismatch.
    fn read_regs(&mut self, reg: u16, out: &mut [u16]) -> bool {
        let count = out.len() as u16;
        let mut request = [0u8; 8];
        request[0] = DEVICE_ADDR;
        request[1] = FN_READ_INPUT;
        request[2..4].copy_from_slice(&reg.to_be_bytes());
        request[4..6].copy_from_slice(&count.to_be_bytes());
        let crc = crc16(&request[..6]);
        request[6..8].copy_from_slice(&crc.to_le_bytes());

        if self.uart.write(&request).is_err() {
            return false;
        }

        let expected = 5 + 2 * out.len();
        let mut response = [0u8; 16];
        let Ok(n) = self.uart.read(&mut response[..expected], RESPONSE_TIMEOUT_TICKS) else {
            return false;
        };
        if n != expected
            || response[0] != DEVICE_ADDR
            || response[1] != FN_READ_INPUT
            || usize::from(response[2]) != 2 * out.len()
        {
            return false;
        }
        let crc = crc16(&response[..expected - 2]);
        if response[expected - 2..expected] != crc.to_le_bytes() {
            return false;
        }

        for (i, slot) in out.iter_mut().enumerate() {
            *slot = u16::from_be_bytes([response[3 + 2 * i], response[4 + 2 * i]]);
        }
        true
    }

    fn read_u16(&mut self, reg: u16) -> Option<u16> {
        let mut out = [0u16; 1];
        self.read_regs(reg, &mut out).then_some(out[0])
    }

    /// 32-bit quantity, low word first.
    fn read_u32(&mut self, reg: u16) -> Option<u32> {
        let mut out = [0u16; 2];
        self.read_regs(reg, &mut out)
            .then_some(u32::from(out[0]) | u32::from(out[1]) << 16)
    }
}

#[cfg(not(target_os = "espidf"))]
impl MeterAdapter {
    pub fn new() -> Self {
        Self {}
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for MeterAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterPort for MeterAdapter {
    #[cfg(target_os = "espidf")]
    fn read_voltage(&mut self) -> f32 {
        self.read_u16(REG_VOLTAGE)
            .map_or(f32::NAN, |r| f32::from(r) * 0.1)
    }

    #[cfg(target_os = "espidf")]
    fn read_current(&mut self) -> f32 {
        self.read_u32(REG_CURRENT)
            .map_or(f32::NAN, |r| r as f32 * 0.001)
    }

    #[cfg(target_os = "espidf")]
    fn read_active_power(&mut self) -> f32 {
        self.read_u32(REG_POWER).map_or(f32::NAN, |r| r as f32 * 0.1)
    }

    #[cfg(target_os = "espidf")]
    fn read_power_factor(&mut self) -> f32 {
        self.read_u16(REG_POWER_FACTOR)
            .map_or(f32::NAN, |r| f32::from(r) * 0.01)
    }

    #[cfg(target_os = "espidf")]
    fn read_frequency(&mut self) -> f32 {
        self.read_u16(REG_FREQUENCY)
            .map_or(f32::NAN, |r| f32::from(r) * 0.1)
    }

    #[cfg(target_os = "espidf")]
    fn read_energy(&mut self) -> f32 {
        // register unit is Wh
        self.read_u32(REG_ENERGY)
            .map_or(f32::NAN, |r| r as f32 * 0.001)
    }

    #[cfg(target_os = "espidf")]
    fn reset_energy_counter(&mut self) {
        let mut frame = [DEVICE_ADDR, FN_RESET_ENERGY, 0, 0];
        let crc = crc16(&frame[..2]);
        frame[2..4].copy_from_slice(&crc.to_le_bytes());
        if self.uart.write(&frame).is_err() {
            log::warn!("meter: energy counter reset command failed");
        }
        // Drain the (echo-shaped) acknowledgement; content is irrelevant.
        let mut ack = [0u8; 4];
        let _ = self.uart.read(&mut ack, RESPONSE_TIMEOUT_TICKS);
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_voltage(&mut self) -> f32 {
        sim::get(&sim::VOLTAGE)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_current(&mut self) -> f32 {
        sim::get(&sim::CURRENT)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_active_power(&mut self) -> f32 {
        sim::get(&sim::POWER)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_power_factor(&mut self) -> f32 {
        sim::get(&sim::POWER_FACTOR)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frequency(&mut self) -> f32 {
        sim::get(&sim::FREQUENCY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_energy(&mut self) -> f32 {
        sim::get(&sim::ENERGY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn reset_energy_counter(&mut self) {
        sim::set(&sim::ENERGY, 0.0);
    }
}

impl SupplyMonitorPort for MeterAdapter {
    #[cfg(target_os = "espidf")]
    fn read_supply_voltage(&mut self) -> f32 {
        // SAFETY: oneshot read on a channel configured in `new`.
        let raw = unsafe { esp_idf_sys::adc1_get_raw(pins::SUPPLY_ADC_CHANNEL) };
        if raw < 0 {
            return f32::NAN;
        }
        raw as f32 / 4095.0 * 3.3 * pins::SUPPLY_DIVIDER
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_supply_voltage(&mut self) -> f32 {
        sim::get(&sim::SUPPLY)
    }
}
