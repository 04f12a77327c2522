//! GPIO / peripheral pin assignments for the EMeter main board.
//!
//! Single source of truth — every driver references this module rather
//! than hard-coding pin numbers. The typed esp-idf-hal peripherals in
//! `main` follow the same assignments.

// ---------------------------------------------------------------------------
// 4×4 membrane keypad (matrix scan)
// ---------------------------------------------------------------------------

/// Row drive lines (outputs, scanned low one at a time).
pub const KEYPAD_ROW_GPIOS: [i32; 4] = [4, 5, 6, 7];
/// Column sense lines (inputs with pull-ups).
pub const KEYPAD_COL_GPIOS: [i32; 4] = [8, 9, 10, 11];

// ---------------------------------------------------------------------------
// Manual energy reset (momentary switch, active low)
// ---------------------------------------------------------------------------

pub const RESET_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// I²C buses
// ---------------------------------------------------------------------------

/// I2C0 — AT24C32 EEPROM (device address 0x50).
pub const EEPROM_SDA_GPIO: i32 = 13;
pub const EEPROM_SCL_GPIO: i32 = 14;

/// I2C1 — HD44780 panel behind a PCF8574 backpack (address 0x27).
pub const LCD_SDA_GPIO: i32 = 15;
pub const LCD_SCL_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Metering IC (PZEM-004T v3, UART1 @ 9600 8N1)
// ---------------------------------------------------------------------------

pub const METER_UART_TX_GPIO: i32 = 17;
pub const METER_UART_RX_GPIO: i32 = 18;
pub const METER_UART_BAUD: u32 = 9600;

// ---------------------------------------------------------------------------
// Supply-rail monitor (resistive divider into ADC1)
// ---------------------------------------------------------------------------

/// ADC1 channel the divider feeds (GPIO 3 on ESP32-S3).
#[cfg(target_os = "espidf")]
pub const SUPPLY_ADC_CHANNEL: esp_idf_sys::adc1_channel_t =
    esp_idf_sys::adc1_channel_t_ADC1_CHANNEL_2;
/// Divider ratio back to the real rail voltage.
pub const SUPPLY_DIVIDER: f32 = 2.0;
