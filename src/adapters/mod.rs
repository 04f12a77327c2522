//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements        | Connects to                     |
//! |------------|-------------------|---------------------------------|
//! | `eeprom`   | StoragePort       | AT24C32 I²C EEPROM / byte image |
//! | `meter`    | MeterPort         | PZEM-004T over UART (Modbus)    |
//! |            | SupplyMonitorPort | supply-rail ADC                 |
//! | `display`  | DisplayPort       | HD44780 16×2 via PCF8574 I²C    |
//! | `nvs`      | ConfigPort        | NVS / in-memory store           |
//! | `log_sink` | EventSink         | Serial log output               |
//!
//! Every adapter has a host-simulation backend so the full control loop
//! runs in tests without hardware.

pub mod display;
pub mod eeprom;
pub mod log_sink;
pub mod meter;
pub mod nvs;
