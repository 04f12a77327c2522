//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (metering IC, display, EEPROM, NVS, event sinks)
//! implement these traits. The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly. All port errors are typed — callers must handle every variant
//! explicitly, and no port failure is allowed to take the meter down.

use crate::config::SystemConfig;
use crate::display::DisplayFrame;

// ───────────────────────────────────────────────────────────────
// Metering IC port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the energy-monitor IC.
///
/// Every read returns NaN on a communication failure or implausible
/// measurement; the domain substitutes zeros (a meter must keep showing
/// *something*). `read_energy` reports kWh accumulated since the IC's own
/// counter was last reset — the domain layers its persisted offset on top.
pub trait MeterPort {
    fn read_voltage(&mut self) -> f32;
    fn read_current(&mut self) -> f32;
    fn read_active_power(&mut self) -> f32;
    fn read_power_factor(&mut self) -> f32;
    fn read_frequency(&mut self) -> f32;
    fn read_energy(&mut self) -> f32;

    /// Zero the IC's internal energy counter.
    fn reset_energy_counter(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Supply monitor port
// ───────────────────────────────────────────────────────────────

/// Narrow capability interface for the board's own supply rail.
/// Implementations read an ADC; the core never touches registers.
pub trait SupplyMonitorPort {
    /// Supply/battery voltage in volts; NaN if unavailable.
    fn read_supply_voltage(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Display port (domain → panel)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the 16×2 character panel.
/// Rendering is best-effort: implementations swallow bus errors.
pub trait DisplayPort {
    fn render(&mut self, frame: &DisplayFrame);
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ EEPROM byte range)
// ───────────────────────────────────────────────────────────────

/// Raw durable byte-range access. The schema (init flag, tariff record,
/// energy ring) lives entirely in [`crate::store`]; implementations only
/// move bytes.
pub trait StoragePort {
    /// Fill `buf` from `addr`.
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` at `addr` durably.
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Total addressable bytes.
    fn capacity(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration. Returns [`SystemConfig::default`] if no stored
    /// config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / observability)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log today;
/// the trait is the seam for anything else).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access past the end of the part.
    OutOfBounds,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
