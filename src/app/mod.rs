//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules of the meter: menu FSM
//! orchestration, energy accumulation, billing recompute, and the
//! persistence cadence. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
