//! Input drivers and loop-supervision helpers.

pub mod keypad;
pub mod reset_input;
pub mod watchdog;
