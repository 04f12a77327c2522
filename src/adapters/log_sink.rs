//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). Any other observability
//! backend would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(screen) => {
                info!("START | initial_screen={:?}", screen);
            }
            AppEvent::ScreenChanged { from, to } => {
                info!("SCREEN | {:?} -> {:?}", from, to);
            }
            AppEvent::TariffSaved => {
                info!("TARIFF | table persisted");
            }
            AppEvent::EnergyPersisted(kwh) => {
                info!("ENERGY | persisted {:.3} kWh", kwh);
            }
            AppEvent::EnergyReset => {
                info!("ENERGY | total reset to 0");
            }
            AppEvent::SupplyLow(v) => {
                warn!("SUPPLY | rail low at {:.2} V", v);
            }
        }
    }
}
