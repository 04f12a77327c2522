//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — today that means the serial log.

use crate::menu::ScreenId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries the initial screen).
    Started(ScreenId),

    /// The menu moved between screens.
    ScreenChanged { from: ScreenId, to: ScreenId },

    /// A tariff edit was confirmed and written to storage.
    TariffSaved,

    /// The energy total was written to the wear-leveled ring.
    EnergyPersisted(f32),

    /// The lifetime energy total was reset to zero.
    EnergyReset,

    /// The supply rail dropped below the configured threshold.
    SupplyLow(f32),
}
