//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the menu FSM, the shared context, and the energy
//! accumulator. It exposes a clean, hardware-agnostic API; all I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!    MeterPort ──▶ ┌────────────────────────┐ ──▶ DisplayPort
//!                  │       AppService        │
//!   key events ──▶ │  Menu · Billing · Ring  │ ──▶ EventSink
//!                  └───────────┬────────────┘
//!                              ▼
//!                         StoragePort
//! ```
//!
//! One `tick()` per main-loop iteration; the display refresh and the
//! low-priority energy persist run on their own cadences derived from the
//! loop period. Everything runs to completion — one key or tick finishes
//! before the next is examined.

use log::{info, warn};

use crate::billing;
use crate::config::SystemConfig;
use crate::display;
use crate::energy::EnergyAccumulator;
use crate::menu::context::{MenuContext, MeterSnapshot};
use crate::menu::screens::build_screen_table;
use crate::menu::{Key, MenuFsm, ScreenId};
use crate::store::MeterStore;

use super::events::AppEvent;
use super::ports::{DisplayPort, EventSink, MeterPort, StoragePort, SupplyMonitorPort};

/// Hysteresis band above the low-supply threshold before the warning
/// re-arms.
const SUPPLY_HYSTERESIS_V: f32 = 0.2;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: MenuFsm,
    ctx: MenuContext,
    energy: EnergyAccumulator,
    /// Loop ticks between display refreshes.
    refresh_period_ticks: u64,
    /// Loop ticks between energy persists.
    persist_period_ticks: u64,
    tick_count: u64,
    last_refresh_tick: u64,
    last_persist_tick: u64,
    supply_low: bool,
}

impl AppService {
    /// Construct the service from configuration and the state loaded from
    /// storage. Does **not** run the initial screen — call [`start`] next.
    ///
    /// [`start`]: Self::start
    pub fn new(config: SystemConfig, tariff: crate::tariff::TariffTable, offset_kwh: f32) -> Self {
        let poll_ms = u64::from(config.key_poll_interval_ms.max(1));
        let refresh_period_ticks = (u64::from(config.display_refresh_interval_ms) / poll_ms).max(1);
        let persist_period_ticks =
            (u64::from(config.energy_persist_interval_secs) * 1000 / poll_ms).max(1);

        let energy = EnergyAccumulator::new(offset_kwh);
        let mut ctx = MenuContext::new(config, tariff);
        ctx.energy_kwh = energy.total();

        Self {
            fsm: MenuFsm::new(build_screen_table(), ScreenId::BasicReadings),
            ctx,
            energy,
            refresh_period_ticks,
            persist_period_ticks,
            tick_count: 0,
            last_refresh_tick: 0,
            last_persist_tick: 0,
            supply_low: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial screen's `on_enter` and announce the start.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_screen()));
        info!("AppService started on {:?}", self.fsm.current_screen());
    }

    // ── Key handling ──────────────────────────────────────────

    /// Route one debounced key into the menu, then execute any persistence
    /// request the handler raised (`*` in the tariff editor).
    pub fn handle_key(
        &mut self,
        key: Key,
        store: &mut MeterStore<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        let prev = self.fsm.current_screen();
        self.fsm.handle_key(key, &mut self.ctx);

        if self.ctx.persist.take() {
            let total = self.energy.total();
            match store.save(&self.ctx.tariff, total) {
                Ok(()) => {
                    sink.emit(&AppEvent::TariffSaved);
                    sink.emit(&AppEvent::EnergyPersisted(total));
                }
                Err(e) => warn!("tariff persist failed: {e}"),
            }
        }

        let now = self.fsm.current_screen();
        if now != prev {
            sink.emit(&AppEvent::ScreenChanged { from: prev, to: now });
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop tick. The display refresh and the energy persist each
    /// fire when their own period has elapsed; the first tick renders
    /// immediately so the panel is never blank.
    ///
    /// The `hw` parameter satisfies **both** [`MeterPort`] and
    /// [`SupplyMonitorPort`] — this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl MeterPort + SupplyMonitorPort),
        panel: &mut impl DisplayPort,
        store: &mut MeterStore<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        if self.tick_count == 1
            || self.tick_count - self.last_refresh_tick >= self.refresh_period_ticks
        {
            self.last_refresh_tick = self.tick_count;
            self.refresh(hw, panel, sink);
        }

        if self.tick_count - self.last_persist_tick >= self.persist_period_ticks {
            self.last_persist_tick = self.tick_count;
            let total = self.energy.total();
            match store.save(&self.ctx.tariff, total) {
                Ok(()) => sink.emit(&AppEvent::EnergyPersisted(total)),
                Err(e) => warn!("periodic energy persist failed: {e}"),
            }
        }
    }

    /// Manual reset: zero the accumulator, zero the IC's counter, rewind
    /// the wear-leveling ring, persist immediately.
    pub fn reset_energy(
        &mut self,
        hw: &mut impl MeterPort,
        store: &mut MeterStore<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        self.energy.clear();
        hw.reset_energy_counter();
        self.ctx.energy_kwh = 0.0;
        match store.reset_energy(&self.ctx.tariff) {
            Ok(()) => {
                info!("energy total reset");
                sink.emit(&AppEvent::EnergyReset);
            }
            Err(e) => warn!("reset persist failed: {e}"),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// The active screen.
    pub fn screen(&self) -> ScreenId {
        self.fsm.current_screen()
    }

    /// Lifetime energy total in kWh.
    pub fn energy_kwh(&self) -> f32 {
        self.energy.total()
    }

    /// Bill shown on the active billing screen.
    pub fn bill(&self) -> f32 {
        self.ctx.bill
    }

    /// The live (RAM) tariff table.
    pub fn tariff(&self) -> &crate::tariff::TariffTable {
        &self.ctx.tariff
    }

    /// Total loop ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn refresh(
        &mut self,
        hw: &mut (impl MeterPort + SupplyMonitorPort),
        panel: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Fresh electrical snapshot, sanitised
        self.ctx.snapshot = MeterSnapshot::from_raw(
            hw.read_voltage(),
            hw.read_current(),
            hw.read_active_power(),
            hw.read_power_factor(),
            hw.read_frequency(),
            self.ctx.config.min_live_voltage,
        );

        // 2. Energy accumulation
        self.energy.tick(hw.read_energy());
        self.ctx.energy_kwh = self.energy.total();

        // 3. Billing recompute while a billing screen is shown
        match self.fsm.current_screen() {
            ScreenId::DomesticBill => {
                self.ctx.bill = billing::domestic_bill(self.ctx.energy_kwh, &self.ctx.tariff);
            }
            ScreenId::IndustrialBill => {
                self.ctx.bill = billing::industrial_bill(self.ctx.energy_kwh, &self.ctx.tariff);
            }
            _ => {}
        }

        // 4. Render
        let frame = display::compose(self.fsm.current_screen(), &self.ctx);
        panel.render(&frame);

        // 5. Supply rail check
        self.check_supply(hw, sink);
    }

    fn check_supply(&mut self, hw: &mut impl SupplyMonitorPort, sink: &mut impl EventSink) {
        let v = hw.read_supply_voltage();
        if !v.is_finite() {
            return;
        }
        let threshold = self.ctx.config.low_supply_threshold_v;
        if v < threshold {
            if !self.supply_low {
                self.supply_low = true;
                warn!("supply voltage low: {v:.2} V");
                sink.emit(&AppEvent::SupplyLow(v));
            }
        } else if self.supply_low && v > threshold + SUPPLY_HYSTERESIS_V {
            self.supply_low = false;
            info!("supply voltage recovered: {v:.2} V");
        }
    }
}
