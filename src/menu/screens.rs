//! Concrete screen handler functions and table builder.
//!
//! Each screen is a pair of plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  BASIC ◀──A──▶ POWER          BASIC ──B──▶ APPLIANCE
//!                                               │  │
//!                                        [1]    │  │   [2]
//!                                               ▼  ▼
//!                               DOMESTIC BILL      INDUSTRIAL BILL
//!                                     │  ▲              │  ▲
//!                                 [A] │  │ [#,*]    [A] │  │ [#,*]
//!                                     ▼  │              ▼  │
//!                               TARIFF MENU ──[band]──▶ TARIFF EDIT
//! ```
//!
//! `#` backs out of every sub-screen; `*` in the editor persists the
//! tariff table before leaving. Keys with no meaning on the current
//! screen are ignored.

use super::context::MenuContext;
use super::{Key, ScreenDescriptor, ScreenId};
use crate::billing;
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static screen table. Called once at startup.
pub fn build_screen_table() -> [ScreenDescriptor; ScreenId::COUNT] {
    [
        // Index 0 — BasicReadings
        ScreenDescriptor {
            id: ScreenId::BasicReadings,
            name: "BasicReadings",
            on_enter: None,
            on_key: basic_on_key,
        },
        // Index 1 — PowerReadings
        ScreenDescriptor {
            id: ScreenId::PowerReadings,
            name: "PowerReadings",
            on_enter: None,
            on_key: power_on_key,
        },
        // Index 2 — ApplianceMenu
        ScreenDescriptor {
            id: ScreenId::ApplianceMenu,
            name: "ApplianceMenu",
            on_enter: None,
            on_key: appliance_on_key,
        },
        // Index 3 — DomesticBill
        ScreenDescriptor {
            id: ScreenId::DomesticBill,
            name: "DomesticBill",
            on_enter: Some(domestic_bill_enter),
            on_key: bill_on_key,
        },
        // Index 4 — IndustrialBill
        ScreenDescriptor {
            id: ScreenId::IndustrialBill,
            name: "IndustrialBill",
            on_enter: Some(industrial_bill_enter),
            on_key: bill_on_key,
        },
        // Index 5 — TariffMenu
        ScreenDescriptor {
            id: ScreenId::TariffMenu,
            name: "TariffMenu",
            on_enter: None,
            on_key: tariff_menu_on_key,
        },
        // Index 6 — TariffEdit
        ScreenDescriptor {
            id: ScreenId::TariffEdit,
            name: "TariffEdit",
            on_enter: None,
            on_key: tariff_edit_on_key,
        },
    ]
}

/// The bill screen the current selection originated from.
fn bill_screen(ctx: &MenuContext) -> ScreenId {
    if ctx.selection.domestic {
        ScreenId::DomesticBill
    } else {
        ScreenId::IndustrialBill
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  BASIC / POWER readings
// ═══════════════════════════════════════════════════════════════════════════

fn basic_on_key(_ctx: &mut MenuContext, key: Key) -> Option<ScreenId> {
    match key {
        Key::A => Some(ScreenId::PowerReadings),
        Key::B => Some(ScreenId::ApplianceMenu),
        _ => None,
    }
}

fn power_on_key(_ctx: &mut MenuContext, key: Key) -> Option<ScreenId> {
    match key {
        Key::A => Some(ScreenId::BasicReadings),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  APPLIANCE MENU — pick the tariff regime
// ═══════════════════════════════════════════════════════════════════════════

fn appliance_on_key(ctx: &mut MenuContext, key: Key) -> Option<ScreenId> {
    match key {
        Key::Digit(1) => {
            ctx.selection.domestic = true;
            Some(ScreenId::DomesticBill)
        }
        Key::Digit(2) => {
            ctx.selection.domestic = false;
            Some(ScreenId::IndustrialBill)
        }
        Key::Hash => Some(ScreenId::BasicReadings),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  BILL screens — shared key handler, per-regime recompute on entry
// ═══════════════════════════════════════════════════════════════════════════

fn domestic_bill_enter(ctx: &mut MenuContext) {
    ctx.bill = billing::domestic_bill(ctx.energy_kwh, &ctx.tariff);
}

fn industrial_bill_enter(ctx: &mut MenuContext) {
    ctx.bill = billing::industrial_bill(ctx.energy_kwh, &ctx.tariff);
}

fn bill_on_key(_ctx: &mut MenuContext, key: Key) -> Option<ScreenId> {
    match key {
        Key::A => Some(ScreenId::TariffMenu),
        Key::Hash => Some(ScreenId::BasicReadings),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TARIFF MENU — pick a band of the selected schedule
// ═══════════════════════════════════════════════════════════════════════════

fn tariff_menu_on_key(ctx: &mut MenuContext, key: Key) -> Option<ScreenId> {
    match key {
        Key::Digit(d @ 1..=9) => {
            let index = usize::from(d) - 1;
            if index >= ctx.selection.band_count() {
                return None;
            }
            ctx.selection.select_band(index);
            info!(
                "tariff edit: {} band {}",
                if ctx.selection.domestic { "domestic" } else { "industrial" },
                d
            );
            Some(ScreenId::TariffEdit)
        }
        Key::Hash => Some(bill_screen(ctx)),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  TARIFF EDIT — digit-level in-place editing of the selected band
// ═══════════════════════════════════════════════════════════════════════════

fn tariff_edit_on_key(ctx: &mut MenuContext, key: Key) -> Option<ScreenId> {
    match key {
        Key::D => {
            ctx.selection.advance_cursor();
            None
        }
        Key::C => {
            ctx.selection.toggle_field();
            None
        }
        Key::Digit(d) => {
            let sel = ctx.selection;
            ctx.tariff
                .edit_digit(sel.domestic, sel.band, sel.field, sel.cursor, d);
            None
        }
        Key::Star => {
            // Make the edit durable; the service drains the request.
            ctx.persist.raise();
            info!("tariff edit confirmed");
            Some(bill_screen(ctx))
        }
        Key::Hash => {
            info!("tariff edit closed without saving");
            Some(bill_screen(ctx))
        }
        _ => None,
    }
}
