//! Tiered billing: accumulated energy + tariff table → currency amount.
//!
//! Both entry points are pure functions of their arguments — no hidden
//! state, deterministic, safe to recompute on every display-refresh tick.
//! Negative or NaN energy is normalised upstream (the accumulator's
//! contract) and is not handled here.

use crate::tariff::TariffTable;

/// Progressive domestic bill.
///
/// Band boundaries come from the table's `max_kwh` caps:
///
/// * `E ≤ cap0` — lifeline slab: `E · rate0 + fixed0`.
/// * `cap0 < E ≤ cap1` — two-slab split, band 1's fixed charge.
/// * `E > cap1` — the first `cap2` kWh are repriced at band 2's rate, then
///   each higher band charges the portion of `E` falling inside it. The
///   highest band actually reached supplies the fixed charge.
pub fn domestic_bill(energy_kwh: f32, table: &TariffTable) -> f32 {
    let d = &table.domestic;
    let cap0 = d[0].max_kwh as f32;
    let cap1 = d[1].max_kwh as f32;

    if energy_kwh <= cap0 {
        return energy_kwh * d[0].rate + d[0].fixed_charge;
    }
    if energy_kwh <= cap1 {
        return cap0 * d[0].rate + (energy_kwh - cap0) * d[1].rate + d[1].fixed_charge;
    }

    let mut amount = d[2].max_kwh as f32 * d[2].rate;
    let mut fixed = d[2].fixed_charge;
    let mut lower = d[2].max_kwh as f32;
    for b in &d[3..] {
        if energy_kwh <= lower {
            break;
        }
        let cap = b.max_kwh as f32;
        amount += (energy_kwh.min(cap) - lower) * b.rate;
        fixed = b.fixed_charge;
        lower = cap;
    }
    amount + fixed
}

/// Two-tier industrial bill, split at `industrial[0].max_kwh`.
pub fn industrial_bill(energy_kwh: f32, table: &TariffTable) -> f32 {
    let [t0, t1] = &table.industrial;
    let cap = t0.max_kwh as f32;
    if energy_kwh <= cap {
        energy_kwh * t0.rate + t0.fixed_charge
    } else {
        cap * t0.rate + (energy_kwh - cap) * t1.rate + t1.fixed_charge
    }
}
