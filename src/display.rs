//! Display frame composition for the 16×2 character panel.
//!
//! The core only knows "two lines of fixed width". Each screen has one
//! compose function that formats the values it needs into a
//! [`DisplayFrame`]; the display adapter pushes frames to the panel
//! verbatim. The tariff editor's caret column is computed from the field
//! layout (digit width and decimal position), not queried from the panel.

use core::fmt::{self, Write as _};

use crate::menu::context::MenuContext;
use crate::menu::ScreenId;
use crate::tariff::EditField;

/// Character cells per display line.
pub const LINE_WIDTH: usize = 16;

/// One display line.
pub type Line = heapless::String<16>;

/// A fully composed 2-line frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFrame {
    pub line1: Line,
    pub line2: Line,
}

/// Column where an edited field's first digit is rendered
/// (`"D4 fixed "` = band tag, space, padded label, space).
const VALUE_COL: usize = 9;

/// Compose the frame for the given screen from the current context.
pub fn compose(screen: ScreenId, ctx: &MenuContext) -> DisplayFrame {
    match screen {
        ScreenId::BasicReadings => basic_readings(ctx),
        ScreenId::PowerReadings => power_readings(ctx),
        ScreenId::ApplianceMenu => appliance_menu(),
        ScreenId::DomesticBill => bill(ctx, "Dom"),
        ScreenId::IndustrialBill => bill(ctx, "Ind"),
        ScreenId::TariffMenu => tariff_menu(ctx),
        ScreenId::TariffEdit => tariff_edit(ctx),
    }
}

/// Display column of the edit caret for `cursor` within `field`.
/// Skips over the decimal point once the cursor passes the integer digits.
pub fn caret_column(field: EditField, cursor: u8) -> usize {
    VALUE_COL + usize::from(cursor) + usize::from(cursor >= field.int_digits())
}

fn line(args: fmt::Arguments) -> Line {
    let mut l = Line::new();
    // Overflow truncates at the panel edge; never an error path.
    let _ = l.write_fmt(args);
    l
}

fn basic_readings(ctx: &MenuContext) -> DisplayFrame {
    let s = &ctx.snapshot;
    DisplayFrame {
        line1: line(format_args!("{:5.1}V {:7.3}A", s.voltage, s.current)),
        line2: line(format_args!("{:8.2} kWh", ctx.energy_kwh)),
    }
}

fn power_readings(ctx: &MenuContext) -> DisplayFrame {
    let s = &ctx.snapshot;
    DisplayFrame {
        line1: line(format_args!("{:6.1}W pf{:4.2}", s.active_power, s.power_factor)),
        line2: line(format_args!("{:4.1}Hz {:6.1}VA", s.frequency, s.apparent_power)),
    }
}

fn appliance_menu() -> DisplayFrame {
    DisplayFrame {
        line1: line(format_args!("1 Domestic")),
        line2: line(format_args!("2 Industrial")),
    }
}

fn bill(ctx: &MenuContext, regime: &str) -> DisplayFrame {
    DisplayFrame {
        line1: line(format_args!("{} {:8.2}kWh", regime, ctx.energy_kwh)),
        line2: line(format_args!("Rs {:10.2}", ctx.bill)),
    }
}

fn tariff_menu(ctx: &MenuContext) -> DisplayFrame {
    let top = ctx.selection.band_count();
    DisplayFrame {
        line1: line(format_args!("Tariff band 1-{top}")),
        line2: line(format_args!("# back")),
    }
}

fn tariff_edit(ctx: &MenuContext) -> DisplayFrame {
    let sel = &ctx.selection;
    let band = ctx.tariff.band(sel.domestic, sel.band);
    let tag = if sel.domestic { 'D' } else { 'I' };
    let value = band.field(sel.field);

    let line1 = match sel.field {
        EditField::Rate => line(format_args!(
            "{}{} {:<5} {:05.2}",
            tag,
            sel.band + 1,
            sel.field.label(),
            value
        )),
        EditField::FixedCharge => line(format_args!(
            "{}{} {:<5} {:06.1}",
            tag,
            sel.band + 1,
            sel.field.label(),
            value
        )),
    };

    let mut line2 = Line::new();
    for _ in 0..caret_column(sel.field, sel.cursor) {
        let _ = line2.push(' ');
    }
    let _ = line2.push('^');

    DisplayFrame { line1, line2 }
}
