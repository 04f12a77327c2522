//! Key-driven menu state machine.
//!
//! Classic embedded FSM pattern: a fixed table of per-screen handler
//! function pointers, no closures, no dynamic dispatch, no heap.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ScreenTable                                             │
//! │  ┌───────────────┬───────────┬─────────────────────────┐ │
//! │  │ ScreenId      │ on_enter  │ on_key                  │ │
//! │  ├───────────────┼───────────┼─────────────────────────┤ │
//! │  │ BasicReadings │ —         │ fn(ctx, key)->Option<>  │ │
//! │  │ PowerReadings │ —         │ fn(ctx, key)->Option<>  │ │
//! │  │ ...           │ fn(ctx)   │ fn(ctx, key)->Option<>  │ │
//! │  └───────────────┴───────────┴─────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine feeds each key event to the **current** screen's `on_key`.
//! A returned `Some(next)` runs the transition: update the pointer, then
//! `on_enter` for the next screen. Handlers receive `&mut MenuContext`
//! (selection, tariff table, readings, persistence request) and complete
//! synchronously — one key is fully processed before the next is examined.

pub mod context;
pub mod screens;

use context::MenuContext;
use log::info;

// ---------------------------------------------------------------------------
// Screen identity
// ---------------------------------------------------------------------------

/// Enumeration of the mutually exclusive UI screens.
/// Must stay in sync with the table built in [`screens::build_screen_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScreenId {
    BasicReadings = 0,
    PowerReadings = 1,
    ApplianceMenu = 2,
    DomesticBill = 3,
    IndustrialBill = 4,
    TariffMenu = 5,
    TariffEdit = 6,
}

impl ScreenId {
    /// Total number of screens — used to size the table array.
    pub const COUNT: usize = 7;

    /// Convert a `u8` index back to `ScreenId`. Panics on out-of-range in
    /// debug builds; returns `BasicReadings` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::BasicReadings,
            1 => Self::PowerReadings,
            2 => Self::ApplianceMenu,
            3 => Self::DomesticBill,
            4 => Self::IndustrialBill,
            5 => Self::TariffMenu,
            6 => Self::TariffEdit,
            _ => {
                debug_assert!(false, "invalid screen index: {idx}");
                Self::BasicReadings
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Key symbols
// ---------------------------------------------------------------------------

/// One debounced symbol from the 4×4 keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A numeric key, 0–9.
    Digit(u8),
    A,
    B,
    C,
    D,
    Star,
    Hash,
}

impl Key {
    /// Map a keypad legend character to a key symbol.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => Some(Self::Digit(c as u8 - b'0')),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            '*' => Some(Self::Star),
            '#' => Some(Self::Hash),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions — run once per transition into a screen.
pub type ScreenActionFn = fn(&mut MenuContext);

/// Signature for the per-key handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type KeyHandlerFn = fn(&mut MenuContext, Key) -> Option<ScreenId>;

// ---------------------------------------------------------------------------
// Screen descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single screen.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct ScreenDescriptor {
    pub id: ScreenId,
    pub name: &'static str,
    pub on_enter: Option<ScreenActionFn>,
    pub on_key: KeyHandlerFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The menu state machine engine.
///
/// Owns the screen table and tracks the active screen; the mutable
/// [`MenuContext`] is threaded through every handler call.
pub struct MenuFsm {
    /// Fixed-size table indexed by `ScreenId as usize`.
    table: [ScreenDescriptor; ScreenId::COUNT],
    /// Index of the currently active screen.
    current: usize,
}

impl MenuFsm {
    /// Construct the FSM with the given table, starting on `initial`.
    pub fn new(table: [ScreenDescriptor; ScreenId::COUNT], initial: ScreenId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting screen.
    /// Call once after construction, before the first key.
    pub fn start(&mut self, ctx: &mut MenuContext) {
        info!("menu starting on: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one key to the current screen's handler; execute the
    /// transition it requests, if any. Unrecognized keys are no-ops.
    pub fn handle_key(&mut self, key: Key, ctx: &mut MenuContext) {
        let next = (self.table[self.current].on_key)(ctx, key);
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current screen's identity.
    pub fn current_screen(&self) -> ScreenId {
        ScreenId::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ScreenId, ctx: &mut MenuContext) {
        let next_idx = next_id as usize;
        info!(
            "menu: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );
        self.current = next_idx;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
