//! Tray-side logic for the battery monitor.
//!
//! Everything here is independent of the GUI backend:
//! - [`IconState`] / [`IconTable`]: which icon a reading maps to
//! - [`MenuState`]: the context menu contents
//! - [`Presenter`]: polls a sensor once per tick and reports what to display
//!
//! The application binds these to a real tray icon and timer.

mod icons;
mod menu;
mod presenter;

pub use icons::{IconState, IconTable, LEVEL_COUNT, bucket};
pub use menu::{MenuAction, MenuItem, MenuState};
pub use presenter::{DEFAULT_TOOLTIP, PollState, Presenter, TrayUpdate, tooltip};
