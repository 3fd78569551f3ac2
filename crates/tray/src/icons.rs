//! Icon lookup table.
//!
//! Asset file names are fixed; installed icon sets are expected to provide
//! every one of them.

use std::fmt;

use batterytray_sensor::Reading;

/// Number of charge-level icons (`battery_0.png` .. `battery_7.png`).
pub const LEVEL_COUNT: u8 = 8;

/// Lower bound (inclusive) of charge levels 1 through 7.
const LEVEL_THRESHOLDS: [u8; LEVEL_COUNT as usize - 1] = [15, 30, 45, 60, 75, 85, 95];

const LEVEL_FILES: [&str; LEVEL_COUNT as usize] = [
    "battery_0.png",
    "battery_1.png",
    "battery_2.png",
    "battery_3.png",
    "battery_4.png",
    "battery_5.png",
    "battery_6.png",
    "battery_7.png",
];

const LEVEL_LABELS: [&str; LEVEL_COUNT as usize] =
    ["Empty", "Low", "29%", "43%", "57%", "71%", "86%", "Full"];

/// Charge level bucket for a percentage; never decreases as `percent` grows.
pub fn bucket(percent: u8) -> u8 {
    LEVEL_THRESHOLDS
        .iter()
        .take_while(|&&lower| percent >= lower)
        .count() as u8
}

/// Icon shown in the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconState {
    /// Charge level bucket, `0..LEVEL_COUNT`.
    Level(u8),
    Charging,
    /// Battery critically low.
    Alert,
    /// No successful reading yet.
    Unknown,
}

impl IconState {
    /// Every state, in table order.
    pub const ALL: [IconState; LEVEL_COUNT as usize + 3] = [
        IconState::Level(0),
        IconState::Level(1),
        IconState::Level(2),
        IconState::Level(3),
        IconState::Level(4),
        IconState::Level(5),
        IconState::Level(6),
        IconState::Level(7),
        IconState::Charging,
        IconState::Alert,
        IconState::Unknown,
    ];

    /// Picks the icon for a reading. Charging wins over critical, critical
    /// wins over the charge level.
    pub fn for_reading(reading: &Reading) -> Self {
        if reading.charging {
            IconState::Charging
        } else if reading.critical {
            IconState::Alert
        } else {
            IconState::Level(bucket(reading.percent))
        }
    }

    /// Position in [`IconState::ALL`].
    pub fn index(self) -> usize {
        match self {
            IconState::Level(n) => n.min(LEVEL_COUNT - 1) as usize,
            IconState::Charging => LEVEL_COUNT as usize,
            IconState::Alert => LEVEL_COUNT as usize + 1,
            IconState::Unknown => LEVEL_COUNT as usize + 2,
        }
    }

    /// Asset file name.
    pub fn file_name(self) -> &'static str {
        match self {
            IconState::Level(_) => LEVEL_FILES[self.index()],
            IconState::Charging => "battery_charging.png",
            IconState::Alert => "battery_alert.png",
            IconState::Unknown => "battery_unknown.png",
        }
    }

    /// Short human-readable name used in logs.
    pub fn label(self) -> &'static str {
        match self {
            IconState::Level(_) => LEVEL_LABELS[self.index()],
            IconState::Charging => "Charging",
            IconState::Alert => "Alert",
            IconState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for IconState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.label())
    }
}

/// Immutable per-state table of loaded icons, built once at startup.
pub struct IconTable<T> {
    entries: Vec<Option<T>>,
}

impl<T> IconTable<T> {
    /// Builds the table by calling `load` once per state. States for which
    /// `load` returns `None` are left empty.
    pub fn load(mut load: impl FnMut(IconState) -> Option<T>) -> Self {
        Self {
            entries: IconState::ALL.iter().map(|&state| load(state)).collect(),
        }
    }

    pub fn get(&self, state: IconState) -> Option<&T> {
        self.entries.get(state.index()).and_then(Option::as_ref)
    }

    /// States with no loaded icon.
    pub fn missing(&self) -> Vec<IconState> {
        IconState::ALL
            .iter()
            .copied()
            .filter(|&state| self.get(state).is_none())
            .collect()
    }
}
