//! Polling presenter: sensor reading in, tray update out.
//!
//! The presenter owns the sensor and remembers what the tray currently
//! shows. The GUI calls [`Presenter::tick`] from its timer and applies the
//! returned [`TrayUpdate`], if any. A failed read produces no update, so the
//! previous icon stays on screen until the next successful tick.

use batterytray_sensor::{BatterySensor, Reading};

use crate::icons::IconState;
use crate::menu::MenuState;

/// Tooltip shown before the first successful reading.
pub const DEFAULT_TOOLTIP: &str = "Battery Status";

/// Tooltip text for a reading.
pub fn tooltip(reading: &Reading) -> String {
    format!("{}% — {:.2}V", reading.percent, reading.voltage)
}

/// Where the presenter is in its poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the next tick; the last read succeeded (or none ran yet).
    Idle,
    /// A read is in progress.
    Polling,
    /// Waiting for the next tick after a failed read; the display is stale.
    ErrorSuppressed,
}

/// What the tray should display after a successful tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrayUpdate {
    pub icon: IconState,
    pub tooltip: String,
    pub reading: Reading,
}

/// Owns the sensor and the currently displayed tray state.
pub struct Presenter<S> {
    sensor: S,
    menu: MenuState,
    displayed: IconState,
    tooltip: String,
    state: PollState,
    failures: u32,
}

impl<S: BatterySensor> Presenter<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            menu: MenuState::default(),
            displayed: IconState::Unknown,
            tooltip: DEFAULT_TOOLTIP.into(),
            state: PollState::Idle,
            failures: 0,
        }
    }

    /// Reads the sensor once.
    ///
    /// Returns the new display state on success. On failure the displayed
    /// icon and tooltip are left untouched and `None` is returned.
    pub fn tick(&mut self) -> Option<TrayUpdate> {
        self.state = PollState::Polling;

        match self.sensor.read() {
            Ok(reading) => {
                if self.failures > 0 {
                    tracing::info!(failures = self.failures, "sensor readable again");
                }
                self.failures = 0;
                self.state = PollState::Idle;

                let icon = IconState::for_reading(&reading);
                let text = tooltip(&reading);
                tracing::info!(
                    icon = %icon,
                    percent = reading.percent,
                    voltage = format_args!("{:.2}", reading.voltage),
                    current = format_args!("{:.3}", reading.current),
                    "battery status updated"
                );

                self.displayed = icon;
                self.tooltip.clone_from(&text);
                self.menu.status = Some(text.clone());

                Some(TrayUpdate {
                    icon,
                    tooltip: text,
                    reading,
                })
            }
            Err(e) => {
                self.failures += 1;
                self.state = PollState::ErrorSuppressed;
                if self.failures == 1 {
                    tracing::warn!("battery read failed, keeping last icon: {e}");
                } else {
                    tracing::debug!(failures = self.failures, "battery read failed again: {e}");
                }
                None
            }
        }
    }

    /// Icon currently on display.
    pub fn displayed(&self) -> IconState {
        self.displayed
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Number of failed reads since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Menu contents reflecting the latest reading.
    pub fn menu(&self) -> &MenuState {
        &self.menu
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Tears the presenter down, releasing the sensor and its bus handle.
    pub fn shutdown(self) {
        tracing::info!(failures = self.failures, "presenter shut down");
        drop(self.sensor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batterytray_sensor::SensorError;

    fn bus_error() -> SensorError {
        SensorError::Open {
            path: "/dev/i2c-1".into(),
            reason: "No such file or directory".into(),
        }
    }

    struct Scripted(Vec<Result<Reading, SensorError>>);

    impl BatterySensor for Scripted {
        fn read(&mut self) -> Result<Reading, SensorError> {
            self.0.remove(0)
        }
    }

    fn reading(percent: u8, charging: bool) -> Reading {
        Reading {
            voltage: 9.0 + percent as f64 * 0.036,
            current: if charging { 0.5 } else { -0.5 },
            percent,
            charging,
            critical: percent <= 5,
        }
    }

    #[test]
    fn starts_unknown_and_idle() {
        let presenter = Presenter::new(Scripted(vec![]));
        assert_eq!(presenter.displayed(), IconState::Unknown);
        assert_eq!(presenter.tooltip(), DEFAULT_TOOLTIP);
        assert_eq!(presenter.state(), PollState::Idle);
        assert!(presenter.menu().status.is_none());
    }

    #[test]
    fn successful_tick_updates_display() {
        let mut presenter = Presenter::new(Scripted(vec![Ok(reading(80, false))]));

        let update = presenter.tick().unwrap();
        assert_eq!(update.icon, IconState::Level(5));
        assert_eq!(update.tooltip, "80% — 11.88V");
        assert_eq!(presenter.displayed(), IconState::Level(5));
        assert_eq!(presenter.tooltip(), "80% — 11.88V");
        assert_eq!(presenter.state(), PollState::Idle);
        assert_eq!(presenter.menu().status.as_deref(), Some("80% — 11.88V"));
    }

    #[test]
    fn failure_keeps_previous_icon() {
        let mut presenter = Presenter::new(Scripted(vec![
            Ok(reading(50, false)),
            Err(bus_error()),
            Err(bus_error()),
        ]));

        presenter.tick().unwrap();
        let before = (presenter.displayed(), presenter.tooltip().to_string());

        assert!(presenter.tick().is_none());
        assert!(presenter.tick().is_none());

        assert_eq!(presenter.displayed(), before.0);
        assert_eq!(presenter.tooltip(), before.1);
        assert_eq!(presenter.state(), PollState::ErrorSuppressed);
        assert_eq!(presenter.consecutive_failures(), 2);
    }

    #[test]
    fn recovers_after_failure() {
        let mut presenter = Presenter::new(Scripted(vec![
            Err(bus_error()),
            Ok(reading(100, true)),
        ]));

        assert!(presenter.tick().is_none());
        assert_eq!(presenter.displayed(), IconState::Unknown);

        let update = presenter.tick().unwrap();
        assert_eq!(update.icon, IconState::Charging);
        assert_eq!(presenter.state(), PollState::Idle);
        assert_eq!(presenter.consecutive_failures(), 0);
    }

    #[test]
    fn tooltip_format() {
        let r = Reading {
            voltage: 12.347,
            current: 0.0,
            percent: 93,
            charging: false,
            critical: false,
        };
        assert_eq!(tooltip(&r), "93% — 12.35V");
    }
}
