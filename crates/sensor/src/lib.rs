//! INA219 fuel-gauge reader for the battery tray.
//!
//! The driver talks to the chip through any [`embedded_hal::i2c::I2c`] bus,
//! so the same code runs against `/dev/i2c-N` on Linux and against an
//! in-memory bus in tests. A [`Gauge`] turns raw measurements into a
//! [`Reading`] the tray can display.

mod curve;
mod gauge;
mod ina219;

#[cfg(target_os = "linux")]
mod bus;

pub use curve::ChargeCurve;
pub use gauge::{BatterySensor, Gauge, Reading, Thresholds};
pub use ina219::{Calibration, DEFAULT_ADDRESS, Ina219, register};

#[cfg(target_os = "linux")]
pub use bus::BusSensor;

/// Errors produced while talking to the fuel gauge.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("I2C transaction failed: {0:?}")]
    Bus(embedded_hal::i2c::ErrorKind),

    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },
}

impl SensorError {
    /// Wraps any bus error, keeping only its portable kind.
    pub fn bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        Self::Bus(err.kind())
    }
}
