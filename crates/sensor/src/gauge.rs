//! Battery readings built from INA219 measurements.

use embedded_hal::i2c::I2c;

use crate::{ChargeCurve, Ina219, SensorError};

/// One battery measurement, produced fresh on every poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Pack voltage in volts.
    pub voltage: f64,
    /// Pack current in amps (positive while charging).
    pub current: f64,
    /// State of charge, 0-100.
    pub percent: u8,
    pub charging: bool,
    pub critical: bool,
}

/// Anything that can produce a [`Reading`] on demand.
pub trait BatterySensor {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

impl<S: BatterySensor + ?Sized> BatterySensor for Box<S> {
    fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read()
    }
}

/// Limits used to flag charging and critical readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// At or below this percentage the reading is critical.
    pub critical_percent: u8,
    /// Current above this many amps counts as charging.
    pub charge_current: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_percent: 5,
            charge_current: 0.05,
        }
    }
}

impl Thresholds {
    /// Builds a reading from raw voltage and current.
    pub fn classify(&self, curve: &ChargeCurve, voltage: f64, current: f64) -> Reading {
        let percent = curve.percent(voltage);
        Reading {
            voltage,
            current,
            percent,
            charging: current > self.charge_current,
            critical: percent <= self.critical_percent,
        }
    }
}

/// INA219 plus the curve and thresholds that turn it into a fuel gauge.
pub struct Gauge<I2C> {
    ina: Ina219<I2C>,
    curve: ChargeCurve,
    thresholds: Thresholds,
}

impl<I2C: I2c> Gauge<I2C> {
    pub fn new(ina: Ina219<I2C>, curve: ChargeCurve, thresholds: Thresholds) -> Self {
        Self {
            ina,
            curve,
            thresholds,
        }
    }

    pub fn into_inner(self) -> Ina219<I2C> {
        self.ina
    }
}

impl<I2C: I2c> BatterySensor for Gauge<I2C> {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let voltage = self.ina.bus_voltage()?;
        let current = self.ina.current()?;
        let reading = self.thresholds.classify(&self.curve, voltage, current);
        tracing::trace!(
            voltage,
            current,
            percent = reading.percent,
            "battery sampled"
        );
        Ok(reading)
    }
}
