//! Fuel gauge on a Linux `/dev/i2c-N` character device.

use std::path::PathBuf;

use linux_embedded_hal::I2cdev;

use crate::{BatterySensor, Calibration, ChargeCurve, Gauge, Ina219, Reading, SensorError, Thresholds};

/// Gauge that opens and initializes the bus on demand.
///
/// The device is opened on the first read and dropped after any failed
/// transaction, so the next read reopens and recalibrates the chip. A gauge
/// that is absent at startup simply fails reads until it appears.
pub struct BusSensor {
    path: PathBuf,
    address: u8,
    calibration: Calibration,
    curve: ChargeCurve,
    thresholds: Thresholds,
    gauge: Option<Gauge<I2cdev>>,
}

impl BusSensor {
    pub fn new(
        path: impl Into<PathBuf>,
        address: u8,
        calibration: Calibration,
        curve: ChargeCurve,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            path: path.into(),
            address,
            calibration,
            curve,
            thresholds,
            gauge: None,
        }
    }

    /// Returns `true` while the bus handle is held open.
    pub fn is_open(&self) -> bool {
        self.gauge.is_some()
    }

    fn open(&self) -> Result<Gauge<I2cdev>, SensorError> {
        let i2c = I2cdev::new(&self.path).map_err(|e| SensorError::Open {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut ina = Ina219::new(i2c, self.address, self.calibration);
        ina.init()?;

        tracing::info!(
            path = %self.path.display(),
            address = format_args!("{:#04x}", self.address),
            "INA219 initialized"
        );
        Ok(Gauge::new(ina, self.curve, self.thresholds))
    }
}

impl BatterySensor for BusSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let mut gauge = match self.gauge.take() {
            Some(gauge) => gauge,
            None => self.open()?,
        };

        let result = gauge.read();
        if result.is_ok() {
            self.gauge = Some(gauge);
        }
        result
    }
}

impl Drop for BusSensor {
    fn drop(&mut self) {
        if self.gauge.take().is_some() {
            tracing::debug!(path = %self.path.display(), "I2C bus closed");
        }
    }
}
