//! INA219 register driver.

use embedded_hal::i2c::I2c;

use crate::SensorError;

/// Default address of the gauge on the UPS board (A0 strapped high).
pub const DEFAULT_ADDRESS: u8 = 0x41;

/// INA219 register addresses.
pub mod register {
    pub const CONFIG: u8 = 0x00;
    pub const SHUNT_VOLTAGE: u8 = 0x01;
    pub const BUS_VOLTAGE: u8 = 0x02;
    pub const POWER: u8 = 0x03;
    pub const CURRENT: u8 = 0x04;
    pub const CALIBRATION: u8 = 0x05;
}

// Configuration register fields.
const BRNG_16V: u16 = 0;
const PG_GAIN_1: u16 = 0;
const BADC_12BIT: u16 = 0xF;
const SADC_12BIT: u16 = 0xF;
const MODE_SHUNT_BUS_CONTINUOUS: u16 = 0x7;

/// Config word: 16 V range, ±40 mV shunt gain, 12-bit ADCs, continuous mode.
pub const CONFIG_VALUE: u16 = ((BRNG_16V & 0x1) << 13)
    | ((PG_GAIN_1 & 0x3) << 11)
    | ((BADC_12BIT & 0xF) << 7)
    | ((SADC_12BIT & 0xF) << 3)
    | (MODE_SHUNT_BUS_CONTINUOUS & 0x7);

/// Fixed scaling constant from the INA219 datasheet.
const CAL_SCALE: f64 = 0.04096;
const BUS_VOLTAGE_LSB: f64 = 0.004;
const SHUNT_VOLTAGE_LSB: f64 = 0.000_01;
const POWER_LSB_FACTOR: f64 = 20.0;

/// Shunt resistor and expected full-scale current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub shunt_ohms: f64,
    pub max_expected_amps: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            shunt_ohms: 0.1,
            max_expected_amps: 3.2,
        }
    }
}

impl Calibration {
    /// Calibration register value for this shunt and current range.
    pub fn register_value(&self) -> u16 {
        let current_lsb = self.max_expected_amps / 32767.0;
        let cal = CAL_SCALE / (current_lsb * self.shunt_ohms);
        cal.clamp(0.0, u16::MAX as f64) as u16
    }

    /// Amps per bit of the current register once `register_value` is loaded.
    pub fn current_lsb(&self) -> f64 {
        CAL_SCALE / (self.register_value() as f64 * self.shunt_ohms)
    }
}

/// INA219 bound to one bus address.
pub struct Ina219<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Calibration,
    current_lsb: f64,
}

impl<I2C: I2c> Ina219<I2C> {
    pub fn new(i2c: I2C, address: u8, calibration: Calibration) -> Self {
        Self {
            i2c,
            address,
            current_lsb: calibration.current_lsb(),
            calibration,
        }
    }

    /// Writes the configuration and calibration registers.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.configure()?;
        self.calibrate()
    }

    pub fn configure(&mut self) -> Result<(), SensorError> {
        self.write_register(register::CONFIG, CONFIG_VALUE)
    }

    pub fn calibrate(&mut self) -> Result<(), SensorError> {
        let cal = self.calibration.register_value();
        self.write_register(register::CALIBRATION, cal)?;
        self.current_lsb = self.calibration.current_lsb();
        tracing::debug!(cal, current_lsb = self.current_lsb, "INA219 calibrated");
        Ok(())
    }

    /// Bus voltage in volts.
    pub fn bus_voltage(&mut self) -> Result<f64, SensorError> {
        // Low 3 bits are CNVR/OVF flags.
        let raw = self.read_register(register::BUS_VOLTAGE)? >> 3;
        Ok(raw as f64 * BUS_VOLTAGE_LSB)
    }

    /// Shunt voltage in volts.
    pub fn shunt_voltage(&mut self) -> Result<f64, SensorError> {
        let raw = self.read_register(register::SHUNT_VOLTAGE)? as i16;
        Ok(raw as f64 * SHUNT_VOLTAGE_LSB)
    }

    /// Current in amps; positive while the pack is charging.
    pub fn current(&mut self) -> Result<f64, SensorError> {
        let raw = self.read_register(register::CURRENT)? as i16;
        Ok(raw as f64 * self.current_lsb)
    }

    /// Power in watts.
    pub fn power(&mut self) -> Result<f64, SensorError> {
        let raw = self.read_register(register::POWER)?;
        Ok(raw as f64 * POWER_LSB_FACTOR * self.current_lsb)
    }

    /// Consumes the driver and returns the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(SensorError::bus)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [msb, lsb] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, msb, lsb])
            .map_err(SensorError::bus)
    }
}
