//! Voltage to state-of-charge conversion.

/// Linear charge curve between an empty and a full pack voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeCurve {
    pub min_voltage: f64,
    pub max_voltage: f64,
}

impl Default for ChargeCurve {
    /// 3S Li-ion: 3.0 V to 4.2 V per cell.
    fn default() -> Self {
        Self {
            min_voltage: 9.0,
            max_voltage: 12.6,
        }
    }
}

impl ChargeCurve {
    /// Charge percentage for `voltage`, rounded and clamped to 0-100.
    pub fn percent(&self, voltage: f64) -> u8 {
        let span = self.max_voltage - self.min_voltage;
        if !voltage.is_finite() || span <= 0.0 {
            return 0;
        }
        let pct = (voltage - self.min_voltage) / span * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }
}
