//! Tray configuration management.
//!
//! Configuration is stored as TOML at `~/.config/batterytray/config.toml`.
//! A missing file is created with defaults on first start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use batterytray_sensor::{Calibration, ChargeCurve, DEFAULT_ADDRESS, Thresholds};
use serde::{Deserialize, Serialize};

/// Directory (under the user's home) the installer copies files into.
pub const INSTALL_DIR_NAME: &str = "pios-ina219-batterystatus";

/// Tray configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// I2C character device the gauge is attached to.
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: PathBuf,

    /// 7-bit I2C address of the INA219.
    #[serde(default = "default_address")]
    pub address: u8,

    /// Shunt resistor value in ohms.
    #[serde(default = "default_shunt_ohms")]
    pub shunt_ohms: f64,

    /// Largest current expected through the shunt, in amps.
    #[serde(default = "default_max_expected_amps")]
    pub max_expected_amps: f64,

    /// Seconds between sensor reads.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u32,

    /// Pack voltage reported as 0%.
    #[serde(default = "default_min_voltage")]
    pub min_voltage: f64,

    /// Pack voltage reported as 100%.
    #[serde(default = "default_max_voltage")]
    pub max_voltage: f64,

    /// At or below this percentage the alert icon is shown.
    #[serde(default = "default_critical_percent")]
    pub critical_percent: u8,

    /// Current (amps) above which the pack counts as charging.
    #[serde(default = "default_charge_current_threshold")]
    pub charge_current_threshold: f64,

    /// Directory holding the `battery_*.png` icons.
    #[serde(default = "default_icon_dir")]
    pub icon_dir: PathBuf,

    /// Write the charge percentage to `capacity_paths` after each read.
    #[serde(default)]
    pub export_capacity: bool,

    /// Capacity export targets, tried in order.
    #[serde(default = "default_capacity_paths")]
    pub capacity_paths: Vec<PathBuf>,
}

fn default_i2c_bus() -> PathBuf {
    PathBuf::from("/dev/i2c-1")
}

fn default_address() -> u8 {
    DEFAULT_ADDRESS
}

fn default_shunt_ohms() -> f64 {
    Calibration::default().shunt_ohms
}

fn default_max_expected_amps() -> f64 {
    Calibration::default().max_expected_amps
}

fn default_poll_interval() -> u32 {
    5
}

fn default_min_voltage() -> f64 {
    ChargeCurve::default().min_voltage
}

fn default_max_voltage() -> f64 {
    ChargeCurve::default().max_voltage
}

fn default_critical_percent() -> u8 {
    Thresholds::default().critical_percent
}

fn default_charge_current_threshold() -> f64 {
    Thresholds::default().charge_current
}

/// Icons ship next to the executable.
fn default_icon_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_capacity_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/sys/class/power_supply/BAT0/capacity"),
        PathBuf::from("/tmp/battery_status"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            address: default_address(),
            shunt_ohms: default_shunt_ohms(),
            max_expected_amps: default_max_expected_amps(),
            poll_interval: default_poll_interval(),
            min_voltage: default_min_voltage(),
            max_voltage: default_max_voltage(),
            critical_percent: default_critical_percent(),
            charge_current_threshold: default_charge_current_threshold(),
            icon_dir: default_icon_dir(),
            export_capacity: false,
            capacity_paths: default_capacity_paths(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing defaults there if missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path`, owner-readable only.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.max_voltage > self.min_voltage,
            "max_voltage ({}) must be above min_voltage ({})",
            self.max_voltage,
            self.min_voltage
        );
        anyhow::ensure!(
            self.shunt_ohms > 0.0 && self.max_expected_amps > 0.0,
            "shunt_ohms and max_expected_amps must be positive"
        );
        anyhow::ensure!(
            self.critical_percent <= 100,
            "critical_percent must be 0-100"
        );
        Ok(())
    }

    /// Poll period; 0 means the default, anything else is at least 1 s.
    pub fn poll_interval(&self) -> Duration {
        let secs = match self.poll_interval {
            0 => default_poll_interval(),
            v => v.max(1),
        };
        Duration::from_secs(secs as u64)
    }

    pub fn calibration(&self) -> Calibration {
        Calibration {
            shunt_ohms: self.shunt_ohms,
            max_expected_amps: self.max_expected_amps,
        }
    }

    pub fn curve(&self) -> ChargeCurve {
        ChargeCurve {
            min_voltage: self.min_voltage,
            max_voltage: self.max_voltage,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            critical_percent: self.critical_percent,
            charge_current: self.charge_current_threshold,
        }
    }
}

/// Returns the configuration file path under `home`.
pub fn config_path_in(home: &Path) -> PathBuf {
    home.join(".config").join("batterytray").join("config.toml")
}

/// Returns the configuration file path for the current user.
fn config_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    Ok(config_path_in(Path::new(&home)))
}
