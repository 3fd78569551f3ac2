//! Battery tray entry point.

use battery_tray::config::Config;

fn main() -> anyhow::Result<()> {
    battery_tray::init_logging();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting battery tray"
    );

    // Load configuration.
    let config = Config::load()?;
    tracing::info!(
        bus = %config.i2c_bus.display(),
        address = format_args!("{:#04x}", config.address),
        icon_dir = %config.icon_dir.display(),
        "configuration loaded"
    );

    run(config)?;

    tracing::info!("battery tray shut down cleanly");
    Ok(())
}

#[cfg(target_os = "linux")]
fn run(config: Config) -> anyhow::Result<()> {
    use battery_tray::app;
    use battery_tray::export::CapacityExporter;
    use batterytray_sensor::BusSensor;

    let sensor = BusSensor::new(
        config.i2c_bus.clone(),
        config.address,
        config.calibration(),
        config.curve(),
        config.thresholds(),
    );
    let icons = app::load_icons(&config.icon_dir);
    let exporter = config
        .export_capacity
        .then(|| CapacityExporter::new(config.capacity_paths.clone()));

    app::run(sensor, icons, config.poll_interval(), exporter)
}

#[cfg(not(target_os = "linux"))]
fn run(_config: Config) -> anyhow::Result<()> {
    anyhow::bail!("battery-tray needs a Linux I2C character device")
}
