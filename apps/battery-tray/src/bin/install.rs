//! Installs the battery tray for a desktop user.
//!
//! Usage: `sudo battery-tray-install <TARGET_USER>`

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "battery-tray-install", version, about = "Install the battery tray for a desktop user")]
struct Args {
    /// User whose desktop session should start the tray
    target_user: String,

    /// Directory containing the battery_*.png icons
    #[arg(long, default_value = ".")]
    source: PathBuf,

    /// Tray executable to install (defaults to the one next to this installer)
    #[arg(long)]
    binary: Option<PathBuf>,
}

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    use battery_tray::install::{InstallPlan, install};

    battery_tray::init_logging();
    let args = Args::parse();

    if !nix::unistd::geteuid().is_root() {
        tracing::warn!("not running as root; changing ownership for another user may fail");
    }

    let plan = InstallPlan::for_user(&args.target_user)?;
    let binary = match args.binary {
        Some(path) => path,
        None => std::env::current_exe()?
            .parent()
            .map(|dir| dir.join(battery_tray::BINARY_NAME))
            .unwrap_or_else(|| PathBuf::from(battery_tray::BINARY_NAME)),
    };

    println!("Installing for user: {}", plan.user);
    println!("Install directory:   {}", plan.install_dir.display());
    println!("Autostart file:      {}", plan.autostart_file.display());

    let report = install(&plan, &args.source, &binary)?;

    println!("--------------------------------------------");
    println!("Installation complete!");
    println!("User:           {}", plan.user);
    match &report.executable {
        Some(exe) => println!("Executable:     {}", exe.display()),
        None => println!("Executable:     (not installed)"),
    }
    println!("Icons:          {}", report.icons.len());
    println!("Configuration:  {}", report.config_file.display());
    match &report.autostart_file {
        Some(file) => println!("Autostart file: {}", file.display()),
        None => println!("Autostart file: (not created)"),
    }
    println!();
    println!("The battery tray starts automatically on the next desktop login.");
    println!("--------------------------------------------");
    Ok(())
}

#[cfg(not(unix))]
fn main() -> anyhow::Result<()> {
    let _ = Args::parse();
    anyhow::bail!("battery-tray-install only supports Unix systems")
}
