//! Per-user installation: executable, icons, configuration and an autostart
//! entry for the desktop session.

use std::path::{Path, PathBuf};

use anyhow::Context;
use nix::unistd::{Gid, Uid, User};

use crate::BINARY_NAME;
use crate::config::{Config, INSTALL_DIR_NAME, config_path_in};

/// File name of the autostart entry.
pub const DESKTOP_FILE_NAME: &str = "batteryStatus.desktop";

/// Delay before the autostarted tray launches, so the panel is up first.
const AUTOSTART_DELAY_SECS: u32 = 5;

/// Where everything goes for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallPlan {
    pub user: String,
    pub home: PathBuf,
    pub install_dir: PathBuf,
    pub autostart_file: PathBuf,
    pub config_file: PathBuf,
    /// Owner to chown created files to; `None` leaves ownership alone.
    pub owner: Option<(Uid, Gid)>,
}

impl InstallPlan {
    /// Plans an installation for an existing system user.
    pub fn for_user(name: &str) -> anyhow::Result<Self> {
        let user = User::from_name(name)
            .with_context(|| format!("failed to look up user '{name}'"))?
            .with_context(|| format!("user '{name}' does not exist"))?;

        let mut plan = Self::for_home(name, &user.dir);
        plan.owner = Some((user.uid, user.gid));
        Ok(plan)
    }

    /// Plans an installation into `home` without changing ownership.
    pub fn for_home(user: &str, home: &Path) -> Self {
        Self {
            user: user.to_string(),
            home: home.to_path_buf(),
            install_dir: home.join(INSTALL_DIR_NAME),
            autostart_file: home.join(".config").join("autostart").join(DESKTOP_FILE_NAME),
            config_file: config_path_in(home),
            owner: None,
        }
    }

    /// Path of the installed tray executable.
    pub fn executable(&self) -> PathBuf {
        self.install_dir.join(BINARY_NAME)
    }
}

/// Files written by [`install`].
#[derive(Debug, Default)]
pub struct InstallReport {
    pub executable: Option<PathBuf>,
    pub icons: Vec<PathBuf>,
    pub config_file: PathBuf,
    pub autostart_file: Option<PathBuf>,
}

/// Autostart entry launching `exec` after a short delay.
pub fn desktop_entry(exec: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Battery Status\n\
         Comment=Auto-launch battery monitor\n\
         Exec=bash -c \"sleep {AUTOSTART_DELAY_SECS}; {}\"\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        exec.display()
    )
}

/// Icon assets (`battery_*.png`) found directly in `dir`, sorted by name.
pub fn find_icons(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut icons = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let path = entry?.path();
        let is_icon = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("battery_") && n.ends_with(".png"));
        if is_icon && path.is_file() {
            icons.push(path);
        }
    }
    icons.sort();
    Ok(icons)
}

/// Performs the installation described by `plan`.
///
/// `binary` is the tray executable to copy; when it does not exist the
/// executable and autostart entry are skipped with a warning.
pub fn install(plan: &InstallPlan, source_dir: &Path, binary: &Path) -> anyhow::Result<InstallReport> {
    let autostart_dir = plan
        .autostart_file
        .parent()
        .context("autostart path has no parent")?;
    let config_dir = plan
        .config_file
        .parent()
        .context("config path has no parent")?;

    // Directories this run creates under the home, parents included, so that
    // none of them is left owned by root.
    let mut created = Vec::new();
    for dir in [plan.install_dir.as_path(), autostart_dir, config_dir] {
        for missing in missing_dirs(dir) {
            if missing.starts_with(&plan.home) && !created.contains(&missing) {
                created.push(missing);
            }
        }
    }

    std::fs::create_dir_all(&plan.install_dir)
        .with_context(|| format!("failed to create {}", plan.install_dir.display()))?;
    std::fs::create_dir_all(autostart_dir)
        .with_context(|| format!("failed to create {}", autostart_dir.display()))?;

    let mut report = InstallReport {
        config_file: plan.config_file.clone(),
        ..InstallReport::default()
    };

    if binary.is_file() {
        let dest = plan.executable();
        copy_file(binary, &dest)?;
        make_executable(&dest)?;
        tracing::info!(from = %binary.display(), to = %dest.display(), "copied executable");
        report.executable = Some(dest);
    } else {
        tracing::warn!(path = %binary.display(), "tray executable not found; skipping");
    }

    for icon in find_icons(source_dir)? {
        let Some(name) = icon.file_name() else {
            continue;
        };
        let dest = plan.install_dir.join(name);
        copy_file(&icon, &dest)?;
        report.icons.push(dest);
    }
    if report.icons.is_empty() {
        tracing::warn!(dir = %source_dir.display(), "no battery_*.png icons found; skipping icons");
    } else {
        tracing::info!(count = report.icons.len(), "copied icons");
    }

    // Existing settings are kept; only the icon location is pointed at the
    // install directory.
    let mut config = Config::load_from(&plan.config_file)?;
    config.icon_dir = plan.install_dir.clone();
    config.save_to(&plan.config_file)?;
    tracing::info!(path = %plan.config_file.display(), "wrote configuration");

    if let Some(exec) = &report.executable {
        std::fs::write(&plan.autostart_file, desktop_entry(exec)).with_context(|| {
            format!("failed to write {}", plan.autostart_file.display())
        })?;
        tracing::info!(path = %plan.autostart_file.display(), "created autostart entry");
        report.autostart_file = Some(plan.autostart_file.clone());
    } else {
        tracing::warn!("no executable installed; autostart entry not created");
    }

    if let Some((uid, gid)) = plan.owner {
        for dir in &created {
            chown(dir, uid, gid)?;
        }
        chown_recursive(&plan.install_dir, uid, gid)?;
        chown_recursive(config_dir, uid, gid)?;
        chown(autostart_dir, uid, gid)?;
        if report.autostart_file.is_some() {
            chown(&plan.autostart_file, uid, gid)?;
        }
    }

    Ok(report)
}

/// `dir` and those of its ancestors that do not exist yet, outermost first.
fn missing_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    missing
}

/// Copies `from` to `to` unless both name the same file, which a plain copy
/// would truncate to zero bytes.
fn copy_file(from: &Path, to: &Path) -> anyhow::Result<()> {
    if to.exists() {
        let src = std::fs::canonicalize(from)
            .with_context(|| format!("cannot resolve {}", from.display()))?;
        let dest = std::fs::canonicalize(to)
            .with_context(|| format!("cannot resolve {}", to.display()))?;
        if src == dest {
            tracing::debug!(path = %dest.display(), "already in place; not copying");
            return Ok(());
        }
    }
    std::fs::copy(from, to).with_context(|| format!("failed to copy {}", from.display()))?;
    Ok(())
}

fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

fn chown(path: &Path, uid: Uid, gid: Gid) -> anyhow::Result<()> {
    nix::unistd::chown(path, Some(uid), Some(gid))
        .with_context(|| format!("failed to chown {}", path.display()))
}

fn chown_recursive(path: &Path, uid: Uid, gid: Gid) -> anyhow::Result<()> {
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            chown_recursive(&entry?.path(), uid, gid)?;
        }
    }
    chown(path, uid, gid)
}
