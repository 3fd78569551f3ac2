//! Application orchestrator: GTK main loop, tray icon and poll timer.
//!
//! Everything runs on the main thread. One glib timer polls the sensor at the
//! configured interval, a second one drains tray menu events. Quit (or
//! SIGINT/SIGTERM) leaves the main loop, after which the presenter is shut
//! down and the bus handle closed.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use batterytray_sensor::BatterySensor;
use batterytray_tray::{
    DEFAULT_TOOLTIP, IconState, IconTable, MenuAction, MenuState, Presenter, TrayUpdate,
};
use gtk::glib;
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use crate::export::CapacityExporter;

/// How often pending menu clicks are handled.
const MENU_POLL: Duration = Duration::from_millis(100);

/// Loads every icon in the lookup table from `dir`.
pub fn load_icons(dir: &Path) -> IconTable<Icon> {
    let table = IconTable::load(|state| {
        let path = dir.join(state.file_name());
        match load_icon(&path) {
            Ok(icon) => Some(icon),
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to load tray icon: {e:#}");
                None
            }
        }
    });

    let missing = table.missing();
    if missing.is_empty() {
        tracing::debug!(dir = %dir.display(), "tray icons loaded");
    } else {
        tracing::warn!(
            dir = %dir.display(),
            missing = missing.len(),
            "some tray icons are unavailable; those states keep the previous image"
        );
    }
    table
}

fn load_icon(path: &Path) -> anyhow::Result<Icon> {
    let img = image::open(path)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Icon::from_rgba(rgba.into_raw(), width, height)?)
}

/// Native menu built from the [`MenuState`] model.
struct TrayMenu {
    menu: Menu,
    header: Option<MenuItem>,
    quit: Option<MenuId>,
}

impl TrayMenu {
    fn build(state: &MenuState) -> anyhow::Result<Self> {
        let menu = Menu::new();
        let mut header = None;
        let mut quit = None;

        for item in state.build_menu() {
            if item.is_separator() {
                menu.append(&PredefinedMenuItem::separator())?;
                continue;
            }

            let entry = MenuItem::new(&item.label, item.enabled, None);
            menu.append(&entry)?;
            match item.action {
                Some(MenuAction::Quit) => quit = Some(entry.id().clone()),
                None if header.is_none() => header = Some(entry),
                None => {}
            }
        }

        Ok(Self { menu, header, quit })
    }
}

/// Top-level application object, alive from startup until Quit.
struct TrayApp<S> {
    presenter: Option<Presenter<S>>,
    tray: TrayIcon,
    header: Option<MenuItem>,
    icons: IconTable<Icon>,
    exporter: Option<CapacityExporter>,
}

impl<S: BatterySensor> TrayApp<S> {
    fn poll(&mut self) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        let Some(update) = presenter.tick() else {
            return;
        };
        let header = presenter.menu().header();
        self.apply(&update, &header);
    }

    fn apply(&mut self, update: &TrayUpdate, header: &str) {
        match self.icons.get(update.icon) {
            Some(icon) => {
                if let Err(e) = self.tray.set_icon(Some(icon.clone())) {
                    tracing::error!("failed to set tray icon: {e}");
                }
            }
            None => tracing::debug!(icon = %update.icon, "no image for icon state"),
        }

        if let Err(e) = self.tray.set_tooltip(Some(&update.tooltip)) {
            tracing::error!("failed to set tray tooltip: {e}");
        }
        // Linux indicators ignore tooltips; the title is shown beside the icon.
        self.tray.set_title(Some(&update.tooltip));

        if let Some(item) = &self.header {
            item.set_text(header);
        }

        if let Some(exporter) = self.exporter.as_mut() {
            exporter.write(update.reading.percent);
        }
    }

    fn shutdown(&mut self) {
        if let Some(presenter) = self.presenter.take() {
            presenter.shutdown();
        }
    }
}

/// Runs the tray until Quit is chosen or the process is signalled.
pub fn run<S: BatterySensor + 'static>(
    sensor: S,
    icons: IconTable<Icon>,
    interval: Duration,
    exporter: Option<CapacityExporter>,
) -> anyhow::Result<()> {
    gtk::init().context("failed to initialize GTK")?;

    let presenter = Presenter::new(sensor);
    let tray_menu = TrayMenu::build(presenter.menu())?;

    let mut builder = TrayIconBuilder::new()
        .with_menu(Box::new(tray_menu.menu.clone()))
        .with_tooltip(DEFAULT_TOOLTIP);
    if let Some(icon) = icons.get(IconState::Unknown) {
        builder = builder.with_icon(icon.clone());
    }
    let tray = builder.build().context("failed to create tray icon")?;

    let app = Rc::new(RefCell::new(TrayApp {
        presenter: Some(presenter),
        tray,
        header: tray_menu.header,
        icons,
        exporter,
    }));

    // First reading right away rather than one interval after start.
    app.borrow_mut().poll();

    let poller = Rc::clone(&app);
    let poll_source = glib::timeout_add_local(interval, move || {
        poller.borrow_mut().poll();
        glib::ControlFlow::Continue
    });

    let quit_id = tray_menu.quit;
    glib::timeout_add_local(MENU_POLL, move || {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            if quit_id.as_ref() == Some(&event.id) {
                tracing::info!("quit requested via tray");
                gtk::main_quit();
                return glib::ControlFlow::Break;
            }
        }
        glib::ControlFlow::Continue
    });

    for (signal, name) in [(nix::libc::SIGINT, "SIGINT"), (nix::libc::SIGTERM, "SIGTERM")] {
        glib::unix_signal_add_local(signal, move || {
            tracing::info!("{name} received, shutting down");
            gtk::main_quit();
            glib::ControlFlow::Break
        });
    }

    tracing::info!(interval_sec = interval.as_secs(), "battery tray ready");
    gtk::main();

    poll_source.remove();
    app.borrow_mut().shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path) {
        image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 200, 0, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn load_icons_reports_absent_states() {
        let tmp = tempfile::tempdir().unwrap();
        let present = [IconState::Level(0), IconState::Level(7), IconState::Charging];
        for state in present {
            write_png(&tmp.path().join(state.file_name()));
        }

        let table = load_icons(tmp.path());

        for state in present {
            assert!(table.get(state).is_some(), "{state}");
        }
        let missing = table.missing();
        assert_eq!(missing.len(), IconState::ALL.len() - present.len());
        assert!(missing.contains(&IconState::Unknown));
        assert!(missing.contains(&IconState::Alert));
        assert!(missing.iter().all(|state| !present.contains(state)));
    }

    #[test]
    fn corrupt_icon_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_png(&tmp.path().join(IconState::Level(3).file_name()));
        std::fs::write(tmp.path().join(IconState::Alert.file_name()), b"not a png").unwrap();

        assert!(load_icon(&tmp.path().join(IconState::Alert.file_name())).is_err());

        let table = load_icons(tmp.path());
        assert!(table.get(IconState::Level(3)).is_some());
        assert!(table.get(IconState::Alert).is_none());
        assert!(table.missing().contains(&IconState::Alert));
    }

    #[test]
    fn empty_dir_loads_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let table = load_icons(tmp.path());
        assert_eq!(table.missing().len(), IconState::ALL.len());
    }
}
