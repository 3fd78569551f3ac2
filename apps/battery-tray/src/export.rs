//! Optional charge-percentage export for other programs.
//!
//! Each successful reading is written as `"{percent}\n"` to the first
//! writable path in the list (typically a sysfs `capacity` node, then a
//! file under `/tmp`). Failures never affect the tray.

use std::path::{Path, PathBuf};

pub struct CapacityExporter {
    paths: Vec<PathBuf>,
    current: Option<PathBuf>,
    failing: bool,
}

impl CapacityExporter {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            current: None,
            failing: false,
        }
    }

    /// Writes `percent` (clamped to 100) and returns the path that took it.
    pub fn write(&mut self, percent: u8) -> Option<&Path> {
        let line = format!("{}\n", percent.min(100));

        for path in &self.paths {
            match std::fs::write(path, &line) {
                Ok(()) => {
                    if self.current.as_ref() != Some(path) {
                        tracing::info!(path = %path.display(), "exporting battery capacity");
                        self.current = Some(path.clone());
                    }
                    self.failing = false;
                    return self.current.as_deref();
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), "capacity export skipped: {e}");
                }
            }
        }

        if !self.failing {
            tracing::warn!(
                paths = self.paths.len(),
                "battery capacity could not be written anywhere"
            );
            self.failing = true;
        }
        self.current = None;
        None
    }
}
