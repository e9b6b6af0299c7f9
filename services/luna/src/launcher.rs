//! Platform implementation of the command side effects.

use anyhow::{Context, Result};
use luna_core::router::ActionLauncher;
use std::process::{Command, Stdio};
use tracing::info;

/// Opens URLs, programs and folders with the desktop's default opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn open(&self, target: &str) -> Result<()> {
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", target]);
            c
        };

        #[cfg(target_os = "macos")]
        let mut command = {
            let mut c = Command::new("open");
            c.arg(target);
            c
        };

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let mut command = {
            let mut c = Command::new("xdg-open");
            c.arg(target);
            c
        };

        command
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to open '{}'", target))?;
        Ok(())
    }
}

impl ActionLauncher for SystemLauncher {
    fn open_browser(&self, target: &str) -> Result<()> {
        info!(target = %target, "Opening browser");
        self.open(target)
    }

    fn open_folder(&self, path: &str) -> Result<()> {
        if !std::path::Path::new(path).is_dir() {
            anyhow::bail!("Folder does not exist: {}", path);
        }
        info!(path = %path, "Opening folder");
        self.open(path)
    }

    fn eye_control(&self) -> Result<()> {
        info!("Eye-controlled mouse is not available on this system");
        Ok(())
    }

    fn forecast(&self) -> Result<()> {
        info!("Weather forecast is not available on this system");
        Ok(())
    }
}
