//! System browser launcher.

use std::process::{Command, Stdio};

use nadctl_domain::{NadError, Result};
use tracing::debug;

/// Opens a URL for the user.
pub trait BrowserLauncher: Send + Sync {
    /// Open `url`. Returns once the launcher process is spawned.
    ///
    /// # Errors
    /// Returns `NadError::BrowserLaunchFailed` if no launcher could be started.
    fn open(&self, url: &str) -> Result<()>;
}

/// Launches the platform's default browser.
///
/// Linux and the BSDs try `xdg-open`, then `gio open`, then `kde-open`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

#[cfg(target_os = "windows")]
const LAUNCHERS: &[(&str, &[&str])] = &[("cmd", &["/c", "start", ""])];

#[cfg(target_os = "macos")]
const LAUNCHERS: &[(&str, &[&str])] = &[("open", &[])];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LAUNCHERS: &[(&str, &[&str])] = &[("xdg-open", &[]), ("gio", &["open"]), ("kde-open", &[])];

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let mut failures = Vec::new();

        for &(program, args) in LAUNCHERS {
            let spawned = Command::new(program)
                .args(args)
                .arg(url)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(mut child) => {
                    debug!(program, "browser launcher started");
                    // Reap the launcher so it does not linger as a zombie.
                    std::thread::spawn(move || {
                        let _ = child.wait();
                    });
                    return Ok(());
                }
                Err(err) => failures.push(format!("{program}: {err}")),
            }
        }

        Err(NadError::BrowserLaunchFailed(failures.join("; ")))
    }
}
