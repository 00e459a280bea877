//! Prerequisite tool installation.

use crate::apt::AptGet;
use crate::config::Prerequisite;
use crate::process::CommandRunner;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Resolves executables on a search path.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    /// Overrides `PATH` when set.
    search_path: Option<OsString>,
}

impl ToolLocator {
    /// Locate tools on the process `PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Locate tools on an explicit search path.
    #[must_use]
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Full path of `command`, if it resolves.
    #[must_use]
    pub fn find(&self, command: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(command, Some(paths), cwd)
            }
            None => which::which(command),
        };
        found.ok()
    }

    /// Whether `command` resolves.
    #[must_use]
    pub fn is_installed(&self, command: &str) -> bool {
        self.find(command).is_some()
    }
}

/// Install the packages of any missing prerequisites.
///
/// Installation failures are logged and otherwise ignored. Returns the
/// commands that still do not resolve afterwards.
pub async fn ensure_tools<R: CommandRunner>(
    runner: &R,
    apt: &AptGet,
    locator: &ToolLocator,
    prerequisites: &[Prerequisite],
) -> Vec<String> {
    let missing: Vec<&Prerequisite> = prerequisites
        .iter()
        .filter(|p| {
            let installed = locator.is_installed(&p.command);
            debug!("{} installed: {installed}", p.command);
            !installed
        })
        .collect();

    for prerequisite in &missing {
        info!(
            "Installing {} to provide {}",
            prerequisite.package, prerequisite.command
        );
        let command = apt.install([prerequisite.package.as_str()]);
        if let Err(e) = runner.run_checked(&command).await {
            warn!("Could not install {}: {e}", prerequisite.package);
        }
    }

    missing
        .into_iter()
        .filter(|p| !locator.is_installed(&p.command))
        .map(|p| p.command.clone())
        .collect()
}
