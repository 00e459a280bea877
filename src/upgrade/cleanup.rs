//! Post-upgrade cleanup and the reboot decision.

use crate::config::{RebootConfig, RebootPolicy};
use crate::error::Result;
use crate::process::{CommandRunner, CommandSpec};
use crate::prompt::Prompter;
use crate::release::UpgradePlan;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// What happened about rebooting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootOutcome {
    /// No release transition, so no reboot was offered.
    NotNeeded,
    /// The reboot command was issued.
    Rebooting,
    /// A reboot is needed but was not performed.
    Deferred,
}

/// Delete the legacy source fragment. Returns whether a file was removed.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn remove_legacy_fragment(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed legacy source fragment {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No legacy source fragment at {}", path.display());
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Offer or perform a reboot after a release transition.
///
/// # Errors
///
/// Returns an error if the prompt fails or the reboot command fails.
pub async fn handle_reboot<R: CommandRunner, P: Prompter>(
    plan: &UpgradePlan,
    config: &RebootConfig,
    runner: &R,
    prompter: &P,
) -> Result<RebootOutcome> {
    if !plan.is_major_transition() {
        return Ok(RebootOutcome::NotNeeded);
    }

    let reboot = match config.policy {
        RebootPolicy::Always => true,
        RebootPolicy::Never => false,
        RebootPolicy::Prompt => prompter
            .confirm("The release upgrade is installed. Reboot now?")
            .await?
            .is_confirmed(),
    };

    if !reboot {
        info!("Reboot skipped; reboot the host to finish moving off {}", plan.installed());
        return Ok(RebootOutcome::Deferred);
    }

    info!("Rebooting");
    let command = CommandSpec::from_argv(&config.command)?;
    runner.run_checked(&command).await?;
    Ok(RebootOutcome::Rebooting)
}
