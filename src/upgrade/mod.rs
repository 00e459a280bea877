//! Upgrade orchestration.
//!
//! A run goes through these steps in order, stopping at the first fatal one:
//!
//! ```text
//! read /etc/os-release ──► not Debian? ──► abort
//!          │
//!          ▼
//!   dispatch VERSION_ID ──► not 10/11/12? ──► abort
//!          │
//!          ▼
//!   provision keyring (never fatal)
//!          │
//!          ▼
//!   10/11: rewrite sources.list   12: leave it alone
//!          │
//!          ▼
//!   remove legacy fragment
//!          │
//!          ▼
//!   apt-get update / upgrade / full-upgrade / autoremove --purge
//!          │
//!          ▼
//!   release changed? ──► offer reboot
//! ```

mod cleanup;

pub use cleanup::{handle_reboot, remove_legacy_fragment, RebootOutcome};

use crate::apt::{self, AptGet};
use crate::config::UpgraderConfig;
use crate::deps::ToolLocator;
use crate::error::Result;
use crate::keyring::{HttpKeyFetcher, KeyFetcher, KeyProvisioner, KeyStatus};
use crate::os_release::OsRelease;
use crate::process::{CommandRunner, SystemRunner};
use crate::prompt::{Prompter, StdioPrompter};
use crate::release::UpgradePlan;
use crate::sources::SourcesRewriter;
use tracing::info;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// The plan that was executed.
    pub plan: UpgradePlan,
    /// Keyring outcome.
    pub key: KeyStatus,
    /// Whether the source list was replaced.
    pub sources_rewritten: bool,
    /// Whether the legacy fragment existed and was deleted.
    pub legacy_fragment_removed: bool,
    /// Reboot outcome.
    pub reboot: RebootOutcome,
}

/// Drives one upgrade run.
pub struct Upgrader<R = SystemRunner, F = HttpKeyFetcher, P = StdioPrompter> {
    config: UpgraderConfig,
    runner: R,
    fetcher: F,
    prompter: P,
    locator: ToolLocator,
}

impl Upgrader {
    /// Create an upgrader acting on the local host.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn system(config: UpgraderConfig) -> Result<Self> {
        Ok(Self::new(
            config,
            SystemRunner,
            HttpKeyFetcher::new()?,
            StdioPrompter,
        ))
    }
}

impl<R: CommandRunner, F: KeyFetcher, P: Prompter> Upgrader<R, F, P> {
    /// Create an upgrader with explicit collaborators.
    #[must_use]
    pub fn new(config: UpgraderConfig, runner: R, fetcher: F, prompter: P) -> Self {
        Self {
            config,
            runner,
            fetcher,
            prompter,
            locator: ToolLocator::from_env(),
        }
    }

    /// Resolve prerequisite tools with `locator` instead of `PATH`.
    #[must_use]
    pub fn with_tool_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &UpgraderConfig {
        &self.config
    }

    /// Read the host identity and decide what to do, touching nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not Debian-derived or runs an
    /// unsupported release.
    pub fn plan(&self) -> Result<UpgradePlan> {
        let os = OsRelease::load(&self.config.paths.os_release)?;
        os.require_debian_family()?;
        let plan = UpgradePlan::from_os_release(&os)?;
        info!("Detected {} ({})", plan.installed(), os.pretty_name());
        Ok(plan)
    }

    /// Run the full upgrade.
    ///
    /// # Errors
    ///
    /// Returns an error on an unsupported host, when the operator declines
    /// the source-list replacement, or when any apt step fails.
    pub async fn run(&self) -> Result<UpgradeReport> {
        let plan = self.plan()?;
        let apt_get = AptGet::new(&self.config.apt);

        let key = KeyProvisioner::new(
            &self.config.keyring,
            &self.runner,
            &self.fetcher,
            &apt_get,
            &self.locator,
        )
        .provision()
        .await;

        let sources_rewritten = match plan.target() {
            Some(target) => {
                info!("Pointing sources at {target}");
                SourcesRewriter::new(
                    &self.config.paths.sources_list,
                    &self.config.repositories,
                    &self.config.keyring.path,
                )
                .assume_yes(self.config.assume_yes)
                .rewrite(target, &self.prompter)
                .await?;
                true
            }
            None => {
                info!("{} is current; leaving sources unchanged", plan.installed());
                false
            }
        };

        let legacy_fragment_removed =
            remove_legacy_fragment(&self.config.paths.legacy_fragment)?;

        apt::run_upgrade(&self.runner, &apt_get).await?;

        let reboot =
            handle_reboot(&plan, &self.config.reboot, &self.runner, &self.prompter).await?;

        Ok(UpgradeReport {
            plan,
            key,
            sources_rewritten,
            legacy_fragment_removed,
            reboot,
        })
    }
}
