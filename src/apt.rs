//! apt-get invocation and the package upgrade sequence.

use crate::config::AptConfig;
use crate::error::Result;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use tracing::info;

/// Builds apt-get command lines with non-interactive settings applied to
/// each child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptGet {
    program: String,
    frontend: String,
    keep_existing_conffiles: bool,
}

impl AptGet {
    /// Create from configuration.
    #[must_use]
    pub fn new(config: &AptConfig) -> Self {
        Self {
            program: config.program.clone(),
            frontend: config.frontend.clone(),
            keep_existing_conffiles: config.keep_existing_conffiles,
        }
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(self.program.clone())
            .env("DEBIAN_FRONTEND", self.frontend.clone())
            .args(args)
    }

    fn mutating<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = self.command(args).arg("-y");
        if self.keep_existing_conffiles {
            cmd = cmd.args([
                "-o",
                "Dpkg::Options::=--force-confdef",
                "-o",
                "Dpkg::Options::=--force-confold",
            ]);
        }
        cmd
    }

    /// `apt-get update`
    #[must_use]
    pub fn update(&self) -> CommandSpec {
        self.command(["update"])
    }

    /// `apt-get upgrade -y`: never installs or removes packages.
    #[must_use]
    pub fn upgrade(&self) -> CommandSpec {
        self.mutating(["upgrade"])
    }

    /// `apt-get full-upgrade -y`: may install or remove packages.
    #[must_use]
    pub fn full_upgrade(&self) -> CommandSpec {
        self.mutating(["full-upgrade"])
    }

    /// `apt-get autoremove --purge -y`
    #[must_use]
    pub fn autoremove_purge(&self) -> CommandSpec {
        self.mutating(["autoremove", "--purge"])
    }

    /// `apt-get install -y <packages>`
    #[must_use]
    pub fn install<I, S>(&self, packages: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutating(["install"]).args(packages)
    }

    /// The four upgrade steps in the order they must run.
    #[must_use]
    pub fn upgrade_sequence(&self) -> [(&'static str, CommandSpec); 4] {
        [
            ("Refreshing package metadata", self.update()),
            ("Upgrading installed packages", self.upgrade()),
            ("Running full upgrade", self.full_upgrade()),
            ("Purging unneeded packages", self.autoremove_purge()),
        ]
    }
}

/// Run update, upgrade, full-upgrade and autoremove in order.
///
/// # Errors
///
/// Stops at and returns the first command that fails.
pub async fn run_upgrade<R: CommandRunner>(runner: &R, apt: &AptGet) -> Result<Vec<CommandOutput>> {
    let mut outputs = Vec::with_capacity(4);
    for (step, command) in apt.upgrade_sequence() {
        info!("{step}");
        outputs.push(runner.run_checked(&command).await?);
    }
    Ok(outputs)
}
