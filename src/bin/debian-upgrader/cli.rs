//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use debian_upgrader::config::{RebootPolicy, UpgraderConfig, DEFAULT_CONFIG_PATH};
use std::path::{Path, PathBuf};

/// Upgrade a Debian host in place to the next major release.
#[derive(Parser, Debug)]
#[command(name = "debian-upgrader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long, short, env = "DEBIAN_UPGRADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replace the source list without asking, even if it looks foreign.
    #[arg(long, short = 'y', env = "DEBIAN_UPGRADER_ASSUME_YES")]
    pub assume_yes: bool,

    /// What to do about rebooting after a release change.
    #[arg(long, value_enum, env = "DEBIAN_UPGRADER_REBOOT")]
    pub reboot: Option<CliRebootPolicy>,

    /// OS identity file.
    #[arg(long, env = "DEBIAN_UPGRADER_OS_RELEASE")]
    pub os_release: Option<PathBuf>,

    /// apt source list to rewrite.
    #[arg(long, env = "DEBIAN_UPGRADER_SOURCES_LIST")]
    pub sources_list: Option<PathBuf>,

    /// Container repository keyring location.
    #[arg(long, env = "DEBIAN_UPGRADER_KEYRING")]
    pub keyring: Option<PathBuf>,

    /// Debian archive mirror written into the source list.
    #[arg(long, env = "DEBIAN_UPGRADER_MIRROR")]
    pub mirror: Option<String>,

    /// Log level.
    #[arg(long, env = "DEBIAN_UPGRADER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,

    /// Write the effective configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    pub write_config: Option<PathBuf>,
}

/// Reboot policy CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliRebootPolicy {
    /// Ask before rebooting.
    Prompt,
    /// Reboot without asking.
    Always,
    /// Never reboot.
    Never,
}

impl Cli {
    /// Convert CLI arguments into an `UpgraderConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be loaded or the result is
    /// invalid.
    pub fn into_config(self) -> color_eyre::Result<UpgraderConfig> {
        // Start with the given file, the system file, or defaults
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        let mut config = match self.config {
            Some(ref path) => UpgraderConfig::from_file(path)?,
            None if default_path.exists() => UpgraderConfig::from_file(default_path)?,
            None => UpgraderConfig::default(),
        };

        // Override with CLI arguments
        if self.assume_yes {
            config.assume_yes = true;
        }
        if let Some(policy) = self.reboot {
            config.reboot.policy = policy.into();
        }
        if let Some(path) = self.os_release {
            config.paths.os_release = path;
        }
        if let Some(path) = self.sources_list {
            config.paths.sources_list = path;
        }
        if let Some(path) = self.keyring {
            config.keyring.path = path;
        }
        if let Some(mirror) = self.mirror {
            config.repositories.mirror = mirror;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl From<CliRebootPolicy> for RebootPolicy {
    fn from(p: CliRebootPolicy) -> Self {
        match p {
            CliRebootPolicy::Prompt => RebootPolicy::Prompt,
            CliRebootPolicy::Always => RebootPolicy::Always,
            CliRebootPolicy::Never => RebootPolicy::Never,
        }
    }
}
