//! Configuration for debian-upgrader.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location checked for a configuration file when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/debian-upgrader/config.toml";

/// What to do about a reboot after a major release transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebootPolicy {
    /// Ask the operator.
    #[default]
    Prompt,
    /// Reboot without asking.
    Always,
    /// Never reboot, only log a reminder.
    Never,
}

/// Upgrader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgraderConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Replace the source list without asking when the marker is absent.
    #[serde(default)]
    pub assume_yes: bool,

    /// Host file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Repository URLs written into the source list.
    #[serde(default)]
    pub repositories: RepositoryConfig,

    /// Container repository signing key.
    #[serde(default)]
    pub keyring: KeyringConfig,

    /// Package manager invocation.
    #[serde(default)]
    pub apt: AptConfig,

    /// Reboot handling.
    #[serde(default)]
    pub reboot: RebootConfig,
}

/// Host file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// OS identity file.
    #[serde(default = "default_os_release")]
    pub os_release: PathBuf,

    /// apt source list.
    #[serde(default = "default_sources_list")]
    pub sources_list: PathBuf,

    /// Obsolete source fragment removed after the upgrade.
    #[serde(default = "default_legacy_fragment")]
    pub legacy_fragment: PathBuf,
}

/// Repositories rendered into the source-list templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Debian archive mirror.
    #[serde(default = "default_mirror")]
    pub mirror: String,

    /// Debian security archive mirror.
    #[serde(default = "default_security_mirror")]
    pub security_mirror: String,

    /// Container runtime repository.
    #[serde(default = "default_container_repo")]
    pub container_repo: String,

    /// dpkg architecture of the container repository entry.
    #[serde(default = "default_architecture")]
    pub architecture: String,

    /// Substring an active source line must contain for the rewrite to
    /// proceed without confirmation.
    #[serde(default = "default_marker")]
    pub marker: String,
}

/// A command that must be on `PATH`, and the package providing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    /// Executable name.
    pub command: String,
    /// Debian package that installs it.
    pub package: String,
}

impl Prerequisite {
    /// Create a prerequisite entry.
    #[must_use]
    pub fn new(command: &str, package: &str) -> Self {
        Self {
            command: command.to_string(),
            package: package.to_string(),
        }
    }
}

/// Signing key provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Binary keyring location referenced by `signed-by=`.
    #[serde(default = "default_keyring_path")]
    pub path: PathBuf,

    /// Direct download URL.
    #[serde(default = "default_key_url")]
    pub url: String,

    /// Key server lookup URL used when the direct download fails.
    #[serde(default = "default_keyserver_url")]
    pub keyserver_url: String,

    /// Tools installed before the key server fallback.
    #[serde(default = "default_prerequisites")]
    pub prerequisites: Vec<Prerequisite>,
}

/// Package manager invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AptConfig {
    /// apt front-end executable.
    #[serde(default = "default_apt_program")]
    pub program: String,

    /// `DEBIAN_FRONTEND` value passed to every apt invocation.
    #[serde(default = "default_frontend")]
    pub frontend: String,

    /// Keep locally modified conffiles instead of prompting.
    #[serde(default = "default_true")]
    pub keep_existing_conffiles: bool,
}

/// Reboot handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebootConfig {
    /// Reboot policy after a release transition.
    #[serde(default)]
    pub policy: RebootPolicy,

    /// Command line that restarts the host.
    #[serde(default = "default_reboot_command")]
    pub command: Vec<String>,
}

impl Default for UpgraderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            assume_yes: false,
            paths: PathsConfig::default(),
            repositories: RepositoryConfig::default(),
            keyring: KeyringConfig::default(),
            apt: AptConfig::default(),
            reboot: RebootConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            os_release: default_os_release(),
            sources_list: default_sources_list(),
            legacy_fragment: default_legacy_fragment(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            mirror: default_mirror(),
            security_mirror: default_security_mirror(),
            container_repo: default_container_repo(),
            architecture: default_architecture(),
            marker: default_marker(),
        }
    }
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            path: default_keyring_path(),
            url: default_key_url(),
            keyserver_url: default_keyserver_url(),
            prerequisites: default_prerequisites(),
        }
    }
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            program: default_apt_program(),
            frontend: default_frontend(),
            keep_existing_conffiles: true,
        }
    }
}

impl Default for RebootConfig {
    fn default() -> Self {
        Self {
            policy: RebootPolicy::default(),
            command: default_reboot_command(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_os_release() -> PathBuf {
    PathBuf::from("/etc/os-release")
}

fn default_sources_list() -> PathBuf {
    PathBuf::from("/etc/apt/sources.list")
}

fn default_legacy_fragment() -> PathBuf {
    PathBuf::from("/etc/apt/sources.list.d/docker.list")
}

fn default_mirror() -> String {
    "http://deb.debian.org/debian".to_string()
}

fn default_security_mirror() -> String {
    "http://security.debian.org/debian-security".to_string()
}

fn default_container_repo() -> String {
    "https://download.docker.com/linux/debian".to_string()
}

fn default_architecture() -> String {
    "amd64".to_string()
}

fn default_marker() -> String {
    "deb.debian.org".to_string()
}

fn default_keyring_path() -> PathBuf {
    PathBuf::from("/usr/share/keyrings/docker-archive-keyring.gpg")
}

fn default_key_url() -> String {
    "https://download.docker.com/linux/debian/gpg".to_string()
}

fn default_keyserver_url() -> String {
    // Docker Release (CE deb) <docker@docker.com>
    concat!(
        "https://keyserver.ubuntu.com/pks/lookup?op=get&options=mr",
        "&search=0x9DC858229FC7DD38854AE2D88D81803C0EBFCD88"
    )
    .to_string()
}

fn default_prerequisites() -> Vec<Prerequisite> {
    vec![
        Prerequisite::new("gpg", "gnupg"),
        Prerequisite::new("update-ca-certificates", "ca-certificates"),
    ]
}

fn default_apt_program() -> String {
    "apt-get".to_string()
}

fn default_frontend() -> String {
    "noninteractive".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_reboot_command() -> Vec<String> {
    vec!["systemctl".to_string(), "reboot".to_string()]
}

impl UpgraderConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> crate::Result<()> {
        if self.repositories.marker.trim().is_empty() {
            return Err(crate::Error::Config(
                "repositories.marker must not be empty".to_string(),
            ));
        }
        if self.apt.program.trim().is_empty() {
            return Err(crate::Error::Config(
                "apt.program must not be empty".to_string(),
            ));
        }
        if self.reboot.command.is_empty() {
            return Err(crate::Error::Config(
                "reboot.command must name a program".to_string(),
            ));
        }
        Ok(())
    }
}
