//! # debian-upgrader
//!
//! In-place Debian release upgrades for virtual-machine images.
//!
//! A run detects the installed release, provisions the container repository
//! signing key, rewrites `/etc/apt/sources.list` for the next release, runs
//! the apt upgrade sequence and finally offers a reboot.
//!
//! ## Example
//!
//! ```rust,ignore
//! use debian_upgrader::{Upgrader, UpgraderConfig};
//!
//! let report = Upgrader::system(UpgraderConfig::default())?.run().await?;
//! ```

pub mod apt;
pub mod atomic;
pub mod config;
pub mod deps;
pub mod error;
pub mod keyring;
pub mod os_release;
pub mod process;
pub mod prompt;
pub mod release;
pub mod sources;
pub mod upgrade;

pub use config::UpgraderConfig;
pub use error::{Error, Result};
pub use release::{DebianRelease, TargetRelease, UpgradePlan};
pub use upgrade::{UpgradeReport, Upgrader};
