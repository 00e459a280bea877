//! Supported Debian releases and the upgrade path between them.

use crate::error::{Error, Result};
use crate::os_release::OsRelease;
use std::fmt;
use std::str::FromStr;

/// An installed Debian release this tool knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebianRelease {
    /// Debian 10.
    Buster,
    /// Debian 11.
    Bullseye,
    /// Debian 12.
    Bookworm,
}

impl DebianRelease {
    /// Every supported installed release, oldest first.
    pub const ALL: [Self; 3] = [Self::Buster, Self::Bullseye, Self::Bookworm];

    /// Map an os-release `VERSION_ID` to a release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] for anything but 10, 11 or 12.
    pub fn from_version_id(version_id: &str) -> Result<Self> {
        match version_id.trim() {
            "10" => Ok(Self::Buster),
            "11" => Ok(Self::Bullseye),
            "12" => Ok(Self::Bookworm),
            other => Err(Error::UnsupportedVersion(other.to_string())),
        }
    }

    /// Major version number.
    #[must_use]
    pub const fn version(self) -> u8 {
        match self {
            Self::Buster => 10,
            Self::Bullseye => 11,
            Self::Bookworm => 12,
        }
    }

    /// Release codename.
    #[must_use]
    pub const fn codename(self) -> &'static str {
        match self {
            Self::Buster => "buster",
            Self::Bullseye => "bullseye",
            Self::Bookworm => "bookworm",
        }
    }

    /// The release the source list should point at next, if any.
    #[must_use]
    pub const fn next(self) -> Option<TargetRelease> {
        match self {
            Self::Buster => Some(TargetRelease::Bullseye),
            Self::Bullseye => Some(TargetRelease::Bookworm),
            Self::Bookworm => None,
        }
    }
}

impl fmt::Display for DebianRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Debian {} ({})", self.version(), self.codename())
    }
}

/// A release the source list can be rewritten for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRelease {
    /// Debian 11.
    Bullseye,
    /// Debian 12.
    Bookworm,
}

impl TargetRelease {
    /// Every rewrite target.
    pub const ALL: [Self; 2] = [Self::Bullseye, Self::Bookworm];

    /// Release codename.
    #[must_use]
    pub const fn codename(self) -> &'static str {
        match self {
            Self::Bullseye => "bullseye",
            Self::Bookworm => "bookworm",
        }
    }
}

impl FromStr for TargetRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullseye" => Ok(Self::Bullseye),
            "bookworm" => Ok(Self::Bookworm),
            _ => Err(Error::UnsupportedRelease(s.to_string())),
        }
    }
}

impl fmt::Display for TargetRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

/// What a run will do, decided from the installed release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradePlan {
    /// Rewrite sources for the next release, then upgrade.
    Transition {
        /// Installed release.
        from: DebianRelease,
        /// Release the sources are rewritten for.
        to: TargetRelease,
    },
    /// Already on the newest supported release; upgrade in place only.
    Current(DebianRelease),
}

impl UpgradePlan {
    /// Dispatch an installed release to its plan.
    #[must_use]
    pub const fn for_release(release: DebianRelease) -> Self {
        match release.next() {
            Some(to) => Self::Transition { from: release, to },
            None => Self::Current(release),
        }
    }

    /// Dispatch from a parsed os-release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] when `VERSION_ID` is missing or
    /// not a supported release.
    pub fn from_os_release(os: &OsRelease) -> Result<Self> {
        let version_id = os
            .version_id()
            .ok_or_else(|| Error::UnsupportedVersion("missing VERSION_ID".to_string()))?;
        DebianRelease::from_version_id(version_id).map(Self::for_release)
    }

    /// The installed release.
    #[must_use]
    pub const fn installed(&self) -> DebianRelease {
        match self {
            Self::Transition { from, .. } => *from,
            Self::Current(release) => *release,
        }
    }

    /// The source-list rewrite target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<TargetRelease> {
        match self {
            Self::Transition { to, .. } => Some(*to),
            Self::Current(_) => None,
        }
    }

    /// Whether the run crosses a major version boundary.
    #[must_use]
    pub const fn is_major_transition(&self) -> bool {
        matches!(self, Self::Transition { .. })
    }
}
