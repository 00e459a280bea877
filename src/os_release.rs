//! `/etc/os-release` parsing.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Identity of the running operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    fields: HashMap<String, String>,
}

impl OsRelease {
    /// Read and parse an os-release file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Reading OS identity from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::UnsupportedOs(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse os-release content. Malformed lines are skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let fields = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), unquote(value.trim())))
            .collect();

        Self { fields }
    }

    /// Look up a raw field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// `ID`, lowercased by convention of the file format.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get("ID")
    }

    /// Whitespace-separated `ID_LIKE` entries.
    pub fn id_like(&self) -> impl Iterator<Item = &str> {
        self.get("ID_LIKE").unwrap_or_default().split_whitespace()
    }

    /// `VERSION_ID`.
    #[must_use]
    pub fn version_id(&self) -> Option<&str> {
        self.get("VERSION_ID")
    }

    /// Human-readable name, falling back to `ID`.
    #[must_use]
    pub fn pretty_name(&self) -> &str {
        self.get("PRETTY_NAME")
            .or_else(|| self.id())
            .unwrap_or("unknown")
    }

    /// Whether this is Debian or declares itself Debian-like.
    #[must_use]
    pub fn is_debian_family(&self) -> bool {
        self.id() == Some("debian") || self.id_like().any(|like| like == "debian")
    }

    /// Fail unless the host is Debian-derived.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOs`] for any other family.
    pub fn require_debian_family(&self) -> Result<()> {
        if self.is_debian_family() {
            Ok(())
        } else {
            Err(Error::UnsupportedOs(self.pretty_name().to_string()))
        }
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));

    stripped.unwrap_or(value).to_string()
}
