//! apt source-list rewriting.
//!
//! The source list is only replaced wholesale. If no active line carries the
//! configured marker the file was not laid out by us, so the operator has to
//! confirm the replacement after seeing the current content.

pub mod templates;

use crate::atomic::write_atomic;
use crate::config::RepositoryConfig;
use crate::error::{Error, Result};
use crate::prompt::{Confirmation, Prompter};
use crate::release::TargetRelease;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Whether any uncommented line of `content` contains `marker`.
#[must_use]
pub fn contains_marker(content: &str, marker: &str) -> bool {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.starts_with('#'))
        .any(|line| line.contains(marker))
}

/// Rewrites the source list for a target release.
pub struct SourcesRewriter<'a> {
    path: PathBuf,
    repos: &'a RepositoryConfig,
    keyring: &'a Path,
    assume_yes: bool,
}

impl<'a> SourcesRewriter<'a> {
    /// Create a rewriter for the source list at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, repos: &'a RepositoryConfig, keyring: &'a Path) -> Self {
        Self {
            path: path.into(),
            repos,
            keyring,
            assume_yes: false,
        }
    }

    /// Skip the confirmation prompt when the marker is missing.
    #[must_use]
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Current content; a missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn current(&self) -> Result<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Decide whether the rewrite may go ahead, asking if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or the terminal cannot be read.
    pub async fn confirm<P: Prompter>(&self, prompter: &P) -> Result<Confirmation> {
        let current = self.current()?;
        if contains_marker(&current, &self.repos.marker) {
            debug!("Marker {:?} found in {}", self.repos.marker, self.path.display());
            return Ok(Confirmation::Confirmed);
        }
        if self.assume_yes {
            info!(
                "Marker {:?} not found in {}; replacing anyway (assume yes)",
                self.repos.marker,
                self.path.display()
            );
            return Ok(Confirmation::Confirmed);
        }

        prompter.show(&format!(
            "{} does not reference {}. Current content:\n{current}",
            self.path.display(),
            self.repos.marker
        ))?;
        prompter
            .confirm(&format!("Replace {}?", self.path.display()))
            .await
    }

    /// Replace the source list with the template for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Declined`] if the operator refuses, leaving the file
    /// untouched, or an I/O error if it cannot be written.
    pub async fn rewrite<P: Prompter>(&self, target: TargetRelease, prompter: &P) -> Result<()> {
        if self.confirm(prompter).await? == Confirmation::Declined {
            return Err(Error::Declined(format!(
                "replacement of {}",
                self.path.display()
            )));
        }

        let content = templates::render(target, self.repos, self.keyring);
        write_atomic(&self.path, content.as_bytes(), 0o644)?;
        info!("Rewrote {} for {target}", self.path.display());
        Ok(())
    }
}
