//! Container repository signing-key provisioning.
//!
//! The keyring is provisioned once: if the file exists nothing is fetched.
//! Otherwise the key is downloaded directly, and if that fails the
//! prerequisite tools are installed and the key is pulled from a key server.
//! ASCII-armored keys are converted to the binary format apt's `signed-by=`
//! expects with `gpg --dearmor`. Every failure here is recoverable.

use crate::apt::AptGet;
use crate::atomic::write_atomic;
use crate::config::KeyringConfig;
use crate::deps::{self, ToolLocator};
use crate::error::{Error, Result};
use crate::process::{CommandRunner, CommandSpec};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const ARMOR_HEADER: &[u8] = b"-----BEGIN PGP PUBLIC KEY BLOCK-----";

/// Fetches key material over the network.
pub trait KeyFetcher: Sync {
    /// GET `url` and return the response body.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// HTTPS key fetcher.
#[derive(Debug, Clone)]
pub struct HttpKeyFetcher {
    client: reqwest::Client,
}

impl HttpKeyFetcher {
    /// Create a fetcher with a connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("debian-upgrader/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// How the keyring ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// The file already existed; nothing was fetched.
    AlreadyPresent,
    /// Written from the direct download.
    Downloaded,
    /// Written from the key server fallback.
    FetchedFromKeyserver,
    /// Both sources failed; the run continues without a keyring.
    Unavailable,
}

/// Whether `data` is an ASCII-armored OpenPGP key.
#[must_use]
pub fn is_armored(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(ARMOR_HEADER)
}

/// Provisions the keyring file.
pub struct KeyProvisioner<'a, R, F> {
    config: &'a KeyringConfig,
    runner: &'a R,
    fetcher: &'a F,
    apt: &'a AptGet,
    locator: &'a ToolLocator,
}

impl<'a, R: CommandRunner, F: KeyFetcher> KeyProvisioner<'a, R, F> {
    /// Create a provisioner.
    #[must_use]
    pub fn new(
        config: &'a KeyringConfig,
        runner: &'a R,
        fetcher: &'a F,
        apt: &'a AptGet,
        locator: &'a ToolLocator,
    ) -> Self {
        Self {
            config,
            runner,
            fetcher,
            apt,
            locator,
        }
    }

    /// Make sure the keyring exists. Never fails; problems are logged.
    pub async fn provision(&self) -> KeyStatus {
        let path = &self.config.path;
        if path.exists() {
            debug!("Keyring {} already present", path.display());
            return KeyStatus::AlreadyPresent;
        }

        info!("Keyring {} missing, downloading", path.display());
        match self.install_from(&self.config.url).await {
            Ok(()) => return KeyStatus::Downloaded,
            Err(e) => warn!("Direct key download failed: {e}"),
        }

        let still_missing = deps::ensure_tools(
            self.runner,
            self.apt,
            self.locator,
            &self.config.prerequisites,
        )
        .await;
        if !still_missing.is_empty() {
            warn!("Prerequisites still missing: {}", still_missing.join(", "));
        }

        info!("Fetching key from key server");
        match self.install_from(&self.config.keyserver_url).await {
            Ok(()) => KeyStatus::FetchedFromKeyserver,
            Err(e) => {
                warn!(
                    "Key server fetch failed: {e}; continuing without {}",
                    path.display()
                );
                KeyStatus::Unavailable
            }
        }
    }

    async fn install_from(&self, url: &str) -> Result<()> {
        let raw = self.fetcher.fetch(url).await?;
        let key = self.to_binary(raw).await?;
        if key.is_empty() {
            return Err(Error::KeyFetch(format!("{url} returned no key data")));
        }
        write_keyring(&self.config.path, &key)
    }

    async fn to_binary(&self, raw: Vec<u8>) -> Result<Vec<u8>> {
        if !is_armored(&raw) {
            return Ok(raw);
        }
        debug!("Dearmoring ASCII-armored key");
        let command = CommandSpec::new("gpg")
            .args(["--batch", "--dearmor"])
            .stdin(raw)
            .capture_stdout();
        Ok(self.runner.run_checked(&command).await?.stdout)
    }
}

/// Atomically write a world-readable keyring, creating its directory.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_keyring(path: &Path, key: &[u8]) -> Result<()> {
    write_atomic(path, key, 0o644)?;
    info!(
        "Wrote keyring {} (sha256 {})",
        path.display(),
        hex::encode(Sha256::digest(key))
    );
    Ok(())
}
