//! Test harness: a fake host filesystem plus recording collaborators.
//!
//! The `TestHost` lays out `etc/os-release`, `etc/apt/sources.list` and the
//! keyring under a temp dir and points an `UpgraderConfig` at them.

use debian_upgrader::deps::ToolLocator;
use debian_upgrader::keyring::KeyFetcher;
use debian_upgrader::process::{CommandOutput, CommandRunner, CommandSpec};
use debian_upgrader::prompt::{Confirmation, Prompter};
use debian_upgrader::{Error, Result, Upgrader, UpgraderConfig};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Direct key URL used by every test host.
pub const KEY_URL: &str = "https://keys.test/docker.gpg";

/// Key server URL used by every test host.
pub const KEYSERVER_URL: &str = "https://keyserver.test/lookup";

/// A Debian host laid out under a temp dir.
pub struct TestHost {
    dir: TempDir,
    /// Configuration pointing at the temp dir.
    pub config: UpgraderConfig,
}

impl TestHost {
    /// Host reporting `ID=debian` and the given `VERSION_ID`.
    pub fn debian(version_id: &str) -> Self {
        Self::with_os_release(&format!(
            "PRETTY_NAME=\"Debian GNU/Linux {version_id}\"\n\
             ID=debian\n\
             VERSION_ID=\"{version_id}\"\n"
        ))
    }

    /// Host with arbitrary os-release content.
    pub fn with_os_release(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let etc = dir.path().join("etc");
        std::fs::create_dir_all(etc.join("apt/sources.list.d")).unwrap();
        std::fs::write(etc.join("os-release"), content).unwrap();

        let mut config = UpgraderConfig::default();
        config.paths.os_release = etc.join("os-release");
        config.paths.sources_list = etc.join("apt/sources.list");
        config.paths.legacy_fragment = etc.join("apt/sources.list.d/docker.list");
        config.keyring.path = dir.path().join("usr/share/keyrings/docker-archive-keyring.gpg");
        config.keyring.url = KEY_URL.to_string();
        config.keyring.keyserver_url = KEYSERVER_URL.to_string();

        Self { dir, config }
    }

    /// Root of the fake filesystem.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write the current source list.
    pub fn write_sources(&self, content: &str) {
        std::fs::write(&self.config.paths.sources_list, content).unwrap();
    }

    /// Read the current source list.
    pub fn sources(&self) -> String {
        std::fs::read_to_string(&self.config.paths.sources_list).unwrap()
    }

    /// Create the legacy fragment.
    pub fn write_legacy_fragment(&self) {
        std::fs::write(
            &self.config.paths.legacy_fragment,
            "deb https://download.docker.com/linux/debian buster stable\n",
        )
        .unwrap();
    }

    /// Create the keyring file.
    pub fn write_keyring(&self, content: &[u8]) {
        let path = &self.config.keyring.path;
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Every file under the root with its content, for before/after checks.
    pub fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>)> {
        fn walk(dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    let content = std::fs::read(&path).unwrap();
                    out.push((path, content));
                }
            }
        }
        let mut files = Vec::new();
        walk(self.root(), &mut files);
        files.sort();
        files
    }

    /// Build an upgrader over this host with the given collaborators.
    ///
    /// Prerequisite lookup is confined to an empty directory, so every tool
    /// counts as missing.
    pub fn upgrader(
        &self,
        runner: &RecordingRunner,
        fetcher: &CannedFetcher,
        prompter: &ScriptedPrompter,
    ) -> Upgrader<RecordingRunner, CannedFetcher, ScriptedPrompter> {
        Upgrader::new(
            self.config.clone(),
            runner.clone(),
            fetcher.clone(),
            prompter.clone(),
        )
        .with_tool_locator(ToolLocator::with_search_path(self.root().join("bin")))
    }
}

/// Records commands and succeeds unless told to fail a subcommand.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    commands: Arc<Mutex<Vec<CommandSpec>>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    /// Runner whose commands all succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that reports exit status 100 for the first argument `subcommand`.
    pub fn failing_on(subcommand: &str) -> Self {
        Self {
            fail_on: Some(subcommand.to_string()),
            ..Self::default()
        }
    }

    /// Every command run so far.
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }

    /// First argument of each apt-get command run.
    pub fn apt_subcommands(&self) -> Vec<String> {
        self.commands()
            .iter()
            .filter(|c| c.program == "apt-get")
            .map(|c| c.args.first().cloned().unwrap_or_default())
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.clone());
        let subcommand = command.args.first().map(String::as_str);
        if self.fail_on.is_some() && self.fail_on.as_deref() == subcommand {
            return Ok(CommandOutput::exit(100));
        }
        Ok(CommandOutput::success())
    }
}

/// Serves fixed bodies by URL; unknown URLs fail.
#[derive(Clone, Default)]
pub struct CannedFetcher {
    bodies: Arc<HashMap<String, Vec<u8>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedFetcher {
    /// Fetcher with no URLs; every request fails.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Fetcher serving `body` at `url`.
    pub fn serving(url: &str, body: &[u8]) -> Self {
        let mut bodies = HashMap::new();
        bodies.insert(url.to_string(), body.to_vec());
        Self {
            bodies: Arc::new(bodies),
            requests: Arc::default(),
        }
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl KeyFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| Error::KeyFetch(format!("no route to {url}")))
    }
}

/// Answers questions from a script; an unscripted question declines.
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    answers: Arc<Mutex<VecDeque<&'static str>>>,
    questions: Arc<Mutex<Vec<String>>>,
    shown: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    /// Prompter that will type `answers` in order.
    pub fn answering(answers: &[&'static str]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.iter().copied().collect())),
            ..Self::default()
        }
    }

    /// Questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    /// Text shown so far.
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&self, text: &str) -> Result<()> {
        self.shown.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn confirm(&self, question: &str) -> Result<Confirmation> {
        self.questions.lock().unwrap().push(question.to_string());
        let answer = self.answers.lock().unwrap().pop_front().unwrap_or("");
        Ok(Confirmation::from_answer(answer))
    }
}
