//! Full upgrade runs against a fake host.

use super::harness::{
    CannedFetcher, RecordingRunner, ScriptedPrompter, TestHost, KEYSERVER_URL, KEY_URL,
};
use debian_upgrader::keyring::KeyStatus;
use debian_upgrader::sources::templates;
use debian_upgrader::upgrade::RebootOutcome;
use debian_upgrader::{DebianRelease, Error, TargetRelease};

const BUSTER_SOURCES: &str = "\
deb http://deb.debian.org/debian buster main
deb http://security.debian.org/debian-security buster/updates main
deb http://deb.debian.org/debian buster-updates main
";

const UPGRADE_SEQUENCE: [&str; 4] = ["update", "upgrade", "full-upgrade", "autoremove"];

fn expected_sources(host: &TestHost, target: TargetRelease) -> String {
    templates::render(target, &host.config.repositories, &host.config.keyring.path)
}

/// Test 1: Debian 10 gets the bullseye source list and the full apt sequence
#[tokio::test]
async fn test_buster_moves_to_bullseye() {
    let host = TestHost::debian("10");
    host.write_sources(BUSTER_SOURCES);
    host.write_keyring(b"key");

    let runner = RecordingRunner::new();
    let prompter = ScriptedPrompter::answering(&["n"]);
    let report = host
        .upgrader(&runner, &CannedFetcher::offline(), &prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(host.sources(), expected_sources(&host, TargetRelease::Bullseye));
    assert!(report.sources_rewritten);
    assert_eq!(report.plan.installed(), DebianRelease::Buster);
    assert_eq!(runner.apt_subcommands(), UPGRADE_SEQUENCE);
    assert_eq!(report.reboot, RebootOutcome::Deferred);
    // Only the reboot question; the marker was present
    assert_eq!(prompter.questions().len(), 1);
}

/// Test 2: Debian 11 gets the bookworm source list including the container repo
#[tokio::test]
async fn test_bullseye_moves_to_bookworm() {
    let host = TestHost::debian("11");
    host.write_sources(&expected_sources(&host, TargetRelease::Bullseye));
    host.write_keyring(b"key");

    let runner = RecordingRunner::new();
    let report = host
        .upgrader(&runner, &CannedFetcher::offline(), &ScriptedPrompter::answering(&["n"]))
        .run()
        .await
        .unwrap();

    let sources = host.sources();
    assert_eq!(sources, expected_sources(&host, TargetRelease::Bookworm));
    assert!(sources.contains(&format!("signed-by={}", host.config.keyring.path.display())));
    assert!(report.plan.is_major_transition());
}

/// Test 3: Debian 12 leaves the source list alone and never offers a reboot
#[tokio::test]
async fn test_bookworm_only_upgrades() {
    let host = TestHost::debian("12");
    let custom = "deb http://ftp.example.net/debian bookworm main\n";
    host.write_sources(custom);
    host.write_keyring(b"key");

    let runner = RecordingRunner::new();
    let prompter = ScriptedPrompter::default();
    let report = host
        .upgrader(&runner, &CannedFetcher::offline(), &prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(host.sources(), custom);
    assert!(!report.sources_rewritten);
    assert_eq!(report.reboot, RebootOutcome::NotNeeded);
    assert!(prompter.questions().is_empty());
    assert_eq!(runner.apt_subcommands(), UPGRADE_SEQUENCE);
}

/// Test 4: Unsupported versions abort before touching anything
#[tokio::test]
async fn test_unsupported_version_changes_nothing() {
    for version in ["9", "13", "sid"] {
        let host = TestHost::debian(version);
        host.write_sources(BUSTER_SOURCES);
        host.write_legacy_fragment();
        let before = host.snapshot();

        let runner = RecordingRunner::new();
        let fetcher = CannedFetcher::serving(KEY_URL, b"key");
        let err = host
            .upgrader(&runner, &fetcher, &ScriptedPrompter::default())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedVersion(_)), "{version}: {err}");
        assert_eq!(host.snapshot(), before, "{version} modified files");
        assert!(runner.commands().is_empty());
        assert!(fetcher.requests().is_empty());
    }
}

/// Test 5: Non-Debian hosts abort
#[tokio::test]
async fn test_non_debian_host_rejected() {
    let host = TestHost::with_os_release("ID=fedora\nVERSION_ID=11\n");
    let runner = RecordingRunner::new();

    let err = host
        .upgrader(&runner, &CannedFetcher::offline(), &ScriptedPrompter::default())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedOs(_)));
    assert!(runner.commands().is_empty());
}

/// Test 6: A present keyring is never fetched
#[tokio::test]
async fn test_existing_keyring_not_fetched() {
    let host = TestHost::debian("12");
    host.write_keyring(b"existing");

    let fetcher = CannedFetcher::serving(KEY_URL, b"new");
    let report = host
        .upgrader(&RecordingRunner::new(), &fetcher, &ScriptedPrompter::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.key, KeyStatus::AlreadyPresent);
    assert!(fetcher.requests().is_empty());
    assert_eq!(std::fs::read(&host.config.keyring.path).unwrap(), b"existing");
}

/// Test 7: A missing keyring is downloaded directly
#[tokio::test]
async fn test_missing_keyring_downloaded() {
    let host = TestHost::debian("12");
    let fetcher = CannedFetcher::serving(KEY_URL, &[0x99, 0x02]);

    let report = host
        .upgrader(&RecordingRunner::new(), &fetcher, &ScriptedPrompter::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.key, KeyStatus::Downloaded);
    assert_eq!(std::fs::read(&host.config.keyring.path).unwrap(), vec![0x99, 0x02]);
}

/// Test 8: Key server fallback installs prerequisites first
#[tokio::test]
async fn test_keyserver_fallback() {
    let host = TestHost::debian("12");
    let runner = RecordingRunner::new();
    let fetcher = CannedFetcher::serving(KEYSERVER_URL, &[0x99, 0x03]);

    let report = host
        .upgrader(&runner, &fetcher, &ScriptedPrompter::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.key, KeyStatus::FetchedFromKeyserver);
    assert_eq!(fetcher.requests(), vec![KEY_URL, KEYSERVER_URL]);
    let installs: Vec<String> = runner
        .commands()
        .iter()
        .filter(|c| c.args.first().map(String::as_str) == Some("install"))
        .filter_map(|c| c.args.last().cloned())
        .collect();
    assert_eq!(installs, vec!["gnupg", "ca-certificates"]);
}

/// Test 9: Unreachable key sources do not stop the upgrade
#[tokio::test]
async fn test_key_failure_is_not_fatal() {
    let host = TestHost::debian("11");
    host.write_sources(BUSTER_SOURCES);

    let runner = RecordingRunner::failing_on("install");
    let report = host
        .upgrader(&runner, &CannedFetcher::offline(), &ScriptedPrompter::answering(&["n"]))
        .run()
        .await
        .unwrap();

    assert_eq!(report.key, KeyStatus::Unavailable);
    assert!(report.sources_rewritten);
    assert_eq!(runner.apt_subcommands()[2..], UPGRADE_SEQUENCE);
}

/// Test 10: A foreign source list needs confirmation; declining aborts
#[tokio::test]
async fn test_declined_replacement_aborts() {
    let host = TestHost::debian("10");
    let foreign = "deb http://ftp.example.net/debian buster main\n\
                   # deb http://deb.debian.org/debian buster main\n";
    host.write_sources(foreign);
    host.write_keyring(b"key");
    host.write_legacy_fragment();

    let runner = RecordingRunner::new();
    let prompter = ScriptedPrompter::answering(&["no"]);
    let err = host
        .upgrader(&runner, &CannedFetcher::offline(), &prompter)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Declined(_)));
    assert_eq!(host.sources(), foreign);
    assert!(host.config.paths.legacy_fragment.exists());
    assert!(runner.apt_subcommands().is_empty());
    assert!(prompter.shown()[0].contains("ftp.example.net"));
}

/// Test 11: Confirming replaces a foreign source list
#[tokio::test]
async fn test_confirmed_replacement_proceeds() {
    let host = TestHost::debian("10");
    host.write_sources("deb http://ftp.example.net/debian buster main\n");
    host.write_keyring(b"key");

    let prompter = ScriptedPrompter::answering(&["Y", "n"]);
    host.upgrader(&RecordingRunner::new(), &CannedFetcher::offline(), &prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(host.sources(), expected_sources(&host, TargetRelease::Bullseye));
    assert_eq!(prompter.questions().len(), 2);
}

/// Test 12: The legacy fragment is gone after a transition
#[tokio::test]
async fn test_legacy_fragment_removed() {
    for version in ["10", "11"] {
        let host = TestHost::debian(version);
        host.write_sources(BUSTER_SOURCES);
        host.write_keyring(b"key");
        host.write_legacy_fragment();

        let report = host
            .upgrader(
                &RecordingRunner::new(),
                &CannedFetcher::offline(),
                &ScriptedPrompter::answering(&["n"]),
            )
            .run()
            .await
            .unwrap();

        assert!(report.legacy_fragment_removed);
        assert!(!host.config.paths.legacy_fragment.exists());
    }
}

/// Test 13: An apt failure is fatal and stops the sequence
#[tokio::test]
async fn test_apt_failure_stops_run() {
    let host = TestHost::debian("11");
    host.write_sources(BUSTER_SOURCES);
    host.write_keyring(b"key");

    let runner = RecordingRunner::failing_on("full-upgrade");
    let prompter = ScriptedPrompter::answering(&["y"]);
    let err = host
        .upgrader(&runner, &CannedFetcher::offline(), &prompter)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::CommandFailed { .. }));
    assert_eq!(runner.apt_subcommands(), ["update", "upgrade", "full-upgrade"]);
    assert!(prompter.questions().is_empty());
}

/// Test 14: Accepting the reboot runs the reboot command last
#[tokio::test]
async fn test_reboot_accepted() {
    let host = TestHost::debian("10");
    host.write_sources(BUSTER_SOURCES);
    host.write_keyring(b"key");

    let runner = RecordingRunner::new();
    let report = host
        .upgrader(&runner, &CannedFetcher::offline(), &ScriptedPrompter::answering(&["y"]))
        .run()
        .await
        .unwrap();

    assert_eq!(report.reboot, RebootOutcome::Rebooting);
    let last = runner.commands().pop().unwrap();
    assert_eq!(last.to_string(), "systemctl reboot");
}

/// Test 15: apt runs with a non-interactive frontend on the child only
#[tokio::test]
async fn test_frontend_scoped_to_children() {
    let host = TestHost::debian("12");
    host.write_keyring(b"key");
    let before = std::env::var_os("DEBIAN_FRONTEND");

    let runner = RecordingRunner::new();
    host.upgrader(&runner, &CannedFetcher::offline(), &ScriptedPrompter::default())
        .run()
        .await
        .unwrap();

    for command in runner.commands() {
        assert!(command
            .env
            .contains(&("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())));
    }
    assert_eq!(std::env::var_os("DEBIAN_FRONTEND"), before);
}
