//! Source-list templates keyed by target release.

use crate::config::RepositoryConfig;
use crate::release::TargetRelease;
use std::path::Path;

const BULLSEYE: &str = "\
# Managed by debian-upgrader for bullseye
deb [trusted=yes] {mirror} bullseye main contrib non-free
deb [trusted=yes] {mirror} bullseye-updates main contrib non-free
deb [trusted=yes] {security_mirror} bullseye-security main contrib non-free
";

const BOOKWORM: &str = "\
# Managed by debian-upgrader for bookworm
deb [trusted=yes] {mirror} bookworm main contrib non-free non-free-firmware
deb [trusted=yes] {mirror} bookworm-updates main contrib non-free non-free-firmware
deb [trusted=yes] {security_mirror} bookworm-security main contrib non-free non-free-firmware
deb [trusted=yes] {mirror} bookworm-backports main contrib non-free non-free-firmware
deb [arch={architecture} signed-by={keyring}] {container_repo} bookworm stable
";

/// Template for every rewrite target.
pub const TEMPLATES: [(TargetRelease, &str); 2] = [
    (TargetRelease::Bullseye, BULLSEYE),
    (TargetRelease::Bookworm, BOOKWORM),
];

/// The raw template for `target`.
#[must_use]
pub fn template_for(target: TargetRelease) -> &'static str {
    TEMPLATES
        .iter()
        .find_map(|(release, template)| (*release == target).then_some(*template))
        // TEMPLATES has an entry per variant; checked by test.
        .unwrap_or_default()
}

/// Render the source list for `target`.
#[must_use]
pub fn render(target: TargetRelease, repos: &RepositoryConfig, keyring: &Path) -> String {
    template_for(target)
        .replace("{mirror}", repos.mirror.trim_end_matches('/'))
        .replace("{security_mirror}", repos.security_mirror.trim_end_matches('/'))
        .replace("{container_repo}", repos.container_repo.trim_end_matches('/'))
        .replace("{architecture}", &repos.architecture)
        .replace("{keyring}", &keyring.display().to_string())
}
