//! Operating system detection from release files.

use log::debug;
use std::path::Path;

use super::OsIdentity;
use crate::runtime::Runtime;

const OS_RELEASE: &str = "/etc/os-release";
const DEBIAN_VERSION: &str = "/etc/debian_version";
const GENTOO_RELEASE: &str = "/etc/gentoo-release";
const ARCH_RELEASE: &str = "/etc/arch-release";

/// Source of the OS identity (useful for testing).
#[cfg_attr(test, mockall::automock)]
pub trait OsDetector {
    /// Returns `None` when the operating system cannot be identified.
    fn detect(&self) -> Option<OsIdentity>;
}

/// Detects the OS from `/etc/os-release`, falling back to distribution
/// specific release files.
pub struct OsReleaseDetector<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> OsReleaseDetector<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    fn read(&self, path: &str) -> Option<String> {
        let path = Path::new(path);
        if !self.runtime.exists(path) {
            return None;
        }
        match self.runtime.read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!("Ignoring unreadable {:?}: {}", path, e);
                None
            }
        }
    }

    fn from_os_release(&self) -> Option<OsIdentity> {
        let content = self.read(OS_RELEASE)?;
        let (id, tags) = parse_os_release(&content);
        let id = id?;
        // Debian testing/sid report the next stable release here; the
        // debian_version file is more precise.
        if id == "debian" && self.runtime.exists(Path::new(DEBIAN_VERSION)) {
            return None;
        }
        Some(OsIdentity::new(&id, tags))
    }

    fn from_release_files(&self) -> Option<OsIdentity> {
        if let Some(content) = self.read(DEBIAN_VERSION) {
            let version = content.trim().to_string();
            let mut tags = vec![version.clone()];
            if version.contains("sid") {
                tags.push("unstable".to_string());
                tags.push("sid".to_string());
            }
            return Some(OsIdentity::new("debian", tags));
        }

        if let Some(content) = self.read(GENTOO_RELEASE) {
            let tags: Vec<&str> = content.split_whitespace().last().into_iter().collect();
            return Some(OsIdentity::new("gentoo", tags));
        }

        if self.runtime.exists(Path::new(ARCH_RELEASE)) {
            return Some(OsIdentity::new("arch", Vec::<String>::new()));
        }

        None
    }
}

impl<R: Runtime> OsDetector for OsReleaseDetector<'_, R> {
    #[tracing::instrument(skip(self))]
    fn detect(&self) -> Option<OsIdentity> {
        let os = self
            .from_os_release()
            .or_else(|| self.from_release_files());
        match &os {
            Some(os) => debug!("Detected operating system {}", os),
            None => debug!("Could not detect the operating system"),
        }
        os
    }
}

/// Extracts `ID` and the version tags (`VERSION_CODENAME`, `VERSION_ID`).
fn parse_os_release(content: &str) -> (Option<String>, Vec<String>) {
    let mut id = None;
    let mut tags = Vec::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "ID" => id = Some(value.to_lowercase()),
            "VERSION_CODENAME" | "VERSION_ID" => tags.push(value.to_string()),
            _ => {}
        }
    }

    (id, tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 22.04.3 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
VERSION="22.04.3 LTS (Jammy Jellyfish)"
VERSION_CODENAME=jammy
ID=ubuntu
ID_LIKE=debian"#;

    fn with_files(files: &'static [(&'static str, &'static str)]) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .returning(move |p| files.iter().any(|(path, _)| Path::new(path) == p));
        runtime.expect_read_to_string().returning(move |p| {
            files
                .iter()
                .find(|(path, _)| Path::new(path) == p)
                .map(|(_, content)| content.to_string())
                .ok_or_else(|| anyhow::anyhow!("not found"))
        });
        runtime
    }

    #[test]
    fn test_parse_os_release() {
        let (id, tags) = parse_os_release(UBUNTU);
        assert_eq!(id.as_deref(), Some("ubuntu"));
        assert_eq!(tags, vec!["22.04", "jammy"]);
    }

    #[test]
    fn test_detect_ubuntu() {
        let runtime = with_files(&[(OS_RELEASE, UBUNTU)]);
        let os = OsReleaseDetector::new(&runtime).detect().unwrap();
        assert_eq!(os, OsIdentity::new("ubuntu", ["jammy", "22.04"]));
    }

    #[test]
    fn test_detect_debian_prefers_debian_version() {
        let runtime = with_files(&[
            (OS_RELEASE, "ID=debian\nVERSION_CODENAME=trixie\n"),
            (DEBIAN_VERSION, "trixie/sid\n"),
        ]);
        let os = OsReleaseDetector::new(&runtime).detect().unwrap();
        assert_eq!(os.name, "debian");
        assert!(os.version_tags.contains("trixie/sid"));
        assert!(os.version_tags.contains("sid"));
        assert!(os.version_tags.contains("unstable"));
    }

    #[test]
    fn test_detect_debian_without_debian_version() {
        let runtime = with_files(&[(OS_RELEASE, "ID=debian\nVERSION_ID=\"12\"\n")]);
        let os = OsReleaseDetector::new(&runtime).detect().unwrap();
        assert_eq!(os, OsIdentity::new("debian", ["12"]));
    }

    #[test]
    fn test_detect_gentoo_release_file() {
        let runtime = with_files(&[(GENTOO_RELEASE, "Gentoo Base System release 2.14\n")]);
        let os = OsReleaseDetector::new(&runtime).detect().unwrap();
        assert_eq!(os, OsIdentity::new("gentoo", ["2.14"]));
    }

    #[test]
    fn test_detect_arch_release_file() {
        let runtime = with_files(&[(ARCH_RELEASE, "")]);
        let os = OsReleaseDetector::new(&runtime).detect().unwrap();
        assert_eq!(os.name, "arch");
        assert!(os.version_tags.is_empty());
    }

    #[test]
    fn test_detect_unknown() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        assert!(OsReleaseDetector::new(&runtime).detect().is_none());
    }

    #[test]
    fn test_unreadable_os_release_falls_back() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .returning(|p| p == Path::new(OS_RELEASE) || p == Path::new(ARCH_RELEASE));
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from(OS_RELEASE)))
            .returning(|_| Err(anyhow::anyhow!("permission denied")));

        let os = OsReleaseDetector::new(&runtime).detect().unwrap();
        assert_eq!(os.name, "arch");
    }
}
