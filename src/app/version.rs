// src/app/version.rs

//! UI-friendly version strings
//!
//! Package versions such as `1:1.6.2-7.fc17` are shown to users as
//! `1.6.2`. When an update is pending, both strings are shortened only as
//! far as they still differ, so `3.10.1-1.fc20` and `3.10.1-2.fc20` keep
//! their release numbers.

use bitflags::bitflags;

bitflags! {
    /// Parts of a raw version string to strip
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fixup: u8 {
        /// Trailing `-release`
        const RELEASE       = 1 << 0;
        /// Distribution tag, e.g. `.fc20`
        const DISTRO_SUFFIX = 1 << 1;
        /// Snapshot date stamp, e.g. `.20130812git`
        const GIT_SUFFIX    = 1 << 2;
    }
}

/// Fixups to try, most aggressive first
const FIXUP_ORDER: [Fixup; 3] = [
    Fixup::all(),
    Fixup::DISTRO_SUFFIX.union(Fixup::GIT_SUFFIX),
    Fixup::DISTRO_SUFFIX,
];

/// Strip a numeric epoch prefix such as `2:`
fn strip_epoch(version: &str) -> &str {
    for (i, c) in version.char_indices() {
        if c == ':' {
            return &version[i + 1..];
        }
        if !c.is_ascii_digit() {
            break;
        }
    }
    version
}

/// Byte offset of the last `.20YY` followed by at least four more digits
fn snapshot_suffix(version: &str) -> Option<usize> {
    let bytes = version.as_bytes();
    version.rmatch_indices(".20").map(|(i, _)| i).find(|&i| {
        let digits = bytes[i + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        digits >= 8
    })
}

/// Apply `flags` to a raw version string
pub fn ui_version(version: &str, flags: Fixup) -> String {
    let mut new = strip_epoch(version).to_string();

    if flags.contains(Fixup::DISTRO_SUFFIX) {
        if let Some(pos) = new.find(".fc") {
            new.truncate(pos);
        }
    }

    if flags.contains(Fixup::RELEASE) {
        if let Some(pos) = new.rfind('-') {
            new.truncate(pos);
        }
    }

    if flags.contains(Fixup::GIT_SUFFIX) {
        if let Some(pos) = snapshot_suffix(&new) {
            new.truncate(pos);
        }
    }

    new
}

/// Compute the UI strings for a current and a pending version.
///
/// Tries each fixup level in turn and keeps the first one at which the two
/// results differ; if none does, the raw strings are used.
pub fn ui_versions(
    version: Option<&str>,
    update_version: Option<&str>,
) -> (Option<String>, Option<String>) {
    for flags in FIXUP_ORDER {
        let version_ui = version.map(|v| ui_version(v, flags));
        let update_version_ui = update_version.map(|v| ui_version(v, flags));
        if version_ui != update_version_ui {
            return (version_ui, update_version_ui);
        }
    }

    // we tried, but failed
    (
        version.map(str::to_string),
        update_version.map(str::to_string),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_epoch_distro_and_release() {
        assert_eq!(ui_version("1:1.6.2-7.fc17", Fixup::all()), "1.6.2");
        assert_eq!(ui_version("2:1.2.3.fc19", Fixup::all()), "1.2.3");
        assert_eq!(ui_version("3.10.1", Fixup::all()), "3.10.1");
    }

    #[test]
    fn test_epoch_must_be_numeric() {
        assert_eq!(ui_version("abc:1.0", Fixup::empty()), "abc:1.0");
        assert_eq!(ui_version("12:1.0", Fixup::empty()), "1.0");
    }

    #[test]
    fn test_strips_snapshot_date() {
        assert_eq!(ui_version("0.1.20130812git", Fixup::GIT_SUFFIX), "0.1");
        // a plain ".20" component is a version, not a date
        assert_eq!(ui_version("3.20.1", Fixup::GIT_SUFFIX), "3.20.1");
    }

    #[test]
    fn test_pair_keeps_release_when_needed() {
        let (current, update) = ui_versions(Some("3.10.1-1.fc20"), Some("3.10.1-2.fc20"));
        assert_eq!(current.as_deref(), Some("3.10.1-1"));
        assert_eq!(update.as_deref(), Some("3.10.1-2"));

        let (current, update) = ui_versions(Some("3.10.1-1.fc20"), Some("3.12.0-1.fc20"));
        assert_eq!(current.as_deref(), Some("3.10.1"));
        assert_eq!(update.as_deref(), Some("3.12.0"));
    }

    #[test]
    fn test_pair_falls_back_to_raw() {
        let (current, update) = ui_versions(Some("1.0.fc20"), Some("1.0.fc21"));
        assert_eq!(current.as_deref(), Some("1.0.fc20"));
        assert_eq!(update.as_deref(), Some("1.0.fc21"));

        assert_eq!(ui_versions(None, None), (None, None));
        let (current, update) = ui_versions(Some("1:2.0-3"), None);
        assert_eq!(current.as_deref(), Some("2.0"));
        assert_eq!(update, None);
    }
}
