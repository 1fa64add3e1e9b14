//! Semantic versions as compared by semver matchers.
//!
//! Ordering compares major, minor and patch numerically. A stable version sorts after any
//! pre-release of it. Pre-release identifiers are compared pairwise, numerically when both are
//! numeric and lexically otherwise, and finally by identifier count. Build metadata never
//! affects ordering, but it does take part in equality through [`Semver::version`].
use std::{cmp::Ordering, fmt, str::FromStr};

/// Error returned when a string is not a valid semantic version.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid semantic version: {0:?}")]
pub struct InvalidSemver(String);

/// Parsed semantic version.
#[derive(Debug, Clone)]
pub struct Semver {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Vec<String>,
    metadata: Option<String>,
    /// Normalized textual form, e.g. `"01.2.3"` becomes `"1.2.3"`.
    version: String,
}

impl Semver {
    /// Normalized version string, including pre-release and metadata.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build metadata, if any.
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    fn is_stable(&self) -> bool {
        self.pre_release.is_empty()
    }

    /// Compare two versions. Build metadata is ignored.
    pub fn compare(&self, other: &Semver) -> Ordering {
        if self.version == other.version {
            return Ordering::Equal;
        }

        let by_core = self
            .major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch));
        if by_core != Ordering::Equal {
            return by_core;
        }

        match (self.is_stable(), other.is_stable()) {
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            _ => {}
        }

        for (a, b) in self.pre_release.iter().zip(&other.pre_release) {
            if a == b {
                continue;
            }
            return compare_identifiers(a, b);
        }

        self.pre_release.len().cmp(&other.pre_release.len())
    }
}

fn compare_identifiers(a: &str, b: &str) -> Ordering {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn parse_numeric(s: &str) -> Option<u64> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl FromStr for Semver {
    type Err = InvalidSemver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSemver(s.to_owned());

        let trimmed = s.trim();

        let (without_metadata, metadata) = match trimmed.split_once('+') {
            Some((_, "")) => return Err(invalid()),
            Some((rest, metadata)) => (rest, Some(metadata.to_owned())),
            None => (trimmed, None),
        };

        let (core, pre_release) = match without_metadata.split_once('-') {
            Some((_, "")) => return Err(invalid()),
            Some((core, pre)) => {
                let identifiers = pre.split('.').map(str::to_owned).collect::<Vec<_>>();
                if identifiers.iter().any(String::is_empty) {
                    return Err(invalid());
                }
                (core, identifiers)
            }
            None => (without_metadata, Vec::new()),
        };

        let mut components = core.split('.').map(parse_numeric);
        let (Some(Some(major)), Some(Some(minor)), Some(Some(patch)), None) = (
            components.next(),
            components.next(),
            components.next(),
            components.next(),
        ) else {
            return Err(invalid());
        };

        let mut version = format!("{major}.{minor}.{patch}");
        if !pre_release.is_empty() {
            version.push('-');
            version.push_str(&pre_release.join("."));
        }
        if let Some(metadata) = &metadata {
            version.push('+');
            version.push_str(metadata);
        }

        Ok(Semver {
            major,
            minor,
            patch,
            pre_release,
            metadata,
            version,
        })
    }
}

impl fmt::Display for Semver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::Semver;

    fn v(s: &str) -> Semver {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_normalizes() {
        assert_eq!(v("1.2.3").version(), "1.2.3");
        assert_eq!(v(" 01.02.003 ").version(), "1.2.3");
        assert_eq!(v("1.0.0-rc.1+build.5").version(), "1.0.0-rc.1+build.5");
        assert_eq!(v("1.0.0+exp.sha.5114f85").metadata(), Some("exp.sha.5114f85"));
    }

    #[test]
    fn rejects_invalid() {
        for s in [
            "", "1", "1.2", "1.2.3.4", "1.2.x", "1.2.3-", "1.2.3+", "1.2.3-rc..1", "a.b.c",
            "-1.2.3",
        ] {
            assert!(s.parse::<Semver>().is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn compares_core() {
        assert_eq!(v("1.0.1").compare(&v("1.0.0")), Ordering::Greater);
        assert_eq!(v("1.2.0").compare(&v("1.10.0")), Ordering::Less);
        assert_eq!(v("2.0.0").compare(&v("1.99.99")), Ordering::Greater);
        assert_eq!(v("1.0.0").compare(&v("1.0.0")), Ordering::Equal);
    }

    #[test]
    fn stable_after_pre_release() {
        assert_eq!(v("1.0.0-alpha").compare(&v("1.0.0")), Ordering::Less);
        assert_eq!(v("1.0.0").compare(&v("1.0.0-rc.1")), Ordering::Greater);
    }

    #[test]
    fn compares_pre_release_identifiers() {
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in ordered.windows(2) {
            assert_eq!(
                v(pair[0]).compare(&v(pair[1])),
                Ordering::Less,
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn metadata_ignored_when_ordering() {
        assert_eq!(
            v("1.0.0+build.1").compare(&v("1.0.0+build.2")),
            Ordering::Equal
        );
        assert_ne!(v("1.0.0+build.1").version(), v("1.0.0+build.2").version());
    }
}
