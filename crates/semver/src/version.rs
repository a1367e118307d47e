//! Semantic version values and their precedence ordering.
//!
//! This module provides the immutable version triple with optional
//! pre-release identifiers and build metadata, including:
//! - Strict parsing and formatting
//! - Total ordering per `SemVer` 2.0.0 precedence rules
//! - Derived-copy operations for bumps and metadata

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// One dot-separated element of a pre-release tag.
///
/// Variant order is load-bearing: numeric identifiers always have lower
/// precedence than alphanumeric identifiers, so the derived `Ord` is the
/// semver precedence rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    /// All-digit identifier, compared numerically.
    Numeric(u64),
    /// Identifier containing at least one non-digit, compared lexically.
    Alphanumeric(String),
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::version_format(s, "empty pre-release identifier"));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(Error::version_format(
                s,
                "pre-release identifiers may only contain ASCII alphanumerics and hyphens",
            ));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            // Values too large for u64 stay lexical, matching the
            // numeric-if-it-fits convention of npm clients.
            if let Ok(value) = s.parse::<u64>() {
                return Ok(Self::Numeric(value));
            }
        }
        Ok(Self::Alphanumeric(s.to_string()))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Alphanumeric(value) => f.write_str(value),
        }
    }
}

/// An ordered sequence of pre-release identifiers.
///
/// Precedence is element-wise; when one sequence is a prefix of the other,
/// the shorter sequence has lower precedence. The derived `Ord` on the
/// inner `Vec` implements exactly that rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    identifiers: Vec<Identifier>,
}

impl PreRelease {
    /// Create a pre-release tag from its identifiers.
    #[must_use]
    pub const fn new(identifiers: Vec<Identifier>) -> Self {
        Self { identifiers }
    }

    /// The identifiers in order.
    #[must_use]
    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }
}

impl FromStr for PreRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::version_format(s, "empty pre-release tag"));
        }
        let identifiers = s
            .split('.')
            .map(Identifier::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { identifiers })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, identifier) in self.identifiers.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{identifier}")?;
        }
        Ok(())
    }
}

/// A semantic version following the `SemVer` 2.0.0 specification.
///
/// Build metadata participates in neither ordering nor equality: two
/// versions differing only in build metadata compare and hash equal.
#[derive(Debug, Clone)]
pub struct Version {
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
    /// Micro (patch) version number.
    pub micro: u32,
    /// Pre-release tag, if any.
    pub pre_release: Option<PreRelease>,
    /// Build metadata, if any.
    pub build: Option<String>,
}

impl Version {
    /// Create a new release version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            pre_release: None,
            build: None,
        }
    }

    /// Derive a copy with the given pre-release tag.
    #[must_use]
    pub fn with_pre_release(mut self, pre_release: PreRelease) -> Self {
        self.pre_release = Some(pre_release);
        self
    }

    /// Derive a copy with the given build metadata.
    #[must_use]
    pub fn with_build_metadata(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// Derive the next major version. Clears minor, micro, pre-release and
    /// build metadata.
    #[must_use]
    pub const fn with_major_bump(&self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }

    /// Derive the next minor version. Clears micro, pre-release and build
    /// metadata.
    #[must_use]
    pub const fn with_minor_bump(&self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    /// Derive the next micro version. Clears pre-release and build metadata.
    #[must_use]
    pub const fn with_micro_bump(&self) -> Self {
        Self::new(self.major, self.minor, self.micro + 1)
    }

    /// Check whether this is a pre-release version.
    #[must_use]
    pub const fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// Check whether this version has the same major.minor.micro triple as
    /// another, ignoring pre-release and build metadata.
    #[must_use]
    pub const fn same_triple(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor && self.micro == other.micro
    }
}

fn parse_component(input: &str, component: &str, source: &str) -> Result<u32> {
    if input.is_empty() {
        return Err(Error::version_format(
            source,
            format!("empty {component} component"),
        ));
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::version_format(
            source,
            format!("{component} component `{input}` is not a number"),
        ));
    }
    input.parse::<u32>().map_err(|_| {
        Error::version_format(source, format!("{component} component `{input}` overflows"))
    })
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // A leading `=` or `v` is tolerated and stripped; whitespace is not.
        let rest = s.strip_prefix('=').unwrap_or(s);
        let rest = rest.strip_prefix('v').unwrap_or(rest);

        let (rest, build) = match rest.split_once('+') {
            Some((_, "")) => {
                return Err(Error::version_format(s, "empty build metadata"));
            }
            Some((left, right)) => (left, Some(right.to_string())),
            None => (rest, None),
        };

        let (rest, pre_release) = match rest.split_once('-') {
            Some((left, right)) => (left, Some(PreRelease::from_str(right)?)),
            None => (rest, None),
        };

        let parts: Vec<&str> = rest.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::version_format(
                s,
                format!("expected 3 numeric components, found {}", parts.len()),
            ));
        }
        let major = parse_component(parts[0], "major", s)?;
        let minor = parse_component(parts[1], "minor", s)?;
        let micro = parse_component(parts[2], "micro", s)?;

        Ok(Self {
            major,
            minor,
            micro,
            pre_release,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(ref pre) = self.pre_release {
            write!(f, "-{pre}")?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Build metadata is excluded so the hash agrees with equality.
        self.major.hash(state);
        self.minor.hash(state);
        self.micro.hash(state);
        self.pre_release.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.micro.cmp(&other.micro) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // A release outranks any pre-release of the same triple.
        match (&self.pre_release, &other.pre_release) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
        // Build metadata is ignored in comparison
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_version_new() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.micro, 3);
        assert!(v.pre_release.is_none());
        assert!(v.build.is_none());
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(version("1.2.3"), Version::new(1, 2, 3));
        assert_eq!(version("v1.2.3"), Version::new(1, 2, 3));
        assert_eq!(version("=1.2.3"), Version::new(1, 2, 3));
        assert_eq!(version("=v1.2.3"), Version::new(1, 2, 3));

        let v = version("1.2.3-beta.1");
        assert_eq!(
            v.pre_release,
            Some(PreRelease::new(vec![
                Identifier::Alphanumeric("beta".to_string()),
                Identifier::Numeric(1),
            ]))
        );

        let v = version("1.2.3+build.123");
        assert_eq!(v.build, Some("build.123".to_string()));

        let v = version("1.2.3-rc.1+build.456");
        assert_eq!(v.pre_release, Some("rc.1".parse().unwrap()));
        assert_eq!(v.build, Some("build.456".to_string()));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("a.b.c".parse::<Version>().is_err());
        assert!("1..3".parse::<Version>().is_err());
        assert!(".1.2.3".parse::<Version>().is_err());
        assert!("1.2.3.".parse::<Version>().is_err());
        assert!("1 .2.3".parse::<Version>().is_err());
        assert!("1. 2.3".parse::<Version>().is_err());
        assert!(" 1.2.3".parse::<Version>().is_err());
        assert!("1.2.3 ".parse::<Version>().is_err());
        assert!("1.2.3-".parse::<Version>().is_err());
        assert!("1.2.3+".parse::<Version>().is_err());
        assert!("1.2.3-a..b".parse::<Version>().is_err());
        assert!("1.2.3-a b".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_display_round_trip() {
        for s in [
            "1.2.3",
            "0.0.0",
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-0.3.7",
            "1.0.0-x-y-z.4",
            "1.2.3+20130313144700",
            "1.0.0-beta+exp.sha.5114f85",
        ] {
            assert_eq!(version(s).to_string(), s);
        }
        // The tolerated prefixes are normalized away.
        assert_eq!(version("v1.2.3").to_string(), "1.2.3");
        assert_eq!(version("=1.2.3").to_string(), "1.2.3");
    }

    #[test]
    fn test_version_bumps() {
        let v = version("1.2.3-beta+exp");
        assert_eq!(v.with_major_bump(), Version::new(2, 0, 0));
        assert_eq!(v.with_minor_bump(), Version::new(1, 3, 0));
        assert_eq!(v.with_micro_bump(), Version::new(1, 2, 4));
        assert!(v.with_major_bump().pre_release.is_none());
        assert!(v.with_major_bump().build.is_none());
    }

    #[test]
    fn test_version_ordering() {
        assert!(version("2.0.0") > version("1.0.0"));
        assert!(version("1.1.0") > version("1.0.0"));
        assert!(version("1.0.1") > version("1.0.0"));
        assert!(version("1.0.0") > version("1.0.0-alpha"));
        assert!(version("1.0.0-alpha") < version("1.0.1-alpha"));
    }

    #[test]
    fn test_pre_release_precedence_chain() {
        let chain = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for window in chain.windows(2) {
            assert!(
                version(window[0]) < version(window[1]),
                "{} should precede {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn test_build_metadata_ignored() {
        let a = version("1.0.0+a");
        let b = version("1.0.0+b");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(version("1.0.0"), version("1.0.0+anything"));
    }

    #[test]
    fn test_numeric_below_alphanumeric() {
        assert!(version("1.0.0-1") < version("1.0.0-alpha"));
        assert!(version("1.0.0-2") < version("1.0.0-10"));
        assert!(version("1.0.0-alpha.9") < version("1.0.0-alpha.beta"));
    }

    #[test]
    fn test_shorter_pre_release_is_lower() {
        assert!(version("1.0.0-alpha") < version("1.0.0-alpha.0"));
        assert!(version("1.0.0-alpha.1.2") > version("1.0.0-alpha.1"));
    }

    #[test]
    fn test_same_triple() {
        assert!(version("1.2.3").same_triple(&version("1.2.3-beta")));
        assert!(!version("1.2.3").same_triple(&version("1.2.4")));
    }
}
