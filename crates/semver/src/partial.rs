//! Partially specified versions and the bounds they imply.
//!
//! A partial version omits trailing components (`1.2`, `1.x`, `*`). It is
//! never stored as a resolved version; its only job is to derive the
//! inclusive and exclusive bound comparators that the range grammar is
//! built from.

use crate::comparator::{Operator, PrimitiveComparator};
use crate::error::{Error, Result};
use crate::version::{PreRelease, Version};
use std::fmt;
use std::str::FromStr;

/// A version with trailing components omitted.
///
/// Omission must be trailing-only: once a component is absent or a
/// wildcard, every more specific component must be too. A pre-release tag
/// is only allowed on a fully specified partial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialVersion {
    major: Option<u32>,
    minor: Option<u32>,
    micro: Option<u32>,
    pre_release: Option<PreRelease>,
}

impl PartialVersion {
    /// Create a partial version, validating trailing-only omission.
    pub fn new(
        major: Option<u32>,
        minor: Option<u32>,
        micro: Option<u32>,
        pre_release: Option<PreRelease>,
    ) -> Result<Self> {
        if (major.is_none() && (minor.is_some() || micro.is_some()))
            || (minor.is_none() && micro.is_some())
        {
            return Err(Error::version_format(
                "",
                "omitted components must be trailing",
            ));
        }
        if pre_release.is_some() && micro.is_none() {
            return Err(Error::version_format(
                "",
                "a pre-release tag requires all three numeric components",
            ));
        }
        Ok(Self {
            major,
            minor,
            micro,
            pre_release,
        })
    }

    /// The partial version with every component omitted.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            major: None,
            minor: None,
            micro: None,
            pre_release: None,
        }
    }

    /// Major component, if specified.
    #[must_use]
    pub const fn major(&self) -> Option<u32> {
        self.major
    }

    /// Minor component, if specified.
    #[must_use]
    pub const fn minor(&self) -> Option<u32> {
        self.minor
    }

    /// Micro component, if specified.
    #[must_use]
    pub const fn micro(&self) -> Option<u32> {
        self.micro
    }

    /// Pre-release tag, if specified.
    #[must_use]
    pub const fn pre_release(&self) -> Option<&PreRelease> {
        self.pre_release.as_ref()
    }

    /// Check whether no component is specified.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.major.is_none()
    }

    /// Check whether all three numeric components are specified.
    #[must_use]
    pub const fn is_fully_specified(&self) -> bool {
        self.micro.is_some()
    }

    /// The version obtained by zero-filling every omitted component and
    /// keeping the explicit pre-release tag.
    #[must_use]
    pub fn zero_filled(&self) -> Version {
        let version = Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.micro.unwrap_or(0),
        );
        match &self.pre_release {
            Some(pre) => version.with_pre_release(pre.clone()),
            None => version,
        }
    }

    /// The inclusive lower bound: `>=` the zero-filled version.
    #[must_use]
    pub fn lower_bound(&self) -> PrimitiveComparator {
        PrimitiveComparator::new(Operator::GreaterEqual, self.zero_filled())
    }

    /// The upper bound implied by the specified components.
    ///
    /// `None` when fully unbounded; `<` the next bump of the last
    /// specified component when partial (`1.2` gives `< 1.3.0`); `<=` the
    /// exact version when fully specified.
    #[must_use]
    pub fn upper_bound(&self) -> Option<PrimitiveComparator> {
        let ceiling = match (self.major, self.minor, self.micro) {
            (None, _, _) => return None,
            (Some(major), None, _) => Version::new(major + 1, 0, 0),
            (Some(major), Some(minor), None) => Version::new(major, minor + 1, 0),
            (Some(_), Some(_), Some(_)) => {
                return Some(PrimitiveComparator::new(
                    Operator::LessEqual,
                    self.zero_filled(),
                ));
            }
        };
        Some(PrimitiveComparator::new(Operator::Less, ceiling))
    }

    /// The strict dual of [`Self::lower_bound`]: everything above the
    /// range this partial covers.
    ///
    /// `None` when fully unbounded (nothing lies above); `>=` the next
    /// bump of the last specified component when partial (`> 1.2` means
    /// `>= 1.3.0`); `>` the exact version when fully specified.
    #[must_use]
    pub fn lower_bound_exclusive(&self) -> Option<PrimitiveComparator> {
        let comparator = match (self.major, self.minor, self.micro) {
            (None, _, _) => return None,
            (Some(major), None, _) => {
                PrimitiveComparator::new(Operator::GreaterEqual, Version::new(major + 1, 0, 0))
            }
            (Some(major), Some(minor), None) => {
                PrimitiveComparator::new(Operator::GreaterEqual, Version::new(major, minor + 1, 0))
            }
            (Some(_), Some(_), Some(_)) => {
                PrimitiveComparator::new(Operator::Greater, self.zero_filled())
            }
        };
        Some(comparator)
    }

    /// The strict dual of [`Self::upper_bound`]: `<` the zero-filled
    /// version (`< 1.2` means `< 1.2.0`).
    #[must_use]
    pub fn upper_bound_exclusive(&self) -> PrimitiveComparator {
        PrimitiveComparator::new(Operator::Less, self.zero_filled())
    }
}

impl From<Version> for PartialVersion {
    fn from(version: Version) -> Self {
        // Build metadata is dropped; it has no bearing on bounds.
        Self {
            major: Some(version.major),
            minor: Some(version.minor),
            micro: Some(version.micro),
            pre_release: version.pre_release,
        }
    }
}

fn parse_partial_component(input: &str, source: &str) -> Result<Option<u32>> {
    match input {
        "*" | "x" | "X" => Ok(None),
        _ => {
            if input.is_empty() {
                return Err(Error::version_format(source, "empty version component"));
            }
            if !input.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::version_format(
                    source,
                    format!("component `{input}` is not a number or wildcard"),
                ));
            }
            input
                .parse::<u32>()
                .map(Some)
                .map_err(|_| Error::version_format(source, format!("component `{input}` overflows")))
        }
    }
}

impl FromStr for PartialVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s.strip_prefix('=').unwrap_or(s);
        let rest = rest.strip_prefix('v').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Self::unbounded());
        }

        let (rest, pre_release) = match rest.split_once('-') {
            Some((left, right)) => (left, Some(PreRelease::from_str(right)?)),
            None => (rest, None),
        };

        let parts: Vec<&str> = rest.split('.').collect();
        if parts.len() > 3 {
            return Err(Error::version_format(
                s,
                format!("expected at most 3 components, found {}", parts.len()),
            ));
        }
        let mut components = [None, None, None];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = parse_partial_component(part, s)?;
        }
        let [major, minor, micro] = components;

        if (major.is_none() && (minor.is_some() || micro.is_some()))
            || (minor.is_none() && micro.is_some())
        {
            return Err(Error::version_format(
                s,
                "wildcard components must be trailing",
            ));
        }
        if pre_release.is_some() && micro.is_none() {
            return Err(Error::version_format(
                s,
                "a pre-release tag requires all three numeric components",
            ));
        }

        Ok(Self {
            major,
            minor,
            micro,
            pre_release,
        })
    }
}

impl fmt::Display for PartialVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(major) = self.major else {
            return f.write_str("*");
        };
        write!(f, "{major}")?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(micro) = self.micro {
            write!(f, ".{micro}")?;
        }
        if let Some(ref pre) = self.pre_release {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}
