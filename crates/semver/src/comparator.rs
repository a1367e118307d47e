//! Range comparator tokens and their reduction to primitive constraints.
//!
//! Every range syntax (`~`, `^`, x-ranges, hyphen ranges, explicit
//! operators) reduces to one or two primitive operator-plus-version
//! constraints ANDed together. The reduction happens once at parse time;
//! matching is then a walk over the precomputed primitives.

use crate::error::{Error, Result};
use crate::partial::PartialVersion;
use crate::version::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A comparison operator in a primitive comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Exactly equal.
    Equal,
    /// Strictly lower precedence.
    Less,
    /// Lower or equal precedence.
    LessEqual,
    /// Strictly higher precedence.
    Greater,
    /// Higher or equal precedence.
    GreaterEqual,
}

impl Operator {
    /// Operator tokens in match order. Two-character operators come first
    /// so `>` never shadows a `>=` prefix.
    pub(crate) const TOKENS: [(&'static str, Self); 5] = [
        (">=", Self::GreaterEqual),
        ("<=", Self::LessEqual),
        (">", Self::Greater),
        ("<", Self::Less),
        ("=", Self::Equal),
    ];

    /// Check whether a comparison outcome satisfies this operator.
    #[must_use]
    pub const fn allows(self, ordering: Ordering) -> bool {
        matches!(
            (self, ordering),
            (Self::Equal, Ordering::Equal)
                | (Self::Less, Ordering::Less)
                | (Self::LessEqual, Ordering::Less | Ordering::Equal)
                | (Self::Greater, Ordering::Greater)
                | (Self::GreaterEqual, Ordering::Greater | Ordering::Equal)
        )
    }

    /// The operator's source form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operator-plus-version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveComparator {
    /// The comparison operator.
    pub operator: Operator,
    /// The version candidates are compared against.
    pub version: Version,
}

impl PrimitiveComparator {
    /// Create a primitive comparator.
    #[must_use]
    pub const fn new(operator: Operator, version: Version) -> Self {
        Self { operator, version }
    }

    /// Check whether a candidate version satisfies this constraint.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        self.operator.allows(candidate.cmp(&self.version))
    }
}

impl FromStr for PrimitiveComparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        for (token, operator) in Operator::TOKENS {
            if let Some(rest) = s.strip_prefix(token) {
                return Ok(Self::new(operator, rest.parse()?));
            }
        }
        Err(Error::range_format(s, "expected a comparison operator"))
    }
}

impl fmt::Display for PrimitiveComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// One parsed range token.
///
/// The five syntaxes form a closed set. Each case keeps the partial
/// version(s) it was written with together with the one or two primitive
/// comparators they reduce to, so matching never re-derives bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdvancedComparator {
    /// `~1.2.3`: patch-level changes when minor is given, minor-level
    /// changes otherwise.
    Tilde {
        /// The partial version after the `~`.
        version: PartialVersion,
        /// Floor and ceiling, precomputed.
        comparators: Vec<PrimitiveComparator>,
    },
    /// `^1.2.3`: changes that keep the left-most non-zero component.
    Caret {
        /// The partial version after the `^`.
        version: PartialVersion,
        /// Floor and ceiling, precomputed.
        comparators: Vec<PrimitiveComparator>,
    },
    /// A bare, possibly wildcarded version: `1.2.3`, `1.2`, `1.x`, `*`.
    XRange {
        /// The bare partial version.
        version: PartialVersion,
        /// Lower bound plus upper bound when one exists.
        comparators: Vec<PrimitiveComparator>,
    },
    /// `1.2.3 - 2.3.4`, inclusive at both written ends.
    Hyphen {
        /// The partial version before the hyphen.
        lower: PartialVersion,
        /// The partial version after the hyphen.
        upper: PartialVersion,
        /// Lower bound of `lower` plus upper bound of `upper`.
        comparators: Vec<PrimitiveComparator>,
    },
    /// An explicit operator applied to a possibly partial version.
    Primitive {
        /// The written operator.
        operator: Operator,
        /// The possibly partial version after the operator.
        version: PartialVersion,
        /// The rewritten constraint(s).
        comparators: Vec<PrimitiveComparator>,
    },
}

impl AdvancedComparator {
    /// Build a tilde range from its partial version.
    #[must_use]
    pub fn tilde(version: PartialVersion) -> Self {
        let floor = version.lower_bound();
        let ceiling = if version.minor().is_some() {
            floor.version.with_minor_bump()
        } else {
            floor.version.with_major_bump()
        };
        let comparators = vec![floor, PrimitiveComparator::new(Operator::Less, ceiling)];
        Self::Tilde {
            version,
            comparators,
        }
    }

    /// Build a caret range from its partial version.
    ///
    /// Versions below 1.0.0 are unstable, so any component above the
    /// left-most zero is treated as breaking and caps the ceiling.
    #[must_use]
    pub fn caret(version: PartialVersion) -> Self {
        let floor = version.lower_bound();
        let base = &floor.version;
        let ceiling = if version.minor().is_none() {
            base.with_major_bump()
        } else if version.micro().is_none() {
            if base.major == 0 {
                base.with_minor_bump()
            } else {
                base.with_major_bump()
            }
        } else if base.major != 0 {
            base.with_major_bump()
        } else if base.minor != 0 {
            base.with_minor_bump()
        } else {
            base.with_micro_bump()
        };
        let comparators = vec![floor, PrimitiveComparator::new(Operator::Less, ceiling)];
        Self::Caret {
            version,
            comparators,
        }
    }

    /// Build an x-range from a bare partial version.
    #[must_use]
    pub fn x_range(version: PartialVersion) -> Self {
        let mut comparators = vec![version.lower_bound()];
        comparators.extend(version.upper_bound());
        Self::XRange {
            version,
            comparators,
        }
    }

    /// Build a hyphen range from its two partial versions.
    #[must_use]
    pub fn hyphen(lower: PartialVersion, upper: PartialVersion) -> Self {
        let mut comparators = vec![lower.lower_bound()];
        comparators.extend(upper.upper_bound());
        Self::Hyphen {
            lower,
            upper,
            comparators,
        }
    }

    /// Build a primitive comparator token, rewriting operators on partial
    /// versions in terms of the bounds the partial implies.
    ///
    /// A partial version has no single comparable value, so `>=` becomes
    /// its lower bound, `>` the exclusive dual, `<=`/`<` the upper bounds,
    /// and `=` the conjunction of both.
    pub fn primitive(operator: Operator, version: PartialVersion) -> Result<Self> {
        let comparators = if version.is_fully_specified() {
            vec![PrimitiveComparator::new(operator, version.zero_filled())]
        } else {
            match operator {
                Operator::GreaterEqual => vec![version.lower_bound()],
                Operator::Greater => vec![version.lower_bound_exclusive().ok_or_else(|| {
                    Error::range_format(
                        format!(">{version}"),
                        "`>` requires at least one version component",
                    )
                })?],
                Operator::LessEqual => vec![version.upper_bound().ok_or_else(|| {
                    Error::range_format(
                        format!("<={version}"),
                        "`<=` requires at least one version component",
                    )
                })?],
                Operator::Less => vec![version.upper_bound_exclusive()],
                Operator::Equal => {
                    let mut list = vec![version.lower_bound()];
                    list.extend(version.upper_bound());
                    list
                }
            }
        };
        Ok(Self::Primitive {
            operator,
            version,
            comparators,
        })
    }

    /// The primitive comparators this token reduces to.
    #[must_use]
    pub fn primitive_comparators(&self) -> &[PrimitiveComparator] {
        match self {
            Self::Tilde { comparators, .. }
            | Self::Caret { comparators, .. }
            | Self::XRange { comparators, .. }
            | Self::Hyphen { comparators, .. }
            | Self::Primitive { comparators, .. } => comparators,
        }
    }

    /// Check whether a candidate satisfies every implied primitive.
    ///
    /// Pre-release visibility is a property of the surrounding comparator
    /// set, not of a single token, and is enforced there.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        self.primitive_comparators()
            .iter()
            .all(|comparator| comparator.matches(candidate))
    }
}

impl FromStr for AdvancedComparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix('~') {
            return Ok(Self::tilde(rest.parse()?));
        }
        if let Some(rest) = s.strip_prefix('^') {
            return Ok(Self::caret(rest.parse()?));
        }
        if let Some((lower, upper)) = s.split_once(" - ") {
            return Ok(Self::hyphen(lower.trim().parse()?, upper.trim().parse()?));
        }
        for (token, operator) in Operator::TOKENS {
            if let Some(rest) = s.strip_prefix(token) {
                if rest.is_empty() {
                    return Err(Error::range_format(s, "operator without a version"));
                }
                return Self::primitive(operator, rest.parse()?);
            }
        }
        Ok(Self::x_range(s.parse()?))
    }
}

impl fmt::Display for AdvancedComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tilde { version, .. } => write!(f, "~{version}"),
            Self::Caret { version, .. } => write!(f, "^{version}"),
            Self::XRange { version, .. } => write!(f, "{version}"),
            Self::Hyphen { lower, upper, .. } => write!(f, "{lower} - {upper}"),
            Self::Primitive {
                operator, version, ..
            } => write!(f, "{operator}{version}"),
        }
    }
}
