//! OR-of-AND range expressions over comparator tokens.
//!
//! A range is a `||`-separated list of clauses; each clause is a
//! whitespace-separated AND-list of comparator tokens. Matching a clause
//! additionally applies the pre-release visibility rule, scoped to that
//! clause alone.

use crate::comparator::{AdvancedComparator, Operator, PrimitiveComparator};
use crate::error::{Error, Result};
use crate::partial::PartialVersion;
use crate::version::{Identifier, PreRelease, Version};
use std::fmt;
use std::str::FromStr;

/// An AND-list of comparator tokens (one clause of a range).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparatorSet {
    comparators: Vec<AdvancedComparator>,
}

impl ComparatorSet {
    /// Create a clause from its tokens. An empty clause matches every
    /// release version.
    #[must_use]
    pub const fn new(comparators: Vec<AdvancedComparator>) -> Self {
        Self { comparators }
    }

    /// The comparator tokens in this clause.
    #[must_use]
    pub fn comparators(&self) -> &[AdvancedComparator] {
        &self.comparators
    }

    /// Check whether a version satisfies this clause.
    ///
    /// A pre-release version is invisible to the clause unless some
    /// primitive in it targets the same major.minor.micro triple with a
    /// pre-release of its own.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        if !self
            .comparators
            .iter()
            .all(|comparator| comparator.matches(candidate))
        {
            return false;
        }
        if candidate.is_pre_release() {
            return self.allows_pre_release_of(candidate);
        }
        true
    }

    fn allows_pre_release_of(&self, candidate: &Version) -> bool {
        self.comparators
            .iter()
            .flat_map(|comparator| comparator.primitive_comparators())
            .any(|primitive| {
                primitive.version.is_pre_release() && primitive.version.same_triple(candidate)
            })
    }
}

fn is_bare_operator(word: &str) -> bool {
    matches!(word, ">=" | "<=" | ">" | "<" | "=" | "~" | "^")
}

/// Split a clause into comparator tokens.
///
/// Whitespace between an operator and its version does not split, and the
/// operands of a ` - ` hyphen range stay joined as one token.
fn tokenize(s: &str) -> Result<Vec<String>> {
    let raw: Vec<&str> = s.split_whitespace().collect();
    let mut tokens: Vec<String> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let word = raw[i];
        if word == "-" {
            let Some(lower) = tokens.pop() else {
                return Err(Error::range_format(
                    s,
                    "hyphen range without a lower version",
                ));
            };
            let Some(upper) = raw.get(i + 1) else {
                return Err(Error::range_format(
                    s,
                    "hyphen range without an upper version",
                ));
            };
            tokens.push(format!("{lower} - {upper}"));
            i += 2;
        } else if is_bare_operator(word) && i + 1 < raw.len() {
            tokens.push(format!("{}{}", word, raw[i + 1]));
            i += 2;
        } else {
            tokens.push(word.to_string());
            i += 1;
        }
    }
    Ok(tokens)
}

impl FromStr for ComparatorSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let comparators = tokenize(s)?
            .iter()
            .map(|token| token.parse())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { comparators })
    }
}

impl fmt::Display for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comparator) in self.comparators.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{comparator}")?;
        }
        Ok(())
    }
}

/// An OR-list of comparator sets; the range type used everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    sets: Vec<ComparatorSet>,
}

impl Range {
    /// Create a range from its clauses.
    #[must_use]
    pub const fn new(sets: Vec<ComparatorSet>) -> Self {
        Self { sets }
    }

    /// The range no version satisfies, `<0.0.0-0`.
    #[must_use]
    pub fn empty() -> Self {
        Self::zero_bound(Operator::Less)
    }

    /// The range every version satisfies, `>=0.0.0-0`.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::zero_bound(Operator::GreaterEqual)
    }

    fn zero_bound(operator: Operator) -> Self {
        let version = Version::new(0, 0, 0).with_pre_release(PreRelease::new(vec![
            Identifier::Numeric(0),
        ]));
        let comparator = AdvancedComparator::Primitive {
            operator,
            version: PartialVersion::from(version.clone()),
            comparators: vec![PrimitiveComparator::new(operator, version)],
        };
        Self {
            sets: vec![ComparatorSet::new(vec![comparator])],
        }
    }

    /// The clauses in this range.
    #[must_use]
    pub fn comparator_sets(&self) -> &[ComparatorSet] {
        &self.sets
    }

    /// Check whether any clause matches the candidate.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        self.sets.iter().any(|set| set.matches(candidate))
    }
}

impl FromStr for Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let sets = s
            .split(" || ")
            .map(ComparatorSet::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sets })
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{set}")?;
        }
        Ok(())
    }
}
