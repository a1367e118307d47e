//! Semantic version model and npm-style range grammar for webmod
//!
//! This crate provides the version layer the resolution engine is built on:
//! - An immutable version value with total ordering per `SemVer` 2.0.0
//!   precedence rules
//! - Partially specified versions and the bounds they imply
//! - The full npm range grammar: tilde, caret, x-ranges, hyphen ranges,
//!   explicit operators, whitespace-AND clauses and `||`-OR lists
//! - The pre-release visibility rule applied during matching
//!
//! # Overview
//!
//! Every range syntax reduces at parse time to one or two primitive
//! operator-plus-version constraints. Matching a version against a range
//! walks those precomputed primitives and then applies the pre-release
//! visibility rule per clause: pre-release versions only match clauses
//! that explicitly target a pre-release of the same major.minor.micro
//! triple.

mod comparator;
mod error;
mod partial;
mod range;
mod version;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use comparator::{AdvancedComparator, Operator, PrimitiveComparator};
pub use partial::PartialVersion;
pub use range::{ComparatorSet, Range};
pub use version::{Identifier, PreRelease, Version};
