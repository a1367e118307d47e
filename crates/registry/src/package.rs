//! Package identity and module formats.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The unique, version-independent identity of a resolvable package.
///
/// Scoped packages render as `@scope/name`; equality and ordering are by
/// scope then name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId {
    scope: Option<String>,
    name: String,
}

impl PackageId {
    /// Create an unscoped package id.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_segment(&name, "name")?;
        Ok(Self { scope: None, name })
    }

    /// Create a scoped package id.
    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let scope = scope.into();
        let name = name.into();
        validate_segment(&scope, "scope")?;
        validate_segment(&name, "name")?;
        Ok(Self {
            scope: Some(scope),
            name,
        })
    }

    /// The scope, without its `@` sigil, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// The package name without its scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_segment(segment: &str, kind: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::package_id(segment, format!("empty {kind}")));
    }
    if segment.contains(['/', '@']) || segment.chars().any(char::is_whitespace) {
        return Err(Error::package_id(
            segment,
            format!("{kind} contains a separator or whitespace"),
        ));
    }
    Ok(())
}

impl FromStr for PackageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix('@') {
            let Some((scope, name)) = rest.split_once('/') else {
                return Err(Error::package_id(s, "scoped name is missing its `/`"));
            };
            return Self::scoped(scope, name);
        }
        Self::new(s)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{scope}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The module system a package's entry point is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleFormat {
    /// CommonJS modules, entry point declared under `main`.
    #[default]
    CommonJs,
    /// ECMAScript modules, entry point declared under `module` and its
    /// historical aliases.
    EsModule,
}

impl ModuleFormat {
    /// The format's identifier as emitted in capability attributes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommonJs => "commonjs",
            Self::EsModule => "esm",
        }
    }
}

impl FromStr for ModuleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "commonjs" => Ok(Self::CommonJs),
            "esm" => Ok(Self::EsModule),
            _ => Err(Error::document(
                "module format",
                format!("unknown format `{s}`"),
            )),
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
