//! Initial dependency configuration.
//!
//! A repository is seeded with a JSON document shaped like an npm
//! `dependencies` object: package names mapped to a version range string.
//! A value may instead be an override object, or a list of override
//! objects, pinning the module format or entry point of the versions its
//! range matches:
//!
//! ```json
//! {
//!     "format": "commonjs",
//!     "dependencies": {
//!         "left-pad": "^1.0.0",
//!         "lit-html": { "version": "^2.0.0", "format": "esm" },
//!         "d3": [
//!             { "version": "^5.0.0", "entryPoint": "dist/d3.js" },
//!             { "version": "^6.0.0", "format": "esm" }
//!         ]
//!     }
//! }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use webmod_registry::{ModuleFormat, PackageId};
use webmod_semver::{Range, Version};

/// Format and entry-point overrides for the versions a range matches.
#[derive(Debug, Clone)]
pub struct VersionConfig {
    range: Range,
    format: ModuleFormat,
    entry_point: Option<String>,
}

impl VersionConfig {
    fn from_document(document: &VersionConfigDocument, default_format: ModuleFormat) -> Result<Self> {
        let range = match &document.version {
            Some(range) => range.parse()?,
            None => Range::unbounded(),
        };
        let format = match &document.format {
            Some(format) => format.parse::<ModuleFormat>()?,
            None => default_format,
        };
        Ok(Self {
            range,
            format,
            entry_point: document.entry_point.clone(),
        })
    }

    fn default_for(format: ModuleFormat) -> Self {
        Self {
            range: Range::unbounded(),
            format,
            entry_point: None,
        }
    }

    /// The versions this override applies to.
    #[must_use]
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// The module format to publish matching versions under.
    #[must_use]
    pub const fn format(&self) -> ModuleFormat {
        self.format
    }

    /// The entry point to publish, overriding metadata detection.
    #[must_use]
    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    /// Whether this override applies to the given version.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.range.matches(version)
    }
}

/// The configuration of one package: the range to resolve initially and
/// the overrides to apply to its versions.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    id: PackageId,
    range: Range,
    configs: Vec<VersionConfig>,
    default_format: ModuleFormat,
}

impl BundleConfig {
    fn new(id: PackageId, configs: Vec<VersionConfig>, default_format: ModuleFormat) -> Self {
        // The initial range accepts a version any override accepts.
        let range = Range::new(
            configs
                .iter()
                .flat_map(|config| config.range().comparator_sets())
                .cloned()
                .collect(),
        );
        Self {
            id,
            range,
            configs,
            default_format,
        }
    }

    pub(crate) fn default_for(id: PackageId, default_format: ModuleFormat) -> Self {
        Self::new(
            id,
            vec![VersionConfig::default_for(default_format)],
            default_format,
        )
    }

    /// The package this configuration applies to.
    #[must_use]
    pub fn id(&self) -> &PackageId {
        &self.id
    }

    /// The range of versions to resolve when the package is a root.
    #[must_use]
    pub fn initial_range(&self) -> &Range {
        &self.range
    }

    /// The override applying to a version.
    ///
    /// The first override whose range matches wins; a version outside every
    /// configured range falls back to the repository default format with no
    /// entry-point override.
    #[must_use]
    pub fn version_config(&self, version: &Version) -> VersionConfig {
        self.configs
            .iter()
            .find(|config| config.matches(version))
            .cloned()
            .unwrap_or_else(|| VersionConfig::default_for(self.default_format))
    }
}

#[derive(Debug, Deserialize)]
struct VersionConfigDocument {
    version: Option<String>,
    format: Option<String>,
    #[serde(rename = "entryPoint")]
    entry_point: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyValue {
    Range(String),
    Override(VersionConfigDocument),
    Overrides(Vec<VersionConfigDocument>),
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    format: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, DependencyValue>,
}

/// The parsed initial dependency document of a repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    default_format: ModuleFormat,
    bundles: BTreeMap<PackageId, BundleConfig>,
}

impl RepositoryConfig {
    /// Parse an initial dependency document.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: ConfigDocument =
            serde_json::from_str(json).map_err(|source| Error::Config { source })?;

        let default_format = match &document.format {
            Some(format) => format.parse::<ModuleFormat>()?,
            None => ModuleFormat::default(),
        };

        let mut bundles = BTreeMap::new();
        for (name, value) in &document.dependencies {
            let id: PackageId = name.parse()?;
            let configs = match value {
                DependencyValue::Range(range) => vec![VersionConfig {
                    range: range.parse()?,
                    format: default_format,
                    entry_point: None,
                }],
                DependencyValue::Override(document) => {
                    vec![VersionConfig::from_document(document, default_format)?]
                }
                DependencyValue::Overrides(documents) => documents
                    .iter()
                    .map(|document| VersionConfig::from_document(document, default_format))
                    .collect::<Result<Vec<_>>>()?,
            };
            bundles.insert(id.clone(), BundleConfig::new(id, configs, default_format));
        }

        Ok(Self {
            default_format,
            bundles,
        })
    }

    /// The format assumed for versions with no matching override.
    #[must_use]
    pub const fn default_format(&self) -> ModuleFormat {
        self.default_format
    }

    /// The packages and ranges to resolve initially.
    pub fn initial_dependencies(&self) -> impl Iterator<Item = (&PackageId, &Range)> {
        self.bundles
            .iter()
            .map(|(id, bundle)| (id, bundle.initial_range()))
    }

    /// The configuration of one package, configured or defaulted.
    #[must_use]
    pub fn bundle_config(&self, id: &PackageId) -> BundleConfig {
        self.bundles.get(id).cloned().unwrap_or_else(|| {
            BundleConfig::default_for(id.clone(), self.default_format)
        })
    }
}

impl Default for RepositoryConfig {
    /// An empty configuration: nothing to resolve, CommonJS by default.
    fn default() -> Self {
        Self {
            default_format: ModuleFormat::default(),
            bundles: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str) -> PackageId {
        name.parse().unwrap()
    }

    fn version(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_bare_range_string() {
        let config = RepositoryConfig::from_json(
            r#"{ "dependencies": { "left-pad": "^1.0.0" } }"#,
        )
        .unwrap();

        let initial: Vec<_> = config.initial_dependencies().collect();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].0, &package("left-pad"));
        assert!(initial[0].1.matches(&version("1.2.0")));
        assert!(!initial[0].1.matches(&version("2.0.0")));

        let bundle = config.bundle_config(&package("left-pad"));
        let overrides = bundle.version_config(&version("1.2.0"));
        assert_eq!(overrides.format(), ModuleFormat::CommonJs);
        assert_eq!(overrides.entry_point(), None);
    }

    #[test]
    fn test_override_object() {
        let config = RepositoryConfig::from_json(
            r#"{
                "dependencies": {
                    "lit-html": { "version": "^2.0.0", "format": "esm", "entryPoint": "lit-html.js" }
                }
            }"#,
        )
        .unwrap();

        let bundle = config.bundle_config(&package("lit-html"));
        let overrides = bundle.version_config(&version("2.4.0"));
        assert_eq!(overrides.format(), ModuleFormat::EsModule);
        assert_eq!(overrides.entry_point(), Some("lit-html.js"));

        // Outside the configured range the default format applies.
        let fallback = bundle.version_config(&version("3.0.0"));
        assert_eq!(fallback.format(), ModuleFormat::CommonJs);
        assert_eq!(fallback.entry_point(), None);
    }

    #[test]
    fn test_override_list_first_match_wins() {
        let config = RepositoryConfig::from_json(
            r#"{
                "format": "esm",
                "dependencies": {
                    "d3": [
                        { "version": "^5.0.0", "entryPoint": "dist/d3.js", "format": "commonjs" },
                        { "version": "^6.0.0" }
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_format(), ModuleFormat::EsModule);

        let bundle = config.bundle_config(&package("d3"));
        assert!(bundle.initial_range().matches(&version("5.16.0")));
        assert!(bundle.initial_range().matches(&version("6.1.0")));
        assert!(!bundle.initial_range().matches(&version("7.0.0")));

        let five = bundle.version_config(&version("5.16.0"));
        assert_eq!(five.format(), ModuleFormat::CommonJs);
        assert_eq!(five.entry_point(), Some("dist/d3.js"));

        let six = bundle.version_config(&version("6.1.0"));
        assert_eq!(six.format(), ModuleFormat::EsModule);
        assert_eq!(six.entry_point(), None);
    }

    #[test]
    fn test_unconfigured_package_gets_default() {
        let config = RepositoryConfig::default();
        let bundle = config.bundle_config(&package("anything"));
        assert!(bundle.initial_range().matches(&version("0.0.1")));
        assert_eq!(
            bundle.version_config(&version("0.0.1")).format(),
            ModuleFormat::CommonJs
        );
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            RepositoryConfig::from_json("not json"),
            Err(Error::Config { .. })
        ));
        assert!(RepositoryConfig::from_json(r#"{ "dependencies": { "x": ">*" } }"#).is_err());
        assert!(RepositoryConfig::from_json(r#"{ "dependencies": { "": "1.0.0" } }"#).is_err());
        assert!(
            RepositoryConfig::from_json(r#"{ "format": "umd", "dependencies": {} }"#).is_err()
        );
    }

    #[test]
    fn test_scoped_names_parse() {
        let config = RepositoryConfig::from_json(
            r#"{ "dependencies": { "@types/node": "*" } }"#,
        )
        .unwrap();
        let bundle = config.bundle_config(&package("@types/node"));
        assert_eq!(bundle.id(), &package("@types/node"));
    }
}
